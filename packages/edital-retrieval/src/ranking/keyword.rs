use std::collections::HashSet;

use edital_config::RankingKeyword;
use edital_domain::{lexicon, text};

#[derive(Clone, Debug)]
pub struct WeightedTerm {
	pub text: String,
	pub weight: f32,
}

/// Expands a query into weighted lexical terms. The folded query itself is a
/// full-weight term; concepts and synonyms from every matching lexicon entry
/// follow at `synonym_weight`, deduplicated, capped at `max_terms`.
pub fn expand_terms(query: &str, cfg: &RankingKeyword) -> Vec<WeightedTerm> {
	let folded = text::fold(query.trim());

	if folded.is_empty() {
		return Vec::new();
	}

	let mut seen: HashSet<String> = HashSet::new();
	let mut terms = Vec::new();

	seen.insert(folded.clone());
	terms.push(WeightedTerm { text: folded.clone(), weight: 1.0 });

	for entry in lexicon::matching_entries(&folded) {
		for candidate in std::iter::once(entry.concept).chain(entry.synonyms.iter().copied()) {
			if seen.insert(candidate.to_string()) {
				terms.push(WeightedTerm {
					text: candidate.to_string(),
					weight: cfg.synonym_weight,
				});
			}
		}
	}

	terms.truncate(cfg.max_terms);

	terms
}

/// Scores one chunk text against the expanded terms. Per term: a whitespace
/// bounded match earns `weight * exact_score`, a substring-only match earns
/// `weight * partial_score`, and each significant word of the term found in
/// the text adds `weight * word_score` up to `weight * word_score_cap`. The
/// per-term scores are averaged and clamped to `[0, 1]`.
pub fn keyword_score(chunk_text: &str, terms: &[WeightedTerm], cfg: &RankingKeyword) -> f32 {
	if terms.is_empty() {
		return 0.0;
	}

	let folded_text = text::fold(chunk_text);
	let mut sum = 0.0_f32;

	for term in terms {
		let mut score = 0.0_f32;

		if text::contains_word(&folded_text, &term.text) {
			score = term.weight * cfg.exact_score;
		} else if folded_text.contains(&term.text) {
			score = term.weight * cfg.partial_score;
		}

		let mut word_bonus = 0.0_f32;

		for word in text::significant_words(&term.text, cfg.min_word_len) {
			if folded_text.contains(word) {
				word_bonus += term.weight * cfg.word_score;
			}
		}

		score += word_bonus.min(term.weight * cfg.word_score_cap);
		sum += score;
	}

	(sum / terms.len() as f32).clamp(0.0, 1.0)
}
