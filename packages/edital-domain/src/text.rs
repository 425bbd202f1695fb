/// Lowercases and strips combining marks so "Participação" and
/// "participacao" compare equal. All lexicon matching runs on folded text.
pub fn fold(text: &str) -> String {
	use unicode_normalization::UnicodeNormalization;

	let mut out = String::with_capacity(text.len());

	for ch in text.nfd() {
		if unicode_normalization::char::is_combining_mark(ch) {
			continue;
		}

		out.extend(ch.to_lowercase());
	}

	out
}

/// Whitespace-bounded occurrence check. Punctuation adjacent to the needle
/// does not count as a boundary.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
	if needle.is_empty() {
		return false;
	}

	let mut start = 0;

	while let Some(pos) = haystack[start..].find(needle) {
		let begin = start + pos;
		let end = begin + needle.len();
		let left_ok =
			begin == 0 || haystack[..begin].chars().next_back().is_some_and(char::is_whitespace);
		let right_ok = end == haystack.len()
			|| haystack[end..].chars().next().is_some_and(char::is_whitespace);

		if left_ok && right_ok {
			return true;
		}

		start = begin + haystack[begin..].chars().next().map_or(1, char::len_utf8);
	}

	false
}

pub fn significant_words(term: &str, min_len: usize) -> Vec<&str> {
	term.split_whitespace().filter(|word| word.chars().count() >= min_len).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fold_strips_accents_and_case() {
		assert_eq!(fold("Participação"), "participacao");
		assert_eq!(fold("HABILITAÇÃO Jurídica"), "habilitacao juridica");
		assert_eq!(fold("prazo"), "prazo");
	}

	#[test]
	fn contains_word_requires_whitespace_bounds() {
		assert!(contains_word("o valor estimado", "valor"));
		assert!(contains_word("valor", "valor"));
		assert!(contains_word("qual o valor", "valor"));
		assert!(!contains_word("desvalorizado", "valor"));
		assert!(!contains_word("valor:", "valor"));
	}

	#[test]
	fn contains_word_finds_later_occurrences() {
		assert!(contains_word("xvalor valor", "valor"));
	}

	#[test]
	fn significant_words_filter_short_tokens() {
		assert_eq!(significant_words("data limite de entrega", 4), vec!["data", "limite", "entrega"]);
		assert!(significant_words("a de o", 4).is_empty());
	}
}
