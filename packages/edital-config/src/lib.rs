mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, CriticalityKeyword, EmbeddingProviderConfig, PathRule, Providers, Qdrant,
	Ranking, RankingBoost, RankingKeyword, Retrieval, SectionTypeBonus, SectionTypeWeights,
	Service, Storage, UpsertRetry,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.min_chunk_chars == 0 {
		return Err(Error::Validation {
			message: "chunking.min_chunk_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.max_chunk_chars <= cfg.chunking.min_chunk_chars {
		return Err(Error::Validation {
			message: "chunking.max_chunk_chars must be greater than chunking.min_chunk_chars."
				.to_string(),
		});
	}
	if !unit_range(cfg.chunking.fallback_criticality) {
		return Err(Error::Validation {
			message: "chunking.fallback_criticality must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (label, weight) in [
		("title", cfg.chunking.type_weights.title),
		("item", cfg.chunking.type_weights.item),
		("subitem", cfg.chunking.type_weights.subitem),
		("prose", cfg.chunking.type_weights.prose),
	] {
		if !unit_range(weight) {
			return Err(Error::Validation {
				message: format!("chunking.type_weights.{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.chunking.keywords.is_empty() {
		return Err(Error::Validation {
			message: "chunking.keywords must be non-empty.".to_string(),
		});
	}

	for keyword in &cfg.chunking.keywords {
		if keyword.contains.trim().is_empty() {
			return Err(Error::Validation {
				message: "chunking.keywords.contains must be non-empty.".to_string(),
			});
		}
		if !unit_range(keyword.weight) {
			return Err(Error::Validation {
				message: "chunking.keywords.weight must be in the range 0.0-1.0.".to_string(),
			});
		}
	}

	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !unit_range(cfg.retrieval.hybrid_weight) {
		return Err(Error::Validation {
			message: "retrieval.hybrid_weight must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.retrieval.query_deadline_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.query_deadline_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.upsert_batch_size == 0 {
		return Err(Error::Validation {
			message: "retrieval.upsert_batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.manifest_ttl_days <= 0 {
		return Err(Error::Validation {
			message: "retrieval.manifest_ttl_days must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "retrieval.retry.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.retry.base_backoff_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.retry.base_backoff_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.retry.max_backoff_ms < cfg.retrieval.retry.base_backoff_ms {
		return Err(Error::Validation {
			message:
				"retrieval.retry.max_backoff_ms must not be less than retrieval.retry.base_backoff_ms."
					.to_string(),
		});
	}
	if !unit_range(cfg.ranking.boost.cap) || cfg.ranking.boost.cap == 0.0 {
		return Err(Error::Validation {
			message: "ranking.boost.cap must be greater than zero and at most 1.0.".to_string(),
		});
	}
	if !unit_range(cfg.ranking.boost.criticality_knee) {
		return Err(Error::Validation {
			message: "ranking.boost.criticality_knee must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (label, value) in [
		("criticality_lower_slope", cfg.ranking.boost.criticality_lower_slope),
		("criticality_upper_slope", cfg.ranking.boost.criticality_upper_slope),
		("depth_zero", cfg.ranking.boost.depth_zero),
		("depth_one", cfg.ranking.boost.depth_one),
		("deep_base", cfg.ranking.boost.deep_base),
		("deep_step", cfg.ranking.boost.deep_step),
		("deep_floor", cfg.ranking.boost.deep_floor),
		("topic_bonus", cfg.ranking.boost.topic_bonus),
		("type_bonus.title", cfg.ranking.boost.type_bonus.title),
		("type_bonus.item", cfg.ranking.boost.type_bonus.item),
		("type_bonus.subitem", cfg.ranking.boost.type_bonus.subitem),
		("type_bonus.prose", cfg.ranking.boost.type_bonus.prose),
	] {
		if !value.is_finite() || value < 0.0 {
			return Err(Error::Validation {
				message: format!("ranking.boost.{label} must be a finite non-negative number."),
			});
		}
	}

	if cfg.ranking.boost.path_rules.is_empty() {
		return Err(Error::Validation {
			message: "ranking.boost.path_rules must be non-empty.".to_string(),
		});
	}

	for rule in &cfg.ranking.boost.path_rules {
		if rule.contains.trim().is_empty() {
			return Err(Error::Validation {
				message: "ranking.boost.path_rules.contains must be non-empty.".to_string(),
			});
		}
		if !rule.bonus.is_finite() || rule.bonus < 0.0 {
			return Err(Error::Validation {
				message: "ranking.boost.path_rules.bonus must be a finite non-negative number."
					.to_string(),
			});
		}
	}

	if !unit_range(cfg.ranking.keyword.synonym_weight) {
		return Err(Error::Validation {
			message: "ranking.keyword.synonym_weight must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (label, value) in [
		("exact_score", cfg.ranking.keyword.exact_score),
		("partial_score", cfg.ranking.keyword.partial_score),
		("word_score", cfg.ranking.keyword.word_score),
		("word_score_cap", cfg.ranking.keyword.word_score_cap),
	] {
		if !value.is_finite() || value < 0.0 {
			return Err(Error::Validation {
				message: format!("ranking.keyword.{label} must be a finite non-negative number."),
			});
		}
	}

	if cfg.ranking.keyword.min_word_len == 0 {
		return Err(Error::Validation {
			message: "ranking.keyword.min_word_len must be greater than zero.".to_string(),
		});
	}
	if cfg.ranking.keyword.max_terms == 0 {
		return Err(Error::Validation {
			message: "ranking.keyword.max_terms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for keyword in &mut cfg.chunking.keywords {
		keyword.contains = keyword.contains.trim().to_lowercase();
	}
	for rule in &mut cfg.ranking.boost.path_rules {
		rule.contains = rule.contains.trim().to_lowercase();
	}
}

fn unit_range(value: f32) -> bool {
	value.is_finite() && (0.0..=1.0).contains(&value)
}
