use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub min_chunk_chars: usize,
	pub max_chunk_chars: usize,
	pub fallback_criticality: f32,
	pub type_weights: SectionTypeWeights,
	/// Path keywords that raise a section's criticality. Matched against the
	/// accent-folded hierarchy path; the highest matching weight wins.
	pub keywords: Vec<CriticalityKeyword>,
}
impl Default for Chunking {
	fn default() -> Self {
		Self {
			min_chunk_chars: 512,
			max_chunk_chars: 2_000,
			fallback_criticality: 0.1,
			type_weights: SectionTypeWeights::default(),
			keywords: default_criticality_keywords(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SectionTypeWeights {
	pub title: f32,
	pub item: f32,
	pub subitem: f32,
	pub prose: f32,
}
impl Default for SectionTypeWeights {
	fn default() -> Self {
		Self { title: 0.3, item: 0.25, subitem: 0.2, prose: 0.1 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct CriticalityKeyword {
	pub contains: String,
	pub weight: f32,
}

fn default_criticality_keywords() -> Vec<CriticalityKeyword> {
	[
		("objeto", 0.55),
		("valor", 0.55),
		("prazo", 0.5),
		("habilitacao", 0.5),
		("participacao", 0.45),
		("abertura", 0.4),
		("penalidade", 0.4),
	]
	.into_iter()
	.map(|(contains, weight)| CriticalityKeyword { contains: contains.to_string(), weight })
	.collect()
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub hybrid_weight: f32,
	pub query_deadline_ms: u64,
	pub upsert_batch_size: usize,
	pub manifest_ttl_days: i64,
	pub retry: UpsertRetry,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			top_k: 10,
			hybrid_weight: 0.7,
			query_deadline_ms: 10_000,
			upsert_batch_size: 64,
			manifest_ttl_days: 30,
			retry: UpsertRetry::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UpsertRetry {
	pub max_attempts: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
}
impl Default for UpsertRetry {
	fn default() -> Self {
		Self { max_attempts: 3, base_backoff_ms: 500, max_backoff_ms: 30_000 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub boost: RankingBoost,
	pub keyword: RankingKeyword,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RankingBoost {
	pub cap: f32,
	pub criticality_knee: f32,
	pub criticality_lower_slope: f32,
	pub criticality_upper_slope: f32,
	pub depth_zero: f32,
	pub depth_one: f32,
	pub deep_base: f32,
	pub deep_step: f32,
	pub deep_floor: f32,
	pub type_bonus: SectionTypeBonus,
	/// Ordered. Only the first rule whose keyword the folded path contains
	/// adds its bonus; re-ordering changes ranking outcomes.
	pub path_rules: Vec<PathRule>,
	pub topic_bonus: f32,
}
impl Default for RankingBoost {
	fn default() -> Self {
		Self {
			cap: 0.6,
			criticality_knee: 0.5,
			criticality_lower_slope: 0.2,
			criticality_upper_slope: 0.4,
			depth_zero: 0.2,
			depth_one: 0.15,
			deep_base: 0.1,
			deep_step: 0.03,
			deep_floor: 0.05,
			type_bonus: SectionTypeBonus::default(),
			path_rules: default_path_rules(),
			topic_bonus: 0.1,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SectionTypeBonus {
	pub title: f32,
	pub item: f32,
	pub subitem: f32,
	pub prose: f32,
}
impl Default for SectionTypeBonus {
	fn default() -> Self {
		Self { title: 0.05, item: 0.1, subitem: 0.1, prose: 0.02 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathRule {
	pub contains: String,
	pub bonus: f32,
}

fn default_path_rules() -> Vec<PathRule> {
	[
		("objeto", 0.15),
		("valor", 0.14),
		("prazo", 0.13),
		("participacao", 0.12),
		("abertura", 0.11),
		("habilitacao", 0.1),
		("penalidade", 0.09),
	]
	.into_iter()
	.map(|(contains, bonus)| PathRule { contains: contains.to_string(), bonus })
	.collect()
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RankingKeyword {
	pub synonym_weight: f32,
	pub exact_score: f32,
	pub partial_score: f32,
	pub word_score: f32,
	pub word_score_cap: f32,
	pub min_word_len: usize,
	pub max_terms: usize,
}
impl Default for RankingKeyword {
	fn default() -> Self {
		Self {
			synonym_weight: 0.8,
			exact_score: 1.0,
			partial_score: 0.7,
			word_score: 0.3,
			word_score_cap: 0.5,
			min_word_len: 4,
			max_terms: 24,
		}
	}
}
