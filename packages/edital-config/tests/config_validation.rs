use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use edital_config::Config;

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind  = "127.0.0.1:8080"
admin_bind = "127.0.0.1:8081"
log_level  = "info"

[storage.qdrant]
url        = "http://127.0.0.1:6334"
collection = "edital_chunks"
vector_dim = 1536

[providers.embedding]
provider_id = "openai"
api_base    = "https://api.openai.com/v1"
api_key     = "test-key"
path        = "/embeddings"
model       = "text-embedding-3-small"
dimensions  = 1536
timeout_ms  = 30000
"#;

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render sample config.")
}

fn table_mut<'a>(value: &'a mut Value, keys: &[&str]) -> &'a mut toml::map::Map<String, Value> {
	let mut current = value;

	for key in keys {
		current = current
			.as_table_mut()
			.expect("Config node must be a table.")
			.entry(key.to_string())
			.or_insert_with(|| Value::Table(Default::default()));
	}

	current.as_table_mut().expect("Config node must be a table.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("edital_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> edital_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = edital_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

#[test]
fn minimal_config_loads_with_scoring_defaults() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Expected sample config to load.");

	assert_eq!(cfg.chunking.min_chunk_chars, 512);
	assert_eq!(cfg.chunking.max_chunk_chars, 2_000);
	assert!((cfg.chunking.fallback_criticality - 0.1).abs() < f32::EPSILON);
	assert_eq!(cfg.retrieval.top_k, 10);
	assert!((cfg.retrieval.hybrid_weight - 0.7).abs() < f32::EPSILON);
	assert_eq!(cfg.retrieval.retry.max_attempts, 3);
	assert!((cfg.ranking.boost.cap - 0.6).abs() < f32::EPSILON);
	assert!((cfg.ranking.keyword.synonym_weight - 0.8).abs() < f32::EPSILON);
}

#[test]
fn default_path_rules_keep_declared_order() {
	let cfg = base_config();
	let keywords: Vec<&str> =
		cfg.ranking.boost.path_rules.iter().map(|rule| rule.contains.as_str()).collect();

	assert_eq!(
		keywords,
		["objeto", "valor", "prazo", "participacao", "abertura", "habilitacao", "penalidade"]
	);
	assert!((cfg.ranking.boost.path_rules[1].bonus - 0.14).abs() < f32::EPSILON);
}

#[test]
fn path_rule_overrides_keep_file_order_and_are_lowercased() {
	let mut value = sample_value();
	let ranking = table_mut(&mut value, &["ranking", "boost"]);

	ranking.insert(
		"path_rules".to_string(),
		Value::Array(vec![
			Value::Table(
				[
					("contains".to_string(), Value::String("GARANTIA".to_string())),
					("bonus".to_string(), Value::Float(0.2)),
				]
				.into_iter()
				.collect(),
			),
			Value::Table(
				[
					("contains".to_string(), Value::String("valor".to_string())),
					("bonus".to_string(), Value::Float(0.05)),
				]
				.into_iter()
				.collect(),
			),
		]),
	);

	let cfg = load_payload(render(&value)).expect("Expected overridden config to load.");

	assert_eq!(cfg.ranking.boost.path_rules.len(), 2);
	assert_eq!(cfg.ranking.boost.path_rules[0].contains, "garantia");
	assert_eq!(cfg.ranking.boost.path_rules[1].contains, "valor");
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let mut value = sample_value();

	table_mut(&mut value, &["providers", "embedding"])
		.insert("dimensions".to_string(), Value::Integer(768));

	let err = load_payload(render(&value)).expect_err("Expected dimension validation error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_api_key_must_be_non_empty() {
	let mut value = sample_value();

	table_mut(&mut value, &["providers", "embedding"])
		.insert("api_key".to_string(), Value::String("  ".to_string()));

	let err = load_payload(render(&value)).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("providers.embedding.api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn hybrid_weight_must_stay_in_unit_range() {
	let mut value = sample_value();

	table_mut(&mut value, &["retrieval"])
		.insert("hybrid_weight".to_string(), Value::Float(1.5));

	let err = load_payload(render(&value)).expect_err("Expected hybrid_weight validation error.");

	assert!(
		err.to_string().contains("retrieval.hybrid_weight must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn max_chunk_chars_must_exceed_min() {
	let mut value = sample_value();
	let chunking = table_mut(&mut value, &["chunking"]);

	chunking.insert("min_chunk_chars".to_string(), Value::Integer(512));
	chunking.insert("max_chunk_chars".to_string(), Value::Integer(256));

	let err = load_payload(render(&value)).expect_err("Expected chunk size validation error.");

	assert!(
		err.to_string()
			.contains("chunking.max_chunk_chars must be greater than chunking.min_chunk_chars."),
		"Unexpected error: {err}"
	);
}

#[test]
fn retry_backoff_bounds_are_ordered() {
	let mut value = sample_value();
	let retry = table_mut(&mut value, &["retrieval", "retry"]);

	retry.insert("base_backoff_ms".to_string(), Value::Integer(1_000));
	retry.insert("max_backoff_ms".to_string(), Value::Integer(500));

	let err = load_payload(render(&value)).expect_err("Expected retry backoff validation error.");

	assert!(
		err.to_string().contains(
			"retrieval.retry.max_backoff_ms must not be less than retrieval.retry.base_backoff_ms."
		),
		"Unexpected error: {err}"
	);
}

#[test]
fn top_k_must_be_positive() {
	let mut cfg = base_config();

	cfg.retrieval.top_k = 0;

	let err = edital_config::validate(&cfg).expect_err("Expected top_k validation error.");

	assert!(
		err.to_string().contains("retrieval.top_k must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn query_deadline_must_be_positive() {
	let mut cfg = base_config();

	cfg.retrieval.query_deadline_ms = 0;

	let err = edital_config::validate(&cfg).expect_err("Expected deadline validation error.");

	assert!(
		err.to_string().contains("retrieval.query_deadline_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn boost_cap_must_be_positive() {
	let mut cfg = base_config();

	cfg.ranking.boost.cap = 0.0;

	let err = edital_config::validate(&cfg).expect_err("Expected boost cap validation error.");

	assert!(
		err.to_string().contains("ranking.boost.cap must be greater than zero and at most 1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn criticality_keywords_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.chunking.keywords.clear();

	let err = edital_config::validate(&cfg).expect_err("Expected keyword table validation error.");

	assert!(
		err.to_string().contains("chunking.keywords must be non-empty."),
		"Unexpected error: {err}"
	);
}
