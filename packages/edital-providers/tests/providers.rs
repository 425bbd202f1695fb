use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value, json};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		edital_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");
	assert_eq!(value, "Bearer secret");
}

#[test]
fn carries_default_headers_through() {
	let mut defaults = Map::new();

	defaults.insert("x-provider-tenant".to_string(), Value::String("edital".to_string()));

	let headers =
		edital_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");
	let value = headers.get("x-provider-tenant").expect("Missing default header.");
	assert_eq!(value, "edital");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), json!(3));

	let result = edital_providers::auth_headers("secret", &defaults);
	assert!(matches!(result, Err(edital_providers::Error::InvalidConfig { .. })));
}
