use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use edital_retrieval::{Error, ProcessReport, ProcessRequest, QueryRequest, ScoredResult};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/documents/process", post(process))
		.route("/v1/documents/query", post(query))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/admin/cache/clear", post(clear_cache))
		.route("/admin/documents/{document_id}/processed", get(document_processed))
		.with_state(state)
}

async fn health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

async fn process(
	State(state): State<AppState>,
	Json(payload): Json<ProcessRequest>,
) -> Result<Json<ProcessReport>, ApiError> {
	let report = state.engine.process(payload).await?;
	Ok(Json(report))
}

async fn query(
	State(state): State<AppState>,
	Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
	let results = state.engine.query(payload).await?;
	Ok(Json(QueryResponse { results }))
}

async fn clear_cache(State(state): State<AppState>) -> StatusCode {
	state.engine.clear_cache();

	StatusCode::NO_CONTENT
}

async fn document_processed(
	State(state): State<AppState>,
	Path(document_id): Path<String>,
) -> Result<Json<DocumentStatus>, ApiError> {
	let processed = state.engine.is_document_processed(&document_id).await?;
	Ok(Json(DocumentStatus { document_id, processed }))
}

#[derive(Debug, Serialize)]
struct QueryResponse {
	results: Vec<ScoredResult>,
}

#[derive(Debug, Serialize)]
struct DocumentStatus {
	document_id: String,
	processed: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
	code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, code: code.into(), message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => {
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message)
			},
			Error::QueryEmbedding { message } => {
				ApiError::new(StatusCode::BAD_GATEWAY, "embedding_failed", message)
			},
			Error::QueryTimeout { elapsed_ms } => ApiError::new(
				StatusCode::GATEWAY_TIMEOUT,
				"query_timeout",
				format!("Query aborted after {elapsed_ms} ms."),
			),
			Error::Provider { message } => {
				ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", message)
			},
			Error::Storage { message } => {
				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: ErrorDetail { code: self.code, message: self.message } };

		(self.status, Json(body)).into_response()
	}
}
