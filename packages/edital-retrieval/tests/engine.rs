use std::sync::Arc;

use edital_domain::ProcessingState;
use edital_retrieval::{
	EmbeddingProvider, Error, ProcessRequest, QueryRequest, RetrievalEngine, ScoredResult,
};
use edital_testkit::{
	FailingEmbedding, MarkerEmbedding, MemoryIndex, PoisonedEmbedding, sample_edital, source_text,
	test_config,
};

fn engine_with(embedding: Arc<dyn EmbeddingProvider>) -> (RetrievalEngine, Arc<MemoryIndex>) {
	let store = Arc::new(MemoryIndex::new());
	let engine = RetrievalEngine::with_embedding(test_config(), store.clone(), embedding);

	(engine, store)
}

fn process_request(document_id: &str) -> ProcessRequest {
	ProcessRequest {
		document_id: document_id.to_string(),
		sources: vec![source_text(&sample_edital())],
		reprocess: false,
	}
}

fn query_request(document_id: &str, text: &str) -> QueryRequest {
	QueryRequest {
		document_id: document_id.to_string(),
		text: text.to_string(),
		top_k: None,
		hybrid_weight: None,
	}
}

fn assert_sorted_descending(results: &[ScoredResult]) {
	for pair in results.windows(2) {
		assert!(pair[0].hybrid_score >= pair[1].hybrid_score);
	}
}

#[tokio::test]
async fn process_then_query_returns_ranked_results() {
	let (engine, store) = engine_with(Arc::new(MarkerEmbedding));
	let report = engine.process(process_request("doc-1")).await.expect("Failed to process.");

	assert!(report.processed);
	assert!(report.chunk_count > 5);
	assert_eq!(report.failed_embeddings, 0);
	assert_eq!(report.failed_writes, 0);

	let manifest = store.stored_manifest("doc-1").expect("Expected a stored manifest.");

	assert_eq!(manifest.state, ProcessingState::Processed);
	assert_eq!(manifest.chunk_ids.len(), report.chunk_count);
	assert!(manifest.expires_at.is_some());

	let results = engine
		.query(query_request("doc-1", "qual o valor estimado da contratação"))
		.await
		.expect("Failed to query.");

	assert!(!results.is_empty());
	assert!(results.len() <= 10);
	assert_sorted_descending(&results);
	assert!(results[0].hierarchy_path.contains("valor"));
	assert!(results[0].hybrid_score > 0.0);
	assert_eq!(results[0].document_index, 0);
	assert_eq!(results[0].page_number, 1);
	assert_eq!(results[0].document_type, "edital");
}

#[tokio::test]
async fn processing_twice_skips_the_second_pass() {
	let (engine, store) = engine_with(Arc::new(MarkerEmbedding));
	let first = engine.process(process_request("doc-1")).await.expect("Failed to process.");
	let calls_after_first = store.upsert_call_count();
	let second = engine.process(process_request("doc-1")).await.expect("Failed to process again.");

	assert!(second.processed);
	assert_eq!(second.chunk_count, first.chunk_count);
	assert_eq!(store.upsert_call_count(), calls_after_first);
}

#[tokio::test]
async fn reprocess_rebuilds_the_document() {
	let (engine, store) = engine_with(Arc::new(MarkerEmbedding));
	let first = engine.process(process_request("doc-1")).await.expect("Failed to process.");
	let calls_after_first = store.upsert_call_count();
	let req = ProcessRequest { reprocess: true, ..process_request("doc-1") };
	let second = engine.process(req).await.expect("Failed to reprocess.");

	assert!(second.processed);
	assert_eq!(second.chunk_count, first.chunk_count);
	assert!(store.upsert_call_count() > calls_after_first);
	assert_eq!(store.chunk_count(), second.chunk_count);
}

#[tokio::test]
async fn query_before_processing_returns_no_results() {
	let (engine, _) = engine_with(Arc::new(MarkerEmbedding));
	let results = engine
		.query(query_request("doc-missing", "qual o prazo de entrega"))
		.await
		.expect("Expected an empty result set, not an error.");

	assert!(results.is_empty());
}

#[tokio::test]
async fn query_fails_when_the_embedding_provider_does() {
	let (engine, _) = engine_with(Arc::new(FailingEmbedding));
	let result = engine.query(query_request("doc-missing", "qual o prazo de entrega")).await;

	assert!(matches!(result, Err(Error::QueryEmbedding { .. })));
}

#[tokio::test]
async fn embedding_failures_do_not_block_processing() {
	let (engine, store) = engine_with(Arc::new(PoisonedEmbedding::new("balanço patrimonial")));
	let report = engine.process(process_request("doc-1")).await.expect("Failed to process.");

	assert!(report.processed);
	assert_eq!(report.failed_embeddings, 1);
	assert_eq!(report.failed_writes, 0);

	let manifest = store.stored_manifest("doc-1").expect("Expected a stored manifest.");
	let missing = manifest
		.chunk_ids
		.iter()
		.filter(|id| {
			store.stored_chunk(id).expect("Expected a stored chunk.").embedding.is_none()
		})
		.count();

	assert_eq!(missing, 1);

	let results = engine
		.query(query_request("doc-1", "qual o prazo de entrega dos materiais"))
		.await
		.expect("Failed to query.");

	assert!(!results.is_empty());
}

#[tokio::test]
async fn lost_writes_leave_the_document_unprocessed() {
	let (engine, store) = engine_with(Arc::new(MarkerEmbedding));

	store.fail_next_upserts(100);

	let report = engine.process(process_request("doc-1")).await.expect("Failed to process.");

	assert!(!report.processed);
	assert!(report.failed_writes > 0);

	let manifest = store.stored_manifest("doc-1").expect("Expected a stored manifest.");

	assert_eq!(manifest.state, ProcessingState::Unprocessed);

	let results = engine
		.query(query_request("doc-1", "qual o valor estimado"))
		.await
		.expect("Expected an empty result set, not an error.");

	assert!(results.is_empty());
}

#[tokio::test]
async fn transient_write_failures_are_retried() {
	let (engine, store) = engine_with(Arc::new(MarkerEmbedding));

	store.fail_next_upserts(1);

	let report = engine.process(process_request("doc-1")).await.expect("Failed to process.");

	assert!(report.processed);
	assert_eq!(report.failed_writes, 0);
	assert_eq!(store.upsert_call_count(), 2);
}

#[tokio::test]
async fn invalid_process_requests_write_nothing() {
	let (engine, store) = engine_with(Arc::new(MarkerEmbedding));
	let req = ProcessRequest {
		document_id: "doc-1".to_string(),
		sources: vec![source_text("   ")],
		reprocess: false,
	};
	let result = engine.process(req).await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
	assert!(store.stored_manifest("doc-1").is_none());
	assert_eq!(store.upsert_call_count(), 0);
}

#[tokio::test]
async fn query_deadline_aborts_scoring() {
	let store = Arc::new(MemoryIndex::new());
	let mut cfg = test_config();

	cfg.retrieval.query_deadline_ms = 0;

	let engine = RetrievalEngine::with_embedding(cfg, store.clone(), Arc::new(MarkerEmbedding));

	engine.process(process_request("doc-1")).await.expect("Failed to process.");

	let result = engine.query(query_request("doc-1", "qual o valor estimado")).await;

	assert!(matches!(result, Err(Error::QueryTimeout { .. })));
}

#[tokio::test]
async fn hybrid_weight_extremes_isolate_the_signals() {
	let (engine, _) = engine_with(Arc::new(MarkerEmbedding));

	engine.process(process_request("doc-1")).await.expect("Failed to process.");

	let keyword_only = QueryRequest {
		hybrid_weight: Some(0.0),
		..query_request("doc-1", "qual o valor estimado da contratação")
	};
	let results = engine.query(keyword_only).await.expect("Failed to query.");

	for result in &results {
		let expected = result.keyword_score + result.structural_boost;

		assert!((result.hybrid_score - expected).abs() < 1e-5);
	}

	let vector_only = QueryRequest {
		hybrid_weight: Some(1.0),
		..query_request("doc-1", "qual o valor estimado da contratação")
	};
	let results = engine.query(vector_only).await.expect("Failed to query.");

	for result in &results {
		let expected = result.vector_score + result.structural_boost;

		assert!((result.hybrid_score - expected).abs() < 1e-5);
	}
}

#[tokio::test]
async fn results_respect_the_requested_top_k() {
	let (engine, _) = engine_with(Arc::new(MarkerEmbedding));

	engine.process(process_request("doc-1")).await.expect("Failed to process.");

	let req =
		QueryRequest { top_k: Some(3), ..query_request("doc-1", "qual o valor estimado") };
	let results = engine.query(req).await.expect("Failed to query.");

	assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn concurrent_processing_runs_a_single_pass() {
	let (engine, store) = engine_with(Arc::new(MarkerEmbedding));
	let (first, second) =
		tokio::join!(engine.process(process_request("doc-1")), engine.process(process_request("doc-1")));
	let first = first.expect("Failed to process.");
	let second = second.expect("Failed to process.");

	assert!(first.processed);
	assert!(second.processed);
	assert_eq!(store.upsert_call_count(), 1);
}

#[tokio::test]
async fn load_embeddings_warms_the_cache() {
	let (engine, _) = engine_with(Arc::new(MarkerEmbedding));
	let report = engine.process(process_request("doc-1")).await.expect("Failed to process.");

	engine.clear_cache();

	let warmed = engine.load_embeddings("doc-1").await.expect("Failed to load embeddings.");

	assert_eq!(warmed, report.chunk_count);
	assert_eq!(engine.cache.embedding_count(), warmed);
}
