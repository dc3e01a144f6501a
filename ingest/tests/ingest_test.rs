//! Integration tests for the ingest routine.
//!
//! A deterministic fake provider stands in for the real model. The one test
//! that loads all-MiniLM-L6-v2 needs the `onnx` feature and is ignored by
//! default since it downloads the model.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use textvec_embeddings::{
    Embedding, EmbeddingError, EmbeddingProvider, EmbeddingResponse, SearchRequest, TextSegment,
};
use textvec_ingest::{
    InMemoryEmbeddingStore, IngestConfig, IngestError, ProviderKind, embed_with_config, ingest,
    ingest_into,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const DIM: usize = 4;

/// Embeds text into a fixed-size vector derived from its bytes.
struct FakeProvider {
    fail_on: Option<&'static str>,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(text: &'static str) -> Self {
        Self {
            fail_on: Some(text),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn fake_vector(text: &str) -> Embedding {
    let mut v = vec![0.0f32; DIM];
    for (i, b) in text.bytes().enumerate() {
        v[i % DIM] += f32::from(b) / 255.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-bytes"
    }

    fn dimension(&self) -> usize {
        DIM
    }

    async fn embed(&self, segment: &TextSegment) -> textvec_embeddings::Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(segment.text()) {
            return Err(EmbeddingError::Model(format!(
                "input rejected: {}",
                segment.text()
            )));
        }
        Ok(EmbeddingResponse::new(fake_vector(segment.text()), "fake-bytes"))
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[tokio::test]
async fn test_hello_world_goodbye() -> anyhow::Result<()> {
    init_tracing();
    let input = texts(&["hello world", "goodbye"]);

    let record = ingest(FakeProvider::new(), input.clone()).await?;

    assert_eq!(record.store.len(), 2);
    let stored: Vec<&str> = record.store.payloads().map(TextSegment::text).collect();
    assert_eq!(stored, vec!["hello world", "goodbye"]);
    assert_eq!(record.texts, input);
    assert_eq!(record.model.calls(), 2);
    assert_eq!(record.model.model_name(), "fake-bytes");
    Ok(())
}

#[tokio::test]
async fn test_order_and_one_to_one_correspondence() -> anyhow::Result<()> {
    let input: Vec<String> = (0..25).map(|i| format!("text number {i}")).collect();

    let record = ingest(FakeProvider::new(), input.clone()).await?;

    assert_eq!(record.store.len(), input.len());
    for (entry, text) in record.store.iter().zip(&input) {
        let payload = entry.payload.as_ref().map(TextSegment::text);
        assert_eq!(payload, Some(text.as_str()));
        assert_eq!(entry.embedding, fake_vector(text));
    }
    Ok(())
}

#[tokio::test]
async fn test_duplicates_and_empty_strings_are_kept() -> anyhow::Result<()> {
    let input = texts(&["same", "", "same"]);

    let record = ingest(FakeProvider::new(), input).await?;

    let stored: Vec<&str> = record.store.payloads().map(TextSegment::text).collect();
    assert_eq!(stored, vec!["same", "", "same"]);
    let ids: Vec<&str> = record.store.iter().map(|e| e.id.as_str()).collect();
    assert_ne!(ids[0], ids[2]);
    Ok(())
}

#[tokio::test]
async fn test_empty_input() -> anyhow::Result<()> {
    let provider = FakeProvider::new();

    let record = ingest(provider, Vec::new()).await?;

    assert!(record.store.is_empty());
    assert!(record.texts.is_empty());
    assert_eq!(record.model.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_embeddings_are_deterministic() -> anyhow::Result<()> {
    let provider = FakeProvider::new();
    let segment = TextSegment::new("hello world");

    let first = provider.embed(&segment).await?;
    let second = provider.embed(&segment).await?;
    assert_eq!(first.embedding, second.embedding);

    let record = ingest(provider, texts(&["hello world", "hello world"])).await?;
    let vectors: Vec<&Embedding> = record.store.iter().map(|e| &e.embedding).collect();
    assert_eq!(vectors[0], vectors[1]);
    Ok(())
}

#[tokio::test]
async fn test_failure_keeps_prefix_and_stops() {
    init_tracing();
    let provider = FakeProvider::failing_on("bad");
    let mut store = InMemoryEmbeddingStore::new();
    let input = texts(&["one", "two", "bad", "four", "five"]);

    let err = ingest_into(&provider, &mut store, &input).await.unwrap_err();

    assert!(matches!(
        err,
        IngestError::Embedding(EmbeddingError::Model(ref msg)) if msg == "input rejected: bad"
    ));
    assert_eq!(store.len(), 2);
    let stored: Vec<&str> = store.payloads().map(TextSegment::text).collect();
    assert_eq!(stored, vec!["one", "two"]);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_failure_on_first_text_returns_no_record() {
    let result = ingest(FakeProvider::failing_on("bad"), texts(&["bad", "fine"])).await;
    assert!(matches!(result, Err(IngestError::Embedding(_))));
}

#[tokio::test]
async fn test_ingest_into_appends_to_existing_store() -> anyhow::Result<()> {
    let provider = FakeProvider::new();
    let mut store = InMemoryEmbeddingStore::new();

    assert_eq!(ingest_into(&provider, &mut store, &texts(&["a", "b"])).await?, 2);
    assert_eq!(ingest_into(&provider, &mut store, &texts(&["c"])).await?, 1);

    let stored: Vec<&str> = store.payloads().map(TextSegment::text).collect();
    assert_eq!(stored, vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_dimension_change_mid_run_is_an_error() {
    let provider = FakeProvider::new();
    let mut store = InMemoryEmbeddingStore::with_dimension(DIM + 1);

    let err = ingest_into(&provider, &mut store, &texts(&["x"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Embedding(EmbeddingError::DimensionMismatch { .. })
    ));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_store_supports_search_after_ingest() -> anyhow::Result<()> {
    let record = ingest(FakeProvider::new(), texts(&["alpha", "beta", "gamma"])).await?;

    let query = record.model.embed(&TextSegment::new("beta")).await?;
    let matches = record
        .store
        .search(&SearchRequest::new(query.embedding).with_max_results(1))?;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].payload.as_ref().map(TextSegment::text), Some("beta"));
    Ok(())
}

#[tokio::test]
async fn test_embed_with_config_uses_openai_endpoint() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(|request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
            let text = body["input"].as_str().unwrap_or_default();
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": fake_vector(text), "index": 0 }],
                "model": "text-embedding-3-small",
                "usage": { "prompt_tokens": 1, "total_tokens": 1 }
            }))
        })
        .expect(2)
        .mount(&server)
        .await;

    let mut config = IngestConfig::default().with_provider(ProviderKind::OpenAI);
    config.openai.base_url = server.uri();
    config.openai.api_key = Some("test-key".to_string());

    let record = embed_with_config(&config, texts(&["hello world", "goodbye"])).await?;

    assert_eq!(record.model.name(), "openai");
    let stored: Vec<&str> = record.store.payloads().map(TextSegment::text).collect();
    assert_eq!(stored, vec!["hello world", "goodbye"]);
    let expected = fake_vector("hello world");
    let first = &record.store.iter().next().expect("first entry").embedding;
    assert_eq!(first.len(), DIM);
    for (got, want) in first.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-4, "{got} != {want}");
    }
    Ok(())
}

#[cfg(feature = "onnx")]
#[tokio::test]
#[ignore = "downloads the all-MiniLM-L6-v2 model"]
async fn test_embed_with_minilm() -> anyhow::Result<()> {
    init_tracing();
    let input = texts(&["hello world", "goodbye"]);

    let record = textvec_ingest::embed(input.clone()).await?;

    assert_eq!(record.store.len(), 2);
    assert_eq!(
        record.store.dimension(),
        Some(textvec_embeddings::MINILM_DIMENSION)
    );
    let stored: Vec<&str> = record.store.payloads().map(TextSegment::text).collect();
    assert_eq!(stored, vec!["hello world", "goodbye"]);
    assert_eq!(record.texts, input);

    let again = record.model.embed(&TextSegment::new("hello world")).await?;
    let first = &record.store.iter().next().expect("first entry").embedding;
    assert_eq!(&again.embedding, first);
    Ok(())
}
