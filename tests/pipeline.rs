//! End-to-end pipeline tests over a temporary store, with deterministic
//! stub embedding and generation services so no external model is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use httpmock::prelude::*;
use tempfile::TempDir;

use corpus_qa::answer;
use corpus_qa::config::Config;
use corpus_qa::embedding::Embedder;
use corpus_qa::ingest;
use corpus_qa::llm::LlmClient;
use corpus_qa::registry;
use corpus_qa::session::Session;

const DIMS: usize = 64;

/// Deterministic bag-of-words embedder: identical text embeds to identical
/// vectors, shared vocabulary pulls texts closer.
struct StubEmbedder;

fn embed_text(text: &str) -> Vec<f32> {
    let mut vec = vec![0.0f32; DIMS];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut h: u64 = 1469598103934665603;
        for b in word.bytes() {
            h ^= u64::from(b);
            h = h.wrapping_mul(1099511628211);
        }
        vec[(h % DIMS as u64) as usize] += 1.0;
    }
    vec
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_name(&self) -> &str {
        "stub-bow"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_text(t)).collect())
    }
}

/// Generation stub that counts invocations and returns a distinct response
/// per call, so cache replays are distinguishable from regeneration.
struct StubLlm {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmClient for StubLlm {
    fn model_name(&self) -> &str {
        "stub-llm"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        assert!(prompt.contains("question :"));
        Ok(format!("generated #{n}"))
    }
}

struct Fixture {
    _tmp: TempDir,
    session: Session,
    llm_calls: Arc<AtomicUsize>,
}

async fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data.dir = tmp.path().join("data");
    config.fetch.timeout_secs = 5;

    let llm_calls = Arc::new(AtomicUsize::new(0));
    let llm = StubLlm {
        calls: llm_calls.clone(),
    };

    let session = Session::open(config, Box::new(StubEmbedder), Box::new(llm), false)
        .await
        .unwrap();

    Fixture {
        _tmp: tmp,
        session,
        llm_calls,
    }
}

fn write_notes(dir: &std::path::Path) -> String {
    let path = dir.join("notes.txt");
    std::fs::write(
        &path,
        "Alpha has three cats.\n\nBeta has one dog.",
    )
    .unwrap();
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn load_and_retrieve_notes() {
    let fx = fixture().await;
    let notes = write_notes(fx._tmp.path());

    let outcome = ingest::run_load(&fx.session, &notes).await.unwrap();
    assert_eq!(outcome.passages, 2);
    assert_eq!(outcome.embedded, 2);

    let result = answer::run_query(&fx.session, "How many cats does Alpha have?")
        .await
        .unwrap();

    let retrieval = result.retrieval.as_ref().expect("fresh answer retrieves");
    assert_eq!(
        retrieval.ranked[0].passage.text, "Alpha has three cats.",
        "cat paragraph must be the top match"
    );
    assert!(retrieval.context.contains("Alpha has three cats."));
    assert_eq!(result.response, "generated #1");
}

#[tokio::test]
async fn identical_text_ranks_at_distance_zero() {
    let fx = fixture().await;
    let notes = write_notes(fx._tmp.path());
    ingest::run_load(&fx.session, &notes).await.unwrap();

    let result = answer::run_query(&fx.session, "Alpha has three cats.")
        .await
        .unwrap();

    let top = &result.retrieval.as_ref().unwrap().ranked[0];
    assert_eq!(top.passage.text, "Alpha has three cats.");
    assert!(top.distance.abs() < 1e-6);
}

#[tokio::test]
async fn duplicate_load_is_rejected() {
    let fx = fixture().await;
    let notes = write_notes(fx._tmp.path());

    ingest::run_load(&fx.session, &notes).await.unwrap();
    let err = ingest::run_load(&fx.session, &notes).await.unwrap_err();
    assert!(err.to_string().contains("Already loaded"));

    let records = registry::list(&fx.session.pool).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn empty_corpus_query_succeeds_with_empty_context() {
    let fx = fixture().await;

    let result = answer::run_query(&fx.session, "What is Rust?").await.unwrap();
    let retrieval = result.retrieval.as_ref().unwrap();
    assert!(retrieval.ranked.is_empty());
    assert_eq!(retrieval.context, "");
    assert_eq!(result.response, "generated #1");
    assert_eq!(fx.llm_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_query_hits_cache_without_regenerating() {
    let fx = fixture().await;
    let notes = write_notes(fx._tmp.path());
    ingest::run_load(&fx.session, &notes).await.unwrap();

    let first = answer::run_query(&fx.session, "How many cats does Alpha have?")
        .await
        .unwrap();
    let second = answer::run_query(&fx.session, "How many cats does Alpha have?")
        .await
        .unwrap();

    assert_eq!(first.response, second.response);
    assert!(!first.cached());
    assert!(second.cached());
    assert_eq!(
        fx.llm_calls.load(Ordering::SeqCst),
        1,
        "generation must run at most once across both calls"
    );
}

#[tokio::test]
async fn load_invalidates_cache_for_all_queries() {
    let fx = fixture().await;
    let notes = write_notes(fx._tmp.path());
    ingest::run_load(&fx.session, &notes).await.unwrap();

    answer::run_query(&fx.session, "How many cats does Alpha have?")
        .await
        .unwrap();
    assert_eq!(fx.llm_calls.load(Ordering::SeqCst), 1);

    // Any successful load clears the whole cache, even for untouched
    // sources: new context may change any answer.
    let more = fx._tmp.path().join("more.txt");
    std::fs::write(&more, "Alpha adopted two more cats.").unwrap();
    let outcome = ingest::run_load(&fx.session, more.to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(outcome.cache_cleared, 1);

    let again = answer::run_query(&fx.session, "How many cats does Alpha have?")
        .await
        .unwrap();
    assert!(!again.cached());
    assert_eq!(fx.llm_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_url_load_leaves_state_unchanged() {
    let fx = fixture().await;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gone");
        then.status(404);
    });
    let url = server.url("/gone");

    let err = ingest::run_load(&fx.session, &url).await.unwrap_err();
    assert!(err.to_string().contains("404"));

    assert!(registry::list(&fx.session.pool).await.unwrap().is_empty());
    let passages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM passages")
        .fetch_one(&fx.session.pool)
        .await
        .unwrap();
    assert_eq!(passages, 0);
}

#[tokio::test]
async fn web_load_lands_in_text_collection() {
    let fx = fixture().await;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pets");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html><body>Alpha has three cats.\n\nBeta has one dog.</body></html>");
    });
    let url = server.url("/pets");

    let outcome = ingest::run_load(&fx.session, &url).await.unwrap();
    assert_eq!(outcome.passages, 2);

    let result = answer::run_query(&fx.session, "How many cats does Alpha have?")
        .await
        .unwrap();
    let top = &result.retrieval.as_ref().unwrap().ranked[0];
    assert_eq!(top.passage.source_id, url);
    assert!(top.passage.text.contains("Alpha has three cats"));
}
