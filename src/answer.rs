//! Answer generation: cache lookup → retrieval → generation → cache write.
//!
//! Per-query state machine: RECEIVED → CACHE_LOOKUP → {hit → return} |
//! {miss → retrieve → generate → cache write → return}. The query is
//! embedded exactly once and the vector is shared between the cache lookup
//! and the passage retrieval.

use anyhow::Result;

use crate::cache;
use crate::retrieve::{self, Retrieval};
use crate::segment;
use crate::session::Session;

/// A finished answer, either replayed from cache or freshly generated.
#[derive(Debug, Clone)]
pub struct Answer {
    pub response: String,
    /// Distance to the matched cached query, when the answer was a hit.
    pub cache_distance: Option<f64>,
    /// Present only for generated answers; a cache hit skips retrieval.
    pub retrieval: Option<Retrieval>,
}

impl Answer {
    pub fn cached(&self) -> bool {
        self.cache_distance.is_some()
    }
}

/// Answer a query against the loaded corpus.
pub async fn run_query(session: &Session, query: &str) -> Result<Answer> {
    let query_vec = session.embedder.embed_one(query).await?;

    if let Some(hit) =
        cache::lookup(&session.pool, &query_vec, session.config.cache.threshold).await?
    {
        return Ok(Answer {
            response: hit.response,
            cache_distance: Some(hit.distance),
            retrieval: None,
        });
    }

    let retrieval = retrieve::retrieve(&session.pool, &session.config.retrieval, &query_vec).await?;

    let prompt = build_prompt(&retrieval.context, query);
    let raw = session.llm.generate(&prompt).await?;
    let response = segment::sanitize(&raw);

    cache::store(&session.pool, query, &response, &query_vec).await?;

    Ok(Answer {
        response,
        cache_distance: None,
        retrieval: Some(retrieval),
    })
}

/// Reference prompt shape: grounding context first, literal question last.
/// With an empty corpus the context is empty and the model falls back to
/// its own knowledge, which the instruction explicitly permits.
fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "Answer the question based on the provided context. If the context is not relevant, \
         please answer the question by using your own knowledge about the topic.\n\
         context : {}\n\
         question : {}\n",
        context, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_context_and_question() {
        let prompt = build_prompt("Alpha has three cats", "How many cats does Alpha have?");
        assert!(prompt.contains("context : Alpha has three cats"));
        assert!(prompt.contains("question : How many cats does Alpha have?"));
    }

    #[test]
    fn empty_context_still_forms_a_prompt() {
        let prompt = build_prompt("", "What is Rust?");
        assert!(prompt.contains("context : \n"));
        assert!(prompt.contains("question : What is Rust?"));
    }
}
