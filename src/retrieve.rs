//! Multi-collection retrieval and context assembly.
//!
//! Runs k-NN against each passage collection, merges the tagged results
//! into a single sequence under a global distance order (relevance ranking
//! is source-agnostic), and builds the bounded context string handed to the
//! LLM. Display and context are truncated separately: display stays
//! concise, context is generous.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::RetrievalConfig;
use crate::index;
use crate::models::{Collection, ScoredPassage};

/// Separator between passage texts in the context string.
const CONTEXT_SEPARATOR: &str = ". ";

/// Outcome of a retrieval pass.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Globally ranked matches, truncated to `top_k`, for display.
    pub ranked: Vec<ScoredPassage>,
    /// Context string built from the `top_k_context` best matches. Empty
    /// when the whole corpus is empty; answering still proceeds on the
    /// model's own knowledge.
    pub context: String,
}

/// Retrieve the best passages across all collections for a query embedding.
///
/// Collections with no loaded passages contribute nothing; an empty corpus
/// is not an error.
pub async fn retrieve(
    pool: &SqlitePool,
    config: &RetrievalConfig,
    query_vec: &[f32],
) -> Result<Retrieval> {
    let mut groups = Vec::with_capacity(Collection::ALL.len());

    for collection in Collection::ALL {
        if index::passage_count(pool, collection).await? == 0 {
            continue;
        }
        groups.push(index::knn(pool, collection, query_vec, config.per_source_k).await?);
    }

    let merged = merge_ranked(groups);

    let context = build_context(&merged, config.top_k_context);
    let mut ranked = merged;
    ranked.truncate(config.top_k);

    Ok(Retrieval { ranked, context })
}

/// Merge per-collection result lists into one sequence ascending by
/// distance. Each input list is already sorted; the merge is stable, so
/// ties keep their within-collection insertion order.
pub fn merge_ranked(groups: Vec<Vec<ScoredPassage>>) -> Vec<ScoredPassage> {
    let mut merged: Vec<ScoredPassage> = groups.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged
}

/// Join the text of the best `top_k_context` passages with the fixed
/// separator.
pub fn build_context(merged: &[ScoredPassage], top_k_context: usize) -> String {
    merged
        .iter()
        .take(top_k_context)
        .map(|s| s.passage.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Collection, Passage};

    fn scored(collection: Collection, text: &str, distance: f64) -> ScoredPassage {
        ScoredPassage {
            collection,
            passage: Passage {
                source_id: format!("{}.src", collection),
                page: 1,
                paragraph_index: 0,
                text: text.to_string(),
            },
            distance,
        }
    }

    #[test]
    fn merge_interleaves_collections_by_distance() {
        let pdf = vec![
            scored(Collection::Pdf, "a", 0.1),
            scored(Collection::Pdf, "b", 0.3),
        ];
        let text = vec![
            scored(Collection::Text, "c", 0.2),
            scored(Collection::Text, "d", 0.4),
        ];

        let merged = merge_ranked(vec![pdf, text]);
        let top3: Vec<f64> = merged.iter().take(3).map(|s| s.distance).collect();
        assert_eq!(top3, vec![0.1, 0.2, 0.3]);
        assert_eq!(merged[0].passage.text, "a");
        assert_eq!(merged[1].passage.text, "c");
        assert_eq!(merged[2].passage.text, "b");
    }

    #[test]
    fn merge_is_stable_on_ties() {
        let pdf = vec![scored(Collection::Pdf, "first", 0.5)];
        let text = vec![scored(Collection::Text, "second", 0.5)];
        let merged = merge_ranked(vec![pdf, text]);
        assert_eq!(merged[0].passage.text, "first");
        assert_eq!(merged[1].passage.text, "second");
    }

    #[test]
    fn empty_groups_merge_to_empty() {
        let merged = merge_ranked(vec![Vec::new(), Vec::new()]);
        assert!(merged.is_empty());
        assert_eq!(build_context(&merged, 10), "");
    }

    #[test]
    fn context_joins_with_fixed_separator_and_truncates() {
        let merged = vec![
            scored(Collection::Text, "one", 0.1),
            scored(Collection::Text, "two", 0.2),
            scored(Collection::Text, "three", 0.3),
        ];
        assert_eq!(build_context(&merged, 2), "one. two");
        assert_eq!(build_context(&merged, 10), "one. two. three");
    }
}
