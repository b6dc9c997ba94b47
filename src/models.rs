//! Core data models used throughout corpus-qa.
//!
//! These types represent the passages, registry records, and retrieval
//! results that flow through the ingestion and answering pipeline.

use chrono::{DateTime, Utc};

/// Which passage collection a row belongs to.
///
/// PDF-derived passages and text/web-derived passages are kept in separate
/// collections so each can be indexed independently; relevance ranking
/// across them is source-agnostic (see [`crate::retrieve`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Pdf,
    Text,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Pdf, Collection::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Pdf => "pdf",
            Collection::Text => "text",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Collection::Pdf => "PDF",
            Collection::Text => "text/web",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a source is ingested, resolved once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Text,
    Web,
}

impl SourceKind {
    /// Collection the kind's passages land in. Web pages are plain text
    /// once scraped, so they share the text collection.
    pub fn collection(&self) -> Collection {
        match self {
            SourceKind::Pdf => Collection::Pdf,
            SourceKind::Text | SourceKind::Web => Collection::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Text => "text",
            SourceKind::Web => "web",
        }
    }
}

/// A single indexed unit of document text with source/location metadata.
///
/// Identity is (source_id, page, paragraph_index). Duplicates are harmless:
/// a duplicate retrieval just duplicates context. Immutable after ingestion.
#[derive(Debug, Clone)]
pub struct Passage {
    /// File path or URL the passage came from.
    pub source_id: String,
    /// 1-based page number (always 1 for text files and web pages).
    pub page: i64,
    /// 0-based paragraph ordinal within the page.
    pub paragraph_index: i64,
    /// Sanitized, non-empty passage text.
    pub text: String,
}

/// One row per successfully ingested source; the dedup gate for `load`.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub source_id: String,
    pub loaded_at: DateTime<Utc>,
}

/// A passage scored against a query, tagged with its collection.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub collection: Collection,
    pub passage: Passage,
    /// Cosine distance to the query embedding. Lower = more similar.
    pub distance: f64,
}
