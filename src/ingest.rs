//! Ingestion orchestration.
//!
//! Coordinates the full load flow: kind dispatch → registry dedup gate →
//! segmentation → transactional passage write → synchronous index refresh
//! → registration → cache invalidation. The cache clear is global by
//! design: new context can change the correct answer to any previously
//! asked question, regardless of which source changed.

use anyhow::{bail, Result};
use chrono::Utc;

use crate::cache;
use crate::index;
use crate::models::SourceKind;
use crate::pdf;
use crate::registry;
use crate::segment;
use crate::session::Session;
use crate::web;

/// Summary of a completed load.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub source_id: String,
    pub kind: SourceKind,
    pub passages: u64,
    pub embedded: u64,
    pub cache_cleared: u64,
}

/// Resolve how an input string should be ingested. URLs are recognized by
/// scheme; files by extension.
pub fn detect_kind(input: &str) -> Result<SourceKind> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(SourceKind::Web);
    }

    let path = std::path::Path::new(input);
    if !path.is_file() {
        bail!("File does not exist: {}", input);
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => Ok(SourceKind::Pdf),
        Some("txt") => Ok(SourceKind::Text),
        _ => bail!("Unsupported file type: {} (expected .pdf or .txt)", input),
    }
}

/// Load one source into the corpus.
///
/// Fails without mutating state when the source is invalid, unreadable, or
/// already registered. Passage rows for a source are committed in a single
/// transaction; the index refresh runs before the source is registered, so
/// a failure partway leaves the source unregistered and a reload repairs
/// the index (see [`index::build_or_refresh`]).
pub async fn run_load(session: &Session, input: &str) -> Result<LoadOutcome> {
    let kind = detect_kind(input)?;

    if registry::is_loaded(&session.pool, input).await? {
        bail!("Already loaded: {}", input);
    }

    let passages = match kind {
        SourceKind::Pdf => pdf::extract_passages(std::path::Path::new(input))?,
        SourceKind::Text => {
            let body = std::fs::read_to_string(input)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", input, e))?;
            segment::segment_text(input, &body)
        }
        SourceKind::Web => {
            web::fetch_passages(input, session.config.fetch.timeout_secs).await?
        }
    };

    let collection = kind.collection();
    index::insert_passages(&session.pool, collection, &passages).await?;

    let embedded = index::build_or_refresh(
        &session.pool,
        session.embedder.as_ref(),
        session.config.embedding.batch_size,
        collection,
    )
    .await?;

    registry::register(&session.pool, input, Utc::now()).await?;
    let cache_cleared = cache::clear(&session.pool).await?;

    Ok(LoadOutcome {
        source_id: input.to_string(),
        kind,
        passages: passages.len() as u64,
        embedded,
        cache_cleared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_dispatch_to_web() {
        assert_eq!(detect_kind("https://example.com/page").unwrap(), SourceKind::Web);
        assert_eq!(detect_kind("http://example.com").unwrap(), SourceKind::Web);
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = detect_kind("/nonexistent/notes.txt").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn unsupported_extension_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, "hello").unwrap();
        let err = detect_kind(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn known_extensions_dispatch_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        let pdf = dir.path().join("report.pdf");
        std::fs::write(&txt, "hello").unwrap();
        std::fs::write(&pdf, "%PDF-1.4").unwrap();
        assert_eq!(detect_kind(txt.to_str().unwrap()).unwrap(), SourceKind::Text);
        assert_eq!(detect_kind(pdf.to_str().unwrap()).unwrap(), SourceKind::Pdf);
    }
}
