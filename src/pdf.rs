//! PDF passage extraction.
//!
//! Text extraction itself is delegated to the `pdf-extract` crate; this
//! module only turns its output into passage rows. `pdf-extract` separates
//! pages with a form feed, so pages are split there and each page is
//! segmented on blank-line boundaries like any other text.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::Passage;
use crate::segment;

const PAGE_SEPARATOR: char = '\u{c}';

pub fn extract_passages(path: &Path) -> Result<Vec<Passage>> {
    let text = pdf_extract::extract_text(path)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;

    Ok(passages_from_text(&path.to_string_lossy(), &text))
}

fn passages_from_text(source_id: &str, text: &str) -> Vec<Passage> {
    let mut passages = Vec::new();
    for (i, page_text) in text.split(PAGE_SEPARATOR).enumerate() {
        passages.extend(segment::segment_page(source_id, i as i64 + 1, page_text));
    }
    passages
}
