//! Web-page ingestion: fetch a URL and extract its visible text.
//!
//! A non-success HTTP status or a timed-out fetch fails the load cleanly —
//! no passages are written and the registry is untouched. Visible text is
//! collected from the parsed DOM (script/style/noscript subtrees skipped)
//! and segmented on blank-line boundaries like a text file.

use anyhow::{bail, Context, Result};
use scraper::Html;
use std::time::Duration;

use crate::models::Passage;
use crate::segment;

pub async fn fetch_passages(url: &str, timeout_secs: u64) -> Result<Vec<Passage>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch URL: {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("URL returned HTTP {}: {}", status, url);
    }

    let html = response.text().await?;
    Ok(segment::segment_text(url, &visible_text(&html)))
}

/// Concatenate the text nodes of the document, skipping subtrees that are
/// never rendered.
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| matches!(e.name(), "script" | "style" | "noscript"))
                .unwrap_or(false)
        });
        if !hidden {
            out.push_str(text);
        }
    }

    out
}
