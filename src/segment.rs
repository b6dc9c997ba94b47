//! Blank-line passage segmentation.
//!
//! Splits normalized document text into [`Passage`]s at paragraph
//! granularity. Quote and semicolon characters are stripped so passage text
//! stays safe to persist and to splice into prompts, and chunks that are
//! empty after stripping are discarded — segmentation never produces a
//! passage with empty text.

use crate::models::Passage;

/// Characters removed from passage text and generated responses.
const STRIPPED: [char; 3] = ['\'', '"', ';'];

/// Strip quotes/semicolons and surrounding whitespace.
pub fn sanitize(text: &str) -> String {
    text.replace(STRIPPED, "").trim().to_string()
}

/// Split a body of text into sanitized paragraphs, in order.
pub fn split_paragraphs(body: &str) -> Vec<String> {
    body.split("\n\n")
        .map(sanitize)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Segment a text document (or scraped web page) into passages.
///
/// Text sources have no page structure, so every passage lands on page 1
/// with a 0-based paragraph ordinal.
pub fn segment_text(source_id: &str, body: &str) -> Vec<Passage> {
    split_paragraphs(body)
        .into_iter()
        .enumerate()
        .map(|(i, text)| Passage {
            source_id: source_id.to_string(),
            page: 1,
            paragraph_index: i as i64,
            text,
        })
        .collect()
}

/// Segment one page of an already page-split document.
pub fn segment_page(source_id: &str, page: i64, body: &str) -> Vec<Passage> {
    split_paragraphs(body)
        .into_iter()
        .enumerate()
        .map(|(i, text)| Passage {
            source_id: source_id.to_string(),
            page,
            paragraph_index: i as i64,
            text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines() {
        let body = "Alpha has three cats.\n\nBeta has one dog.";
        let passages = segment_text("notes.txt", body);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].text, "Alpha has three cats.");
        assert_eq!(passages[1].text, "Beta has one dog.");
        assert_eq!(passages[0].page, 1);
        assert_eq!(passages[0].paragraph_index, 0);
        assert_eq!(passages[1].paragraph_index, 1);
    }

    #[test]
    fn strips_quotes_and_semicolons() {
        assert_eq!(sanitize(r#"say "hello"; don't"#), "say hello dont");
    }

    #[test]
    fn never_emits_empty_passages() {
        let body = "First.\n\n\n\n  \n\n\"';\n\nLast.";
        let passages = segment_text("notes.txt", body);
        assert_eq!(passages.len(), 2);
        for p in &passages {
            assert!(!p.text.is_empty());
        }
    }

    #[test]
    fn empty_body_yields_no_passages() {
        assert!(segment_text("notes.txt", "").is_empty());
        assert!(segment_text("notes.txt", "\n\n\n\n").is_empty());
    }

    #[test]
    fn paragraph_indices_follow_surviving_order() {
        let body = "one\n\n\n\ntwo\n\nthree";
        let passages = segment_text("notes.txt", body);
        let indices: Vec<i64> = passages.iter().map(|p| p.paragraph_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn page_segmentation_carries_page_number() {
        let passages = segment_page("report.pdf", 3, "Intro.\n\nDetails.");
        assert!(passages.iter().all(|p| p.page == 3));
        assert_eq!(passages[1].paragraph_index, 1);
    }
}
