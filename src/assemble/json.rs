//! JSON rendering for outline documents.
//!
//! The emitted object has four keys:
//!
//! - `document`: filename, page count, `processed_at` (RFC 3339),
//!   `processing_time` in seconds, language tag and the `degraded` flag
//! - `title`: the promoted title as a level-0 entry, or `null`
//! - `outline`: flat headings in reading order, each with `level` (1-3),
//!   `title`, `page`, `confidence` and an optional `font` summary
//! - `statistics`: `total_headings`, per-level counts and `average_confidence`
//!
//! The nested tree is not serialized; it is rebuilt from `outline` with
//! [`OutlineAssembler::from_entries`](crate::assemble::OutlineAssembler::from_entries).

use crate::error::{Error, Result};
use crate::model::OutlineDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert an outline document to JSON.
///
/// Serialization failures surface as [`Error::Render`].
pub fn to_json(doc: &OutlineDocument, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentInfo, Outline, OutlineNode};
    use chrono::Utc;

    fn sample() -> OutlineDocument {
        let info = DocumentInfo {
            filename: "report.pdf".to_string(),
            pages: 3,
            processed_at: Utc::now(),
            processing_time: 0.25,
            language: "latin".to_string(),
            degraded: false,
        };
        let mut outline = Outline::new();
        outline.title = Some(OutlineNode::new(0, "Report", 1, 0.9));
        outline.nodes.push(OutlineNode::new(1, "Introduction", 1, 0.8));
        OutlineDocument::new(info, outline)
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"outline\""));
        assert!(json.contains("\"h1_count\": 1"));
        assert!(json.contains("Introduction"));
        assert!(json.contains('\n'));
        assert!(!json.contains("\"tree\""));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"processed_at\""));
    }

    #[test]
    fn test_round_trip_keeps_outline() {
        let doc = sample();
        let json = to_json(&doc, JsonFormat::Compact).unwrap();
        let parsed: OutlineDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.outline, doc.outline);
        assert_eq!(parsed.title, doc.title);
    }

    #[test]
    fn test_top_level_keys() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["document", "outline", "statistics", "title"]);
        assert_eq!(value["title"]["level"], 0);
    }
}
