//! JSON rendering for extraction results.

use crate::error::{Error, Result};
use crate::model::DocumentResult;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a document result. Image bytes are left out.
pub fn to_json(result: &DocumentResult, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(result),
        JsonFormat::Compact => serde_json::to_string(result),
    };

    json.map_err(|e| Error::Serialize(e.to_string()))
}

impl DocumentResult {
    /// Pretty-printed JSON for this result.
    pub fn to_json(&self) -> Result<String> {
        to_json(self, JsonFormat::Pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageResult;

    fn sample() -> DocumentResult {
        let mut doc = DocumentResult::with_capacity("invoice.pdf", "native", 1);
        doc.pages.push(PageResult {
            index: 0,
            text: "Invoice #123".into(),
            images: vec![],
            tables: vec![],
        });
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"source\": \"invoice.pdf\""));
        assert!(json.contains("Invoice #123"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));

        let back: DocumentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
