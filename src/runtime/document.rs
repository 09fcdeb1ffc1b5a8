//! Document parsing for record content.

use serde_json::Value as JsonValue;

use crate::error::ParseError;

/// A record's content parsed into a JSON tree.
///
/// Built once per record and shared by every query evaluated against that
/// record. It is dropped as soon as the record has been classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    root: JsonValue,
}

impl ParsedDocument {
    /// Parse the full content as a single JSON document.
    ///
    /// # Errors
    /// Returns `ParseError` for malformed input, empty input, or trailing
    /// bytes after the document. No partial document is ever produced.
    pub fn parse(content: &[u8]) -> Result<Self, ParseError> {
        let root = serde_json::from_slice(content)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &JsonValue {
        &self.root
    }
}

impl From<JsonValue> for ParsedDocument {
    fn from(root: JsonValue) -> Self {
        Self { root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object() {
        let doc = ParsedDocument::parse(br#"{"data":{"name":"Esteban","age":32}}"#).unwrap();
        assert_eq!(doc.root()["data"]["age"], json!(32));
    }

    #[test]
    fn test_parse_scalar_document() {
        let doc = ParsedDocument::parse(b"  42 ").unwrap();
        assert_eq!(doc.root(), &json!(42));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = ParsedDocument::parse(b"{\"data\": [1, 2").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_parse_rejects_trailing_content() {
        assert!(ParsedDocument::parse(b"{} {}").is_err());
        assert!(ParsedDocument::parse(b"{\"a\":1} trailing").is_err());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(ParsedDocument::parse(b"").is_err());
        assert!(ParsedDocument::parse(b"   ").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        assert!(ParsedDocument::parse(&[b'"', 0xff, 0xfe, b'"']).is_err());
    }
}
