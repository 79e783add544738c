use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A transcript as emitted by the docx-to-JSON converter.
///
/// `text` holds every paragraph in document order; `bold` and `nonbold`
/// hold the paragraphs whose runs were (or were not) bold. Older
/// converter versions omit the style lists, so they default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub text: Vec<String>,
    #[serde(default)]
    pub bold: Vec<String>,
    #[serde(default)]
    pub nonbold: Vec<String>,
}

impl SourceDocument {
    /// Read and parse a converter output file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw).map_err(|e| Error::InvalidSource {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Paragraph at `idx`, or `""` when the document is shorter.
    pub fn paragraph(&self, idx: usize) -> &str {
        self.text.get(idx).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_document() {
        let doc = SourceDocument::parse(
            r#"{"text": ["a", "b"], "bold": ["a"], "nonbold": ["b"]}"#,
        )
        .unwrap();
        assert_eq!(doc.text, vec!["a", "b"]);
        assert_eq!(doc.bold, vec!["a"]);
        assert_eq!(doc.nonbold, vec!["b"]);
    }

    #[test]
    fn style_lists_default_to_empty() {
        let doc = SourceDocument::parse(r#"{"text": ["only"]}"#).unwrap();
        assert!(doc.bold.is_empty());
        assert!(doc.nonbold.is_empty());
    }

    #[test]
    fn missing_text_is_an_error() {
        assert!(SourceDocument::parse(r#"{"bold": []}"#).is_err());
    }

    #[test]
    fn paragraph_out_of_range_is_empty() {
        let doc = SourceDocument {
            text: vec!["x".into()],
            ..Default::default()
        };
        assert_eq!(doc.paragraph(0), "x");
        assert_eq!(doc.paragraph(5), "");
    }

    #[test]
    fn load_reports_path_on_bad_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("01.json");
        std::fs::write(&path, "not json").unwrap();

        match SourceDocument::load(&path) {
            Err(Error::InvalidSource { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected InvalidSource, got {other:?}"),
        }
    }
}
