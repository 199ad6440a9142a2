//! Text extraction. Turns an uploaded document into plain text.
//!
//! Exactly two document types are accepted: PDF and plain text. The type is
//! taken from the declared MIME type of the upload, never sniffed.

use bytes::Bytes;
use thiserror::Error;

/// An uploaded document. Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Bytes,
    pub content_type: String,
}

impl Document {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime(&self.content_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Matches on the MIME essence: parameters such as `charset` are dropped
    /// and the comparison is case-insensitive.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("application/pdf") {
            Some(DocumentKind::Pdf)
        } else if essence.eq_ignore_ascii_case("text/plain") {
            Some(DocumentKind::PlainText)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document type: {0:?}")]
    UnsupportedFormat(String),

    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Produces plain text from a document.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<String, ExtractError>;
}

/// PDF via `pdf-extract`, plain text as (lossy) UTF-8.
pub struct DocumentTextExtractor;

impl TextExtractor for DocumentTextExtractor {
    fn extract(&self, document: &Document) -> Result<String, ExtractError> {
        match document.kind() {
            Some(DocumentKind::Pdf) => pdf_extract::extract_text_from_mem(&document.bytes)
                .map_err(|e| ExtractError::ExtractionFailed(e.to_string())),
            Some(DocumentKind::PlainText) => {
                Ok(String::from_utf8_lossy(&document.bytes).into_owned())
            }
            None => Err(ExtractError::UnsupportedFormat(
                document.content_type.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_exact_mime() {
        assert_eq!(
            DocumentKind::from_mime("application/pdf"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            DocumentKind::from_mime("text/plain"),
            Some(DocumentKind::PlainText)
        );
    }

    #[test]
    fn test_kind_ignores_parameters_and_case() {
        assert_eq!(
            DocumentKind::from_mime("Text/Plain; charset=utf-8"),
            Some(DocumentKind::PlainText)
        );
    }

    #[test]
    fn test_kind_rejects_other_types() {
        assert_eq!(DocumentKind::from_mime("application/msword"), None);
        assert_eq!(DocumentKind::from_mime("text/html"), None);
        assert_eq!(DocumentKind::from_mime(""), None);
    }

    #[test]
    fn test_plain_text_is_decoded() {
        let doc = Document::new("John Doe, Software Engineer", "text/plain");
        let text = DocumentTextExtractor.extract(&doc).unwrap();
        assert_eq!(text, "John Doe, Software Engineer");
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let doc = Document::new(vec![b'o', b'k', 0xFF], "text/plain");
        let text = DocumentTextExtractor.extract(&doc).unwrap();
        assert!(text.starts_with("ok"));
    }

    #[test]
    fn test_unsupported_type_is_rejected() {
        let doc = Document::new("<html></html>", "text/html");
        let err = DocumentTextExtractor.extract(&doc).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(t) if t == "text/html"));
    }

    #[test]
    fn test_garbage_pdf_fails_extraction() {
        let doc = Document::new("definitely not a pdf", "application/pdf");
        let err = DocumentTextExtractor.extract(&doc).unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));
    }
}
