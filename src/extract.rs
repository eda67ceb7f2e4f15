//! Upload validation and document text extraction.
//!
//! Uploads arrive as bytes plus a client-declared content type. Only plain
//! text and PDF are accepted; everything else is rejected before the body
//! is read. The result is always UTF-8 text.

use tracing::{debug, warn};

use crate::models::{text_len, UploadResponse};

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// Shortest usable extracted text, in characters.
pub const MIN_EXTRACTED_CHARS: usize = 50;

const DEFAULT_FILENAME: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    NoFile,
    #[error("Only .txt and .pdf files are allowed")]
    UnsupportedType(String),
    #[error("File too large: maximum size is 5 MB")]
    TooLarge,
    #[error("File content must be at least 50 characters long")]
    TooShort,
    #[error("Malformed upload: {0}")]
    Malformed(String),
    #[error("PDF extraction failed: {0}")]
    Extraction(String),
}

/// The two document formats the relay can turn into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
}

impl DocumentKind {
    /// Maps a declared content type to a document kind.
    ///
    /// Parameters such as `; charset=utf-8` are ignored and the comparison
    /// is case-insensitive. A part without a content type is plain text
    /// (RFC 7578 §4.4).
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self, UploadError> {
        let Some(raw) = content_type else {
            return Ok(DocumentKind::PlainText);
        };
        let essence = raw
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            MIME_TEXT => Ok(DocumentKind::PlainText),
            MIME_PDF => Ok(DocumentKind::Pdf),
            _ => Err(UploadError::UnsupportedType(raw.to_string())),
        }
    }
}

/// Accumulates upload bytes, refusing to grow past [`MAX_UPLOAD_BYTES`].
#[derive(Debug, Default)]
pub struct BoundedBuffer {
    bytes: Vec<u8>,
}

impl BoundedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge);
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

/// Converts raw bytes to text according to `kind`.
///
/// Runs synchronously; PDF parsing is CPU-bound, so async callers should
/// go through [`extract_upload`].
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, UploadError> {
    match kind {
        DocumentKind::PlainText => Ok(decode_text(bytes)),
        DocumentKind::Pdf => extract_pdf(bytes),
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn extract_pdf(bytes: &[u8]) -> Result<String, UploadError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| UploadError::Extraction(e.to_string()))
}

/// Extracts text from an uploaded file and checks the minimum length.
pub async fn extract_upload(
    bytes: Vec<u8>,
    kind: DocumentKind,
    filename: Option<String>,
) -> Result<UploadResponse, UploadError> {
    debug!(?kind, size = bytes.len(), "extracting upload");

    let text = match kind {
        DocumentKind::PlainText => extract_text(&bytes, kind)?,
        // pdf-extract can panic on malformed input; a panicked task surfaces as JoinError.
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || extract_text(&bytes, kind))
            .await
            .map_err(|e| {
                warn!(error = %e, "PDF extraction task aborted");
                UploadError::Extraction("document could not be parsed".to_string())
            })??,
    };

    if text_len(&text) < MIN_EXTRACTED_CHARS {
        return Err(UploadError::TooShort);
    }

    Ok(UploadResponse {
        text,
        filename: filename
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_text_and_pdf_content_types() {
        assert_eq!(
            DocumentKind::from_content_type(Some("text/plain")),
            Ok(DocumentKind::PlainText)
        );
        assert_eq!(
            DocumentKind::from_content_type(Some("text/plain; charset=utf-8")),
            Ok(DocumentKind::PlainText)
        );
        assert_eq!(
            DocumentKind::from_content_type(Some("Application/PDF")),
            Ok(DocumentKind::Pdf)
        );
    }

    #[test]
    fn rejects_other_content_types() {
        for ct in [Some("image/png"), Some("text/html"), Some("")] {
            let err = DocumentKind::from_content_type(ct).unwrap_err();
            assert!(matches!(err, UploadError::UnsupportedType(_)));
        }
    }

    #[test]
    fn missing_content_type_defaults_to_plain_text() {
        assert_eq!(
            DocumentKind::from_content_type(None),
            Ok(DocumentKind::PlainText)
        );
    }

    #[test]
    fn bounded_buffer_stops_past_limit() {
        let mut buf = BoundedBuffer::new();
        buf.push(&vec![b'a'; MAX_UPLOAD_BYTES - 1]).unwrap();
        buf.push(b"b").unwrap();
        assert_eq!(buf.push(b"c"), Err(UploadError::TooLarge));
        assert_eq!(buf.into_inner().len(), MAX_UPLOAD_BYTES);
    }

    #[test]
    fn plain_text_is_decoded_and_bom_stripped() {
        let text = extract_text(b"\xEF\xBB\xBFhello", DocumentKind::PlainText).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let text = extract_text(b"ab\xFFcd", DocumentKind::PlainText).unwrap();
        assert_eq!(text, "ab\u{FFFD}cd");
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", DocumentKind::Pdf).unwrap_err();
        assert!(matches!(err, UploadError::Extraction(_)));
    }

    #[tokio::test]
    async fn sixty_chars_round_trip() {
        let body = "x".repeat(60);
        let resp = extract_upload(
            body.clone().into_bytes(),
            DocumentKind::PlainText,
            Some("notes.txt".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(resp.text, body);
        assert_eq!(resp.filename, "notes.txt");
    }

    #[tokio::test]
    async fn short_content_is_rejected() {
        let err = extract_upload(b"tiny".to_vec(), DocumentKind::PlainText, None)
            .await
            .unwrap_err();
        assert_eq!(err, UploadError::TooShort);
    }

    #[tokio::test]
    async fn missing_filename_gets_default() {
        let resp = extract_upload("y".repeat(50).into_bytes(), DocumentKind::PlainText, None)
            .await
            .unwrap();
        assert_eq!(resp.filename, "upload");
    }

    #[tokio::test]
    async fn broken_pdf_is_an_extraction_error() {
        let err = extract_upload(b"%PDF-1.4 garbage".to_vec(), DocumentKind::Pdf, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Extraction(_)));
    }
}
