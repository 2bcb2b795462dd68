//! Text extraction for the intake surface. Media types outside the
//! allow-list are rejected before any state is created.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid file type '{0}'; please upload a PDF, Markdown, or plain-text file")]
    UnsupportedMediaType(String),

    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("file is not valid UTF-8")]
    Encoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Markdown,
    PlainText,
}

impl MediaType {
    /// Matches a `Content-Type` header value against the allow-list,
    /// ignoring any parameters (`; charset=...`).
    pub fn from_content_type(raw: &str) -> Result<Self, ExtractError> {
        let essence = raw.split(';').next().unwrap_or("").trim();
        match essence {
            "application/pdf" => Ok(MediaType::Pdf),
            "text/markdown" | "text/x-markdown" => Ok(MediaType::Markdown),
            "text/plain" => Ok(MediaType::PlainText),
            other => Err(ExtractError::UnsupportedMediaType(other.to_string())),
        }
    }
}

/// Reduces a raw document payload to plain text.
pub fn extract_text(media: MediaType, bytes: &[u8]) -> Result<String, ExtractError> {
    match media {
        MediaType::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
        }
        MediaType::Markdown | MediaType::PlainText => {
            let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::Encoding)?;
            Ok(text.to_string())
        }
    }
}
