//! Core `TextRecognizer` trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use crate::clipboard::ClipboardImage;

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Text recognition is switched off in `settings.toml`.
    #[error("text recognition is disabled")]
    Disabled,

    /// The image could not be prepared for the recognizer.
    #[error("cannot prepare image: {0}")]
    Image(String),

    /// HTTP transport or connection error, or a non-success status.
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("recognition request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse recognition response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for RecognitionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RecognitionError::Timeout
        } else {
            RecognitionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextRecognizer trait
// ---------------------------------------------------------------------------

/// Extracts text from an image.
///
/// # Contract
///
/// - Fragments come back in reading order (top to bottom).
/// - An image without text is `Ok(vec![])`, not an error.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &ClipboardImage) -> Result<Vec<String>, RecognitionError>;
}

// ---------------------------------------------------------------------------
// DisabledRecognizer
// ---------------------------------------------------------------------------

/// Stand-in used when OCR is disabled so image pastes surface a clear error.
#[derive(Debug, Default)]
pub struct DisabledRecognizer;

#[async_trait]
impl TextRecognizer for DisabledRecognizer {
    async fn recognize(&self, _image: &ClipboardImage) -> Result<Vec<String>, RecognitionError> {
        Err(RecognitionError::Disabled)
    }
}
