//! Clipboard reader backed by the `arboard` crate.
//!
//! Each read opens a short-lived [`arboard::Clipboard`] handle rather than
//! sharing one across calls, because `arboard::Clipboard` is not `Send` on all
//! platforms and the handle is cheap to create.

use arboard::Clipboard;

use super::{ClipboardContent, ClipboardError, ClipboardImage};

// ---------------------------------------------------------------------------
// ClipboardReader trait
// ---------------------------------------------------------------------------

/// Source of the clipboard's current content.
///
/// Reads are blocking OS calls; the pipeline runs them on the blocking thread
/// pool.  `Ok(None)` means the clipboard is empty or holds something that is
/// neither text nor an image.
pub trait ClipboardReader: Send + Sync {
    fn read(&self) -> Result<Option<ClipboardContent>, ClipboardError>;
}

// ---------------------------------------------------------------------------
// ArboardReader
// ---------------------------------------------------------------------------

/// Reads the system clipboard.  Text wins over an image when both are present.
#[derive(Debug, Clone, Default)]
pub struct ArboardReader;

impl ArboardReader {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardReader for ArboardReader {
    fn read(&self) -> Result<Option<ClipboardContent>, ClipboardError> {
        let mut clipboard =
            Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;

        match clipboard.get_text() {
            Ok(text) if !text.trim().is_empty() => {
                return Ok(Some(ClipboardContent::Text(text)));
            }
            Ok(_) => {}
            Err(e) => check_missing(e)?,
        }

        match clipboard.get_image() {
            Ok(image) => Ok(Some(ClipboardContent::Image(ClipboardImage {
                width: image.width,
                height: image.height,
                rgba: image.bytes.into_owned(),
            }))),
            Err(e) => {
                check_missing(e)?;
                Ok(None)
            }
        }
    }
}

/// Absent or unconvertible content is not an error; anything else is.
fn check_missing(e: arboard::Error) -> Result<(), ClipboardError> {
    match e {
        arboard::Error::ContentNotAvailable | arboard::Error::ConversionFailure => Ok(()),
        other => Err(ClipboardError::Access(other.to_string())),
    }
}
