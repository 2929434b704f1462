//! Clipboard access for the paste pipeline.
//!
//! The pipeline only needs to know *what* is on the clipboard: text, an
//! image, or nothing usable.  [`ClipboardReader`] abstracts the read so the
//! controller can be driven by a test double; [`ArboardReader`] is the
//! production implementation.

pub mod reader;

pub use reader::{ArboardReader, ClipboardReader};

use std::io::Cursor;

use thiserror::Error;

// ---------------------------------------------------------------------------
// ClipboardError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    /// The OS clipboard could not be opened or read.
    #[error("cannot access clipboard: {0}")]
    Access(String),

    /// Pixel data could not be encoded for upload.
    #[error("cannot encode clipboard image: {0}")]
    ImageEncode(String),
}

// ---------------------------------------------------------------------------
// ClipboardContent
// ---------------------------------------------------------------------------

/// What the clipboard held at read time.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardContent {
    Text(String),
    Image(ClipboardImage),
}

/// Raw bitmap copied out of the clipboard.
///
/// `rgba` is tightly packed 8-bit RGBA, row-major, `width * height * 4` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ClipboardImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for ClipboardImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl ClipboardImage {
    /// Encode the bitmap as PNG.
    ///
    /// # Errors
    ///
    /// [`ClipboardError::ImageEncode`] when the byte length does not match the
    /// dimensions or the encoder fails.
    pub fn to_png(&self) -> Result<Vec<u8>, ClipboardError> {
        let width = u32::try_from(self.width)
            .map_err(|_| ClipboardError::ImageEncode(format!("width {} too large", self.width)))?;
        let height = u32::try_from(self.height).map_err(|_| {
            ClipboardError::ImageEncode(format!("height {} too large", self.height))
        })?;

        let buffer = image::RgbaImage::from_raw(width, height, self.rgba.clone()).ok_or_else(|| {
            ClipboardError::ImageEncode(format!(
                "{} bytes do not fit a {}x{} RGBA image",
                self.rgba.len(),
                self.width,
                self.height
            ))
        })?;

        let mut png = Cursor::new(Vec::new());
        buffer
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| ClipboardError::ImageEncode(e.to_string()))?;
        Ok(png.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
