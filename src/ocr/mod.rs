//! Text recognition (OCR) for pasted images.
//!
//! * [`TextRecognizer`]: async trait; returns text fragments in reading order.
//! * [`VisionRecognizer`]: OpenAI-compatible vision chat backend.
//! * [`DisabledRecognizer`]: used when OCR is turned off in config.

pub mod recognizer;
pub mod vision;

pub use recognizer::{DisabledRecognizer, RecognitionError, TextRecognizer};
pub use vision::VisionRecognizer;

use std::sync::Arc;

use crate::config::OcrConfig;

/// Pick the recognizer matching `config.enabled`.
pub fn recognizer_from_config(config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    if config.enabled {
        Arc::new(VisionRecognizer::from_config(config))
    } else {
        log::info!("ocr: disabled in config; image pastes will report an error");
        Arc::new(DisabledRecognizer)
    }
}
