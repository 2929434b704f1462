//! Paste pipeline: clipboard → (OCR) → translation → shared state.
//!
//! # Architecture
//!
//! ```text
//! HotkeyListener / UI buttons
//!        │  PipelineCommand (mpsc)
//!        ▼
//! PipelineController::run()  ← async tokio task
//!        │
//!        ├─ Paste
//!        │     ├─ spawn_blocking(ClipboardReader::read)   [Reading]
//!        │     ├─ TextRecognizer::recognize (images only)  [Recognizing]
//!        │     └─ Translator::translate                    [Translating]
//!        │                                                  → Resolved
//!        └─ SetLanguagePair / SwapLanguages
//!              └─ Translator::translate on existing source text
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by egui update() each frame
//! ```
//!
//! Every run takes a new supersession token.  Writes from a run whose token
//! is no longer the newest are dropped, so a fresh paste always wins over a
//! translation still in flight for the previous one.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use paste_translator::clipboard::ArboardReader;
//! use paste_translator::config::AppConfig;
//! use paste_translator::ocr::recognizer_from_config;
//! use paste_translator::pipeline::{new_shared_state, PipelineCommand, PipelineController};
//! use paste_translator::translate::ApiTranslator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let state = new_shared_state(config.languages.pair());
//!
//!     let controller = PipelineController::new(
//!         state.clone(),
//!         Arc::new(ArboardReader::new()),
//!         recognizer_from_config(&config.ocr),
//!         Arc::new(ApiTranslator::from_config(&config.translator)),
//!     );
//!
//!     let (tx, rx) = mpsc::channel(16);
//!     tokio::spawn(controller.run(rx));
//!     tx.send(PipelineCommand::Paste).await.unwrap();
//! }
//! ```

pub mod runner;
pub mod state;

use crate::language::LanguagePair;

pub use runner::{PipelineController, PipelineError, RunOutcome};
pub use state::{
    new_shared_state, AppState, PipelinePhase, Resolution, SharedState, SourceKind, Stage,
};

/// Requests accepted by [`PipelineController::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineCommand {
    /// Read the clipboard and translate it.
    Paste,
    /// Select a new direction; re-translates the current source text.
    SetLanguagePair(LanguagePair),
    /// Exchange source and target languages.
    SwapLanguages,
}
