//! Pipeline phase machine and shared application state.
//!
//! [`PipelinePhase`] tracks where the current run is.  The UI reads it via
//! [`SharedState`] to decide what to render.
//!
//! [`AppState`] is the single source of truth for everything the UI needs:
//! phase, source text, result text, error message, and the selected language
//! pair.  Only the [`PipelineController`](super::PipelineController) writes
//! to it.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>`, cheap to clone
//! and safe to share across threads.

use std::sync::{Arc, Mutex};

use crate::language::LanguagePair;

// ---------------------------------------------------------------------------
// PipelinePhase
// ---------------------------------------------------------------------------

/// Step a run is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the system clipboard.
    Reading,
    /// Running text recognition on a pasted image.
    Recognizing,
    /// Waiting for the translator.
    Translating,
}

/// How the most recent run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Success,
    Error,
}

/// Phases of the paste pipeline.
///
/// ```text
/// Idle ──paste──▶ Processing(Reading)
///                 ──image──▶ Processing(Recognizing)
///                 ──text / OCR done──▶ Processing(Translating)
///                                      ──▶ Resolved(Success | Error)
/// Processing(Reading) ──empty clipboard──▶ Idle
/// Resolved ──paste / pair change──▶ Processing(..)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelinePhase {
    #[default]
    Idle,
    Processing(Stage),
    Resolved(Resolution),
}

impl PipelinePhase {
    /// Returns `true` while a run is reading, recognizing or translating.
    ///
    /// ```
    /// use paste_translator::pipeline::{PipelinePhase, Resolution, Stage};
    ///
    /// assert!(!PipelinePhase::Idle.is_busy());
    /// assert!(PipelinePhase::Processing(Stage::Recognizing).is_busy());
    /// assert!(!PipelinePhase::Resolved(Resolution::Error).is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelinePhase::Processing(_))
    }

    /// A short human-readable label suitable for the UI status line.
    pub fn label(&self) -> &'static str {
        match self {
            PipelinePhase::Idle => "Idle",
            PipelinePhase::Processing(Stage::Reading) => "Pasting...",
            PipelinePhase::Processing(Stage::Recognizing) => "Recognizing...",
            PipelinePhase::Processing(Stage::Translating) => "Translating...",
            PipelinePhase::Resolved(Resolution::Success) => "Done",
            PipelinePhase::Resolved(Resolution::Error) => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// SourceKind
// ---------------------------------------------------------------------------

/// Where the current source text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Text,
    /// OCR of a pasted image; dimensions are kept for display.
    Image { width: usize, height: usize },
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state.
pub struct AppState {
    pub phase: PipelinePhase,

    /// Text being translated: clipboard text, or OCR output joined by `\n`.
    pub source_text: String,

    pub source_kind: SourceKind,

    /// Translation of `source_text`.  `None` while a run is in flight and
    /// after a failed run.
    pub result_text: Option<String>,

    /// Message of the most recent failure.  Never set together with
    /// `result_text`.
    pub error_message: Option<String>,

    /// Direction used by the next translation.
    pub pair: LanguagePair,

    /// Direction of the last finished translation of `source_text`, whether
    /// it succeeded or failed.  `None` while the source has not been
    /// translated yet, including while a translation is in flight.
    pub translated_pair: Option<LanguagePair>,

    /// Supersession token of the newest run.  Writes from a run carrying an
    /// older token are dropped.
    pub generation: u64,
}

impl AppState {
    pub fn new(pair: LanguagePair) -> Self {
        Self {
            phase: PipelinePhase::Idle,
            source_text: String::new(),
            source_kind: SourceKind::Text,
            result_text: None,
            error_message: None,
            pair,
            translated_pair: None,
            generation: 0,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(LanguagePair::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Cheap to clone (`Arc` clone).  Lock for a short critical section; do
/// **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] starting on `pair`.
pub fn new_shared_state(pair: LanguagePair) -> SharedState {
    Arc::new(Mutex::new(AppState::new(pair)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
