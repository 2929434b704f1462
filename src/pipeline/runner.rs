//! Pipeline controller: drives clipboard → OCR → translation runs.
//!
//! [`PipelineController`] owns the write side of [`SharedState`] and responds
//! to [`PipelineCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Run flow
//!
//! ```text
//! Paste
//!   └─▶ new token, clear error                        [Reading]
//!         ├─ nothing usable   → EmptyClipboard        [Idle]
//!         ├─ Text(t)          → source = t
//!         └─ Image(img)       → recognize             [Recognizing]
//!               ├─ Err        → RecognitionFailed     [Resolved(Error)]
//!               ├─ []         → NoTextRecognized      [Resolved(Error)]
//!               └─ fragments  → source = join("\n")
//!   └─▶ translate(source, current pair)               [Translating]
//!         ├─ Ok  → result, history                    [Resolved(Success)]
//!         └─ Err → TranslationFailed                  [Resolved(Error)]
//! ```
//!
//! Every write re-checks the run's token under the state lock; a run that
//! has been superseded stops at its next write and reports
//! [`RunOutcome::Superseded`].  In-flight OCR and HTTP calls are not aborted.

use std::sync::{Arc, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::clipboard::{ClipboardContent, ClipboardReader};
use crate::history::{HistoryItem, HistoryStore};
use crate::language::LanguagePair;
use crate::ocr::TextRecognizer;
use crate::translate::{TranslationRequest, Translator};

use super::state::{AppState, PipelinePhase, Resolution, SharedState, SourceKind, Stage};
use super::PipelineCommand;

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Failures of a single run.  None of them are fatal; the controller always
/// settles in a stable phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The clipboard was empty or held neither text nor an image.
    #[error("Clipboard has no text or image to translate")]
    EmptyClipboard,
    /// OCR ran but found no text in the image.
    #[error("No text was recognized in the image")]
    NoTextRecognized,
    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),
    #[error("Translation error: {0}")]
    TranslationFailed(String),
    /// The clipboard could not be opened.
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    /// Unexpected failure such as a panicked blocking task.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run's result (or error) is what the UI now shows.
    Resolved,
    /// A newer run started first; this run's result was discarded.
    Superseded,
    /// Nothing to do: same pair selected again, or no source text yet.
    Unchanged,
}

/// Supersession token.
type Token = u64;

// ---------------------------------------------------------------------------
// PipelineController
// ---------------------------------------------------------------------------

/// Drives paste and re-translation runs against the shared state.
///
/// Cheap to clone; clones share the same state and collaborators, which is
/// how concurrent runs are spawned.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use paste_translator::pipeline::{new_shared_state, PipelineController};
/// # use paste_translator::clipboard::ClipboardReader;
/// # use paste_translator::ocr::TextRecognizer;
/// # use paste_translator::translate::Translator;
/// # fn make_clipboard() -> Arc<dyn ClipboardReader> { unimplemented!() }
/// # fn make_ocr() -> Arc<dyn TextRecognizer> { unimplemented!() }
/// # fn make_translator() -> Arc<dyn Translator> { unimplemented!() }
/// # async fn example() {
/// let state = new_shared_state(Default::default());
/// let controller = PipelineController::new(
///     state.clone(),
///     make_clipboard(),
///     make_ocr(),
///     make_translator(),
/// );
/// controller.handle_paste().await.ok();
/// println!("{:?}", state.lock().unwrap().result_text);
/// # }
/// ```
#[derive(Clone)]
pub struct PipelineController {
    state: SharedState,
    clipboard: Arc<dyn ClipboardReader>,
    recognizer: Arc<dyn TextRecognizer>,
    translator: Arc<dyn Translator>,
    history: Option<Arc<HistoryStore>>,
}

impl PipelineController {
    /// Create a controller.
    ///
    /// # Arguments
    ///
    /// * `state`: shared application state (also read by the UI).
    /// * `clipboard`: clipboard reader (e.g. `ArboardReader`).
    /// * `recognizer`: OCR backend (e.g. `VisionRecognizer`).
    /// * `translator`: translation backend (e.g. `ApiTranslator`).
    pub fn new(
        state: SharedState,
        clipboard: Arc<dyn ClipboardReader>,
        recognizer: Arc<dyn TextRecognizer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            state,
            clipboard,
            recognizer,
            translator,
            history: None,
        }
    }

    /// Record every successful translation in `history`.
    pub fn with_history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Process commands until `commands` is closed.
    ///
    /// The synchronous part of each command (taking a token, storing a new
    /// pair) happens here in arrival order; the awaited part is spawned so a
    /// newer paste never waits behind an older translation.
    pub async fn run(self, mut commands: mpsc::Receiver<PipelineCommand>) {
        while let Some(command) = commands.recv().await {
            log::debug!("pipeline: received {:?}", command);
            match command {
                PipelineCommand::Paste => {
                    let token = self.begin_paste();
                    let controller = self.clone();
                    tokio::spawn(async move {
                        log_outcome(controller.finish_paste(token).await);
                    });
                }
                PipelineCommand::SetLanguagePair(pair) => self.spawn_pair_change(pair),
                PipelineCommand::SwapLanguages => {
                    let pair = self.lock().pair.swapped();
                    self.spawn_pair_change(pair);
                }
            }
        }

        log::info!("pipeline: command channel closed, controller shutting down");
    }

    fn spawn_pair_change(&self, pair: LanguagePair) {
        if let Some((token, text)) = self.begin_pair_change(pair) {
            let controller = self.clone();
            tokio::spawn(async move {
                log_outcome(controller.translate_source(token, text).await);
            });
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Run the full paste pipeline once.
    ///
    /// Supersedes any run still in flight.  The error, if any, is also
    /// written to the shared state (except [`PipelineError::EmptyClipboard`]
    /// and clipboard access errors, which leave the displayed texts alone).
    ///
    /// When the clipboard turns out to be unusable but the existing source
    /// text was never translated with the current pair (the pair changed
    /// while reading, or this paste cut off a translation), that source is
    /// translated instead and the outcome of that translation is returned.
    pub async fn handle_paste(&self) -> Result<RunOutcome, PipelineError> {
        let token = self.begin_paste();
        self.finish_paste(token).await
    }

    /// Switch to `pair`, re-translating the existing source text.
    ///
    /// Neither the clipboard nor the recognizer is touched.  When a paste is
    /// still reading or recognizing, the new pair is simply stored; that run
    /// reads it when it starts translating, or re-translates the existing
    /// source if the clipboard turns out to be empty.
    pub async fn on_language_pair_changed(
        &self,
        pair: LanguagePair,
    ) -> Result<RunOutcome, PipelineError> {
        match self.begin_pair_change(pair) {
            Some((token, text)) => self.translate_source(token, text).await,
            None => Ok(RunOutcome::Unchanged),
        }
    }

    /// Exchange source and target languages.
    pub async fn swap_languages(&self) -> Result<RunOutcome, PipelineError> {
        let pair = self.lock().pair.swapped();
        self.on_language_pair_changed(pair).await
    }

    // -----------------------------------------------------------------------
    // Run stages
    // -----------------------------------------------------------------------

    fn begin_paste(&self) -> Token {
        let mut st = self.lock();
        st.generation += 1;
        st.phase = PipelinePhase::Processing(Stage::Reading);
        st.error_message = None;
        log::debug!("pipeline[{}]: paste → Reading", st.generation);
        st.generation
    }

    async fn finish_paste(&self, token: Token) -> Result<RunOutcome, PipelineError> {
        let content = match self.read_clipboard().await {
            Ok(Some(content)) => content,
            Ok(None) => return self.abandon(token, PipelineError::EmptyClipboard).await,
            Err(e) => return self.abandon(token, e).await,
        };

        let source_text = match content {
            ClipboardContent::Text(text) => {
                if text.trim().is_empty() {
                    return self.abandon(token, PipelineError::EmptyClipboard).await;
                }
                let stored = self.apply(token, |st| {
                    st.source_text = text.clone();
                    st.source_kind = SourceKind::Text;
                    st.result_text = None;
                    st.translated_pair = None;
                });
                if stored.is_none() {
                    return Ok(superseded(token));
                }
                text
            }
            ClipboardContent::Image(image) => {
                let stored = self.apply(token, |st| {
                    st.phase = PipelinePhase::Processing(Stage::Recognizing);
                    st.source_text.clear();
                    st.source_kind = SourceKind::Image {
                        width: image.width,
                        height: image.height,
                    };
                    st.result_text = None;
                    st.translated_pair = None;
                });
                if stored.is_none() {
                    return Ok(superseded(token));
                }
                log::debug!(
                    "pipeline[{token}]: Recognizing {}x{} image",
                    image.width,
                    image.height
                );

                let fragments = match self.recognizer.recognize(&image).await {
                    Ok(fragments) => fragments,
                    Err(e) => {
                        return self.fail(
                            token,
                            PipelineError::RecognitionFailed(e.to_string()),
                            None,
                        )
                    }
                };
                if fragments.is_empty() {
                    return self.fail(token, PipelineError::NoTextRecognized, None);
                }

                let text = fragments.join("\n");
                if self
                    .apply(token, |st| st.source_text = text.clone())
                    .is_none()
                {
                    return Ok(superseded(token));
                }
                text
            }
        };

        self.translate_source(token, source_text).await
    }

    /// Store `pair`; returns a token and the text to re-translate when a
    /// translation is needed.
    fn begin_pair_change(&self, pair: LanguagePair) -> Option<(Token, String)> {
        let mut st = self.lock();
        if st.pair == pair {
            return None;
        }
        log::debug!("pipeline: language pair {} → {}", st.pair, pair);
        st.pair = pair;

        if matches!(
            st.phase,
            PipelinePhase::Processing(Stage::Reading | Stage::Recognizing)
        ) {
            return None;
        }
        if st.source_text.is_empty() {
            return None;
        }

        st.generation += 1;
        Some((st.generation, st.source_text.clone()))
    }

    /// Translate `text` with the pair current at the moment translation
    /// starts, then publish the result.
    async fn translate_source(
        &self,
        token: Token,
        text: String,
    ) -> Result<RunOutcome, PipelineError> {
        let Some(pair) = self.apply(token, |st| {
            st.phase = PipelinePhase::Processing(Stage::Translating);
            st.result_text = None;
            st.error_message = None;
            st.translated_pair = None;
            st.pair
        }) else {
            return Ok(superseded(token));
        };

        let request = TranslationRequest::new(text, pair);
        log::debug!(
            "pipeline[{token}]: Translating {} chars ({pair})",
            request.text.chars().count()
        );

        let result = match self.translator.translate(&request).await {
            Ok(result) => result,
            Err(e) => {
                return self.fail(
                    token,
                    PipelineError::TranslationFailed(e.to_string()),
                    Some(pair),
                )
            }
        };

        let published = self.apply(token, |st| {
            st.phase = PipelinePhase::Resolved(Resolution::Success);
            st.result_text = Some(result.target_text.clone());
            st.error_message = None;
            st.translated_pair = Some(pair);
        });
        if published.is_none() {
            return Ok(superseded(token));
        }

        log::debug!("pipeline[{token}]: Resolved");
        self.record_history(&request, result.target_text).await;
        Ok(RunOutcome::Resolved)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the state only if `token` is still the newest run.
    fn apply<R>(&self, token: Token, f: impl FnOnce(&mut AppState) -> R) -> Option<R> {
        let mut st = self.lock();
        if st.generation != token {
            return None;
        }
        Some(f(&mut st))
    }

    async fn read_clipboard(&self) -> Result<Option<ClipboardContent>, PipelineError> {
        let clipboard = Arc::clone(&self.clipboard);
        match tokio::task::spawn_blocking(move || clipboard.read()).await {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(PipelineError::Clipboard(e.to_string())),
            Err(e) => Err(PipelineError::Internal(e.to_string())),
        }
    }

    /// End a paste that found nothing to translate.
    ///
    /// The displayed texts stay as they are and the phase goes back to Idle,
    /// unless the existing source has not been translated with the current
    /// pair yet; then a new run translates it.
    async fn abandon(
        &self,
        token: Token,
        error: PipelineError,
    ) -> Result<RunOutcome, PipelineError> {
        let pending = {
            let mut st = self.lock();
            if st.generation != token {
                None
            } else if !st.source_text.is_empty() && st.translated_pair != Some(st.pair) {
                st.generation += 1;
                Some(Some((st.generation, st.source_text.clone())))
            } else {
                st.phase = PipelinePhase::Idle;
                Some(None)
            }
        };

        match pending {
            None => Ok(superseded(token)),
            Some(None) => {
                log::warn!("pipeline[{token}]: {error}");
                Err(error)
            }
            Some(Some((retry, text))) => {
                log::warn!("pipeline[{token}]: {error}; translating the current source instead");
                self.translate_source(retry, text).await
            }
        }
    }

    /// End a run with an error shown in place of the result.  `attempted` is
    /// the pair a failed translation used.
    fn fail(
        &self,
        token: Token,
        error: PipelineError,
        attempted: Option<LanguagePair>,
    ) -> Result<RunOutcome, PipelineError> {
        let message = error.to_string();
        let shown = self.apply(token, |st| {
            st.phase = PipelinePhase::Resolved(Resolution::Error);
            st.result_text = None;
            st.error_message = Some(message.clone());
            st.translated_pair = attempted;
        });
        if shown.is_none() {
            return Ok(superseded(token));
        }
        log::error!("pipeline[{token}] error: {message}");
        Err(error)
    }

    /// Append to the history file on the blocking pool.
    async fn record_history(&self, request: &TranslationRequest, target_text: String) {
        let Some(history) = &self.history else {
            return;
        };
        let history = Arc::clone(history);
        let item = HistoryItem::new(request.pair, request.text.clone(), target_text);
        match tokio::task::spawn_blocking(move || history.append(item)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("pipeline: could not record history: {e}"),
            Err(e) => log::warn!("pipeline: history task failed: {e}"),
        }
    }
}

fn superseded(token: Token) -> RunOutcome {
    log::warn!("pipeline[{token}]: superseded by a newer run, result discarded");
    RunOutcome::Superseded
}

/// Errors were already logged by the run that produced them.
fn log_outcome(outcome: Result<RunOutcome, PipelineError>) {
    if let Ok(outcome) = outcome {
        log::debug!("pipeline: run finished ({outcome:?})");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::clipboard::{ClipboardError, ClipboardImage};
    use crate::language::LanguageCode;
    use crate::ocr::RecognitionError;
    use crate::pipeline::state::new_shared_state;
    use crate::translate::{TranslationError, TranslationResult};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Hands out queued clipboard contents, one per read; empty once drained.
    #[derive(Default)]
    struct ScriptedClipboard {
        queue: Mutex<VecDeque<Result<Option<ClipboardContent>, ClipboardError>>>,
        reads: AtomicUsize,
    }

    impl ScriptedClipboard {
        fn with(items: Vec<Option<ClipboardContent>>) -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(items.into_iter().map(Ok).collect()),
                reads: AtomicUsize::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(VecDeque::from([Err(ClipboardError::Access(
                    message.into(),
                ))])),
                reads: AtomicUsize::new(0),
            })
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl ClipboardReader for ScriptedClipboard {
        fn read(&self) -> Result<Option<ClipboardContent>, ClipboardError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.queue.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    /// Blocks every read until the test sends the content for it.
    ///
    /// Each read announces itself on `entered` first.  Dropping the reply
    /// sender makes pending and later reads return an empty clipboard.
    struct GatedClipboard {
        replies: Mutex<std::sync::mpsc::Receiver<Option<ClipboardContent>>>,
        entered: mpsc::UnboundedSender<()>,
    }

    impl GatedClipboard {
        fn new() -> (
            std::sync::mpsc::Sender<Option<ClipboardContent>>,
            Arc<Self>,
            mpsc::UnboundedReceiver<()>,
        ) {
            let (reply_tx, reply_rx) = std::sync::mpsc::channel();
            let (entered_tx, entered_rx) = mpsc::unbounded_channel();
            let clipboard = Arc::new(Self {
                replies: Mutex::new(reply_rx),
                entered: entered_tx,
            });
            (reply_tx, clipboard, entered_rx)
        }
    }

    impl ClipboardReader for GatedClipboard {
        fn read(&self) -> Result<Option<ClipboardContent>, ClipboardError> {
            let _ = self.entered.send(());
            Ok(self.replies.lock().unwrap().recv().unwrap_or(None))
        }
    }

    /// Returns fixed fragments, or fails.  A gated stub signals `entered` and
    /// waits for `release` before answering.
    #[derive(Default)]
    struct StubOcr {
        fragments: Option<Vec<String>>,
        calls: AtomicUsize,
        gated: bool,
        entered: Notify,
        release: Notify,
    }

    impl StubOcr {
        fn ok(fragments: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                fragments: Some(fragments.iter().map(|s| s.to_string()).collect()),
                ..Self::default()
            })
        }

        fn gated(fragments: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                fragments: Some(fragments.iter().map(|s| s.to_string()).collect()),
                gated: true,
                ..Self::default()
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextRecognizer for StubOcr {
        async fn recognize(
            &self,
            _image: &ClipboardImage,
        ) -> Result<Vec<String>, RecognitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.fragments
                .clone()
                .ok_or_else(|| RecognitionError::Request("vision model offline".into()))
        }
    }

    /// Records every request; answers `"<target>:<text>"`.
    ///
    /// A request whose text equals `gate` blocks until `release` is notified,
    /// after signalling `entered`.
    #[derive(Default)]
    struct RecordingTranslator {
        requests: Mutex<Vec<TranslationRequest>>,
        fail: bool,
        gate: Option<String>,
        entered: Notify,
        release: Notify,
    }

    impl RecordingTranslator {
        fn ok() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                ..Self::default()
            })
        }

        fn gated(text: &str) -> Arc<Self> {
            Arc::new(Self {
                gate: Some(text.into()),
                ..Self::default()
            })
        }

        fn requests(&self) -> Vec<TranslationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Translator for RecordingTranslator {
        async fn translate(
            &self,
            request: &TranslationRequest,
        ) -> Result<TranslationResult, TranslationError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.gate.as_deref() == Some(request.text.as_str()) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.fail {
                return Err(TranslationError::Timeout);
            }
            Ok(TranslationResult {
                target_text: format!("{}:{}", request.pair.target, request.text),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn text(t: &str) -> Option<ClipboardContent> {
        Some(ClipboardContent::Text(t.into()))
    }

    fn image() -> Option<ClipboardContent> {
        Some(ClipboardContent::Image(ClipboardImage {
            width: 2,
            height: 1,
            rgba: vec![0; 8],
        }))
    }

    fn en_ko() -> LanguagePair {
        LanguagePair::new(LanguageCode::En, LanguageCode::Ko)
    }

    fn ko_en() -> LanguagePair {
        LanguagePair::new(LanguageCode::Ko, LanguageCode::En)
    }

    fn controller(
        pair: LanguagePair,
        clipboard: Arc<dyn ClipboardReader>,
        ocr: Arc<StubOcr>,
        translator: Arc<RecordingTranslator>,
    ) -> (PipelineController, SharedState) {
        let state = new_shared_state(pair);
        let controller = PipelineController::new(Arc::clone(&state), clipboard, ocr, translator);
        (controller, state)
    }

    // -----------------------------------------------------------------------
    // Paste
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn text_paste_translates_once_without_ocr() {
        let clipboard = ScriptedClipboard::with(vec![text("Hello world")]);
        let ocr = StubOcr::ok(&["unused"]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(en_ko(), clipboard, ocr.clone(), translator.clone());

        assert_eq!(ctl.handle_paste().await, Ok(RunOutcome::Resolved));

        assert_eq!(ocr.calls(), 0);
        assert_eq!(
            translator.requests(),
            vec![TranslationRequest::new("Hello world", en_ko())]
        );
        let st = state.lock().unwrap();
        assert_eq!(st.phase, PipelinePhase::Resolved(Resolution::Success));
        assert_eq!(st.source_text, "Hello world");
        assert_eq!(st.source_kind, SourceKind::Text);
        assert_eq!(st.result_text.as_deref(), Some("ko:Hello world"));
        assert!(st.error_message.is_none());
    }

    #[tokio::test]
    async fn image_paste_joins_fragments_with_newlines() {
        let clipboard = ScriptedClipboard::with(vec![image()]);
        let ocr = StubOcr::ok(&["안녕", "세상"]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(ko_en(), clipboard, ocr.clone(), translator.clone());

        assert_eq!(ctl.handle_paste().await, Ok(RunOutcome::Resolved));

        assert_eq!(ocr.calls(), 1);
        assert_eq!(
            translator.requests(),
            vec![TranslationRequest::new("안녕\n세상", ko_en())]
        );
        let st = state.lock().unwrap();
        assert_eq!(st.source_text, "안녕\n세상");
        assert_eq!(
            st.source_kind,
            SourceKind::Image {
                width: 2,
                height: 1
            }
        );
        assert_eq!(st.result_text.as_deref(), Some("en:안녕\n세상"));
    }

    #[tokio::test]
    async fn empty_clipboard_leaves_texts_untouched() {
        let clipboard = ScriptedClipboard::with(vec![text("first"), None]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        ctl.handle_paste().await.unwrap();
        assert_eq!(
            ctl.handle_paste().await,
            Err(PipelineError::EmptyClipboard)
        );

        assert_eq!(translator.requests().len(), 1);
        let st = state.lock().unwrap();
        assert_eq!(st.phase, PipelinePhase::Idle);
        assert_eq!(st.source_text, "first");
        assert_eq!(st.result_text.as_deref(), Some("ko:first"));
        assert!(st.error_message.is_none());
    }

    #[tokio::test]
    async fn whitespace_text_counts_as_empty() {
        let clipboard = ScriptedClipboard::with(vec![text(" \n\t")]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        assert_eq!(
            ctl.handle_paste().await,
            Err(PipelineError::EmptyClipboard)
        );
        assert!(translator.requests().is_empty());
        assert!(state.lock().unwrap().source_text.is_empty());
    }

    #[tokio::test]
    async fn clipboard_access_error_returns_to_idle() {
        let clipboard = ScriptedClipboard::failing("occupied");
        let (ctl, state) = controller(
            en_ko(),
            clipboard,
            StubOcr::ok(&[]),
            RecordingTranslator::ok(),
        );

        let err = ctl.handle_paste().await.unwrap_err();
        assert!(matches!(err, PipelineError::Clipboard(_)));
        assert_eq!(state.lock().unwrap().phase, PipelinePhase::Idle);
    }

    #[tokio::test]
    async fn no_fragments_is_reported_without_translation() {
        let clipboard = ScriptedClipboard::with(vec![image()]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        assert_eq!(
            ctl.handle_paste().await,
            Err(PipelineError::NoTextRecognized)
        );

        assert!(translator.requests().is_empty());
        let st = state.lock().unwrap();
        assert_eq!(st.phase, PipelinePhase::Resolved(Resolution::Error));
        assert_eq!(
            st.error_message.as_deref(),
            Some("No text was recognized in the image")
        );
        assert!(st.result_text.is_none());
    }

    #[tokio::test]
    async fn recognition_failure_sets_error() {
        let clipboard = ScriptedClipboard::with(vec![image()]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::failing(), translator.clone());

        let err = ctl.handle_paste().await.unwrap_err();
        assert!(matches!(err, PipelineError::RecognitionFailed(_)));
        assert!(translator.requests().is_empty());

        let st = state.lock().unwrap();
        assert_eq!(st.phase, PipelinePhase::Resolved(Resolution::Error));
        assert!(st
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("vision model offline")));
    }

    #[tokio::test]
    async fn translation_failure_clears_stale_result() {
        let clipboard = ScriptedClipboard::with(vec![text("one")]);
        let (ctl, state) = controller(
            en_ko(),
            clipboard,
            StubOcr::ok(&[]),
            RecordingTranslator::ok(),
        );
        ctl.handle_paste().await.unwrap();
        assert!(state.lock().unwrap().result_text.is_some());

        // Swap in a failing translator sharing the same state.
        let failing = PipelineController::new(
            Arc::clone(&state),
            ScriptedClipboard::with(vec![text("two")]),
            StubOcr::ok(&[]),
            RecordingTranslator::failing(),
        );
        let err = failing.handle_paste().await.unwrap_err();
        assert!(matches!(err, PipelineError::TranslationFailed(_)));

        let st = state.lock().unwrap();
        assert_eq!(st.phase, PipelinePhase::Resolved(Resolution::Error));
        assert!(st.result_text.is_none());
        assert_eq!(
            st.error_message.as_deref(),
            Some("Translation error: translation request timed out")
        );
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let state = new_shared_state(en_ko());
        let failing = PipelineController::new(
            Arc::clone(&state),
            ScriptedClipboard::with(vec![text("x")]),
            StubOcr::ok(&[]),
            RecordingTranslator::failing(),
        );
        failing.handle_paste().await.unwrap_err();
        assert!(state.lock().unwrap().error_message.is_some());

        let working = PipelineController::new(
            Arc::clone(&state),
            ScriptedClipboard::with(vec![text("y")]),
            StubOcr::ok(&[]),
            RecordingTranslator::ok(),
        );
        working.handle_paste().await.unwrap();

        let st = state.lock().unwrap();
        assert!(st.error_message.is_none());
        assert_eq!(st.result_text.as_deref(), Some("ko:y"));
    }

    // -----------------------------------------------------------------------
    // Language pair
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn pair_change_retranslates_existing_source() {
        let clipboard = ScriptedClipboard::with(vec![image()]);
        let ocr = StubOcr::ok(&["line"]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) =
            controller(en_ko(), clipboard.clone(), ocr.clone(), translator.clone());
        ctl.handle_paste().await.unwrap();

        let en_ja = LanguagePair::new(LanguageCode::En, LanguageCode::Ja);
        assert_eq!(
            ctl.on_language_pair_changed(en_ja).await,
            Ok(RunOutcome::Resolved)
        );

        assert_eq!(clipboard.reads(), 1);
        assert_eq!(ocr.calls(), 1);
        assert_eq!(
            translator.requests(),
            vec![
                TranslationRequest::new("line", en_ko()),
                TranslationRequest::new("line", en_ja),
            ]
        );
        let st = state.lock().unwrap();
        assert_eq!(st.pair, en_ja);
        assert_eq!(st.result_text.as_deref(), Some("ja:line"));
    }

    #[tokio::test]
    async fn same_pair_is_a_no_op() {
        let translator = RecordingTranslator::ok();
        let (ctl, _state) = controller(
            en_ko(),
            ScriptedClipboard::with(vec![text("hi")]),
            StubOcr::ok(&[]),
            translator.clone(),
        );
        ctl.handle_paste().await.unwrap();

        assert_eq!(
            ctl.on_language_pair_changed(en_ko()).await,
            Ok(RunOutcome::Unchanged)
        );
        assert_eq!(translator.requests().len(), 1);
    }

    #[tokio::test]
    async fn pair_change_without_source_only_stores_pair() {
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(
            en_ko(),
            ScriptedClipboard::with(vec![]),
            StubOcr::ok(&[]),
            translator.clone(),
        );

        assert_eq!(
            ctl.on_language_pair_changed(ko_en()).await,
            Ok(RunOutcome::Unchanged)
        );
        assert!(translator.requests().is_empty());
        assert_eq!(state.lock().unwrap().pair, ko_en());
    }

    #[tokio::test]
    async fn swap_languages_reverses_pair() {
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(
            en_ko(),
            ScriptedClipboard::with(vec![text("hi")]),
            StubOcr::ok(&[]),
            translator.clone(),
        );
        ctl.handle_paste().await.unwrap();
        ctl.swap_languages().await.unwrap();

        assert_eq!(state.lock().unwrap().pair, ko_en());
        assert_eq!(translator.requests()[1], TranslationRequest::new("hi", ko_en()));
    }

    // -----------------------------------------------------------------------
    // Supersession
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn newer_paste_wins_over_slow_translation() {
        let clipboard = ScriptedClipboard::with(vec![text("A"), text("B")]);
        let translator = RecordingTranslator::gated("A");
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        let run_a = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.handle_paste().await })
        };
        translator.entered.notified().await;

        assert_eq!(ctl.handle_paste().await, Ok(RunOutcome::Resolved));
        translator.release.notify_one();

        assert_eq!(run_a.await.unwrap(), Ok(RunOutcome::Superseded));
        let st = state.lock().unwrap();
        assert_eq!(st.source_text, "B");
        assert_eq!(st.result_text.as_deref(), Some("ko:B"));
        assert_eq!(st.phase, PipelinePhase::Resolved(Resolution::Success));
    }

    #[tokio::test]
    async fn pair_change_supersedes_in_flight_translation() {
        let clipboard = ScriptedClipboard::with(vec![text("slow")]);
        let translator = RecordingTranslator::gated("slow");
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        let run = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.handle_paste().await })
        };
        translator.entered.notified().await;

        // The retranslation is gated on the same text; release both.
        let change = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.on_language_pair_changed(ko_en()).await })
        };
        translator.entered.notified().await;
        translator.release.notify_one();
        translator.release.notify_one();

        let outcomes = [run.await.unwrap(), change.await.unwrap()];
        assert!(outcomes.contains(&Ok(RunOutcome::Superseded)));
        assert!(outcomes.contains(&Ok(RunOutcome::Resolved)));
        assert_eq!(
            state.lock().unwrap().result_text.as_deref(),
            Some("en:slow")
        );
    }

    #[tokio::test]
    async fn history_records_successful_runs_only() {
        let dir = tempfile::tempdir().unwrap();
        let history = Arc::new(HistoryStore::open(dir.path().join("history.json"), 0).unwrap());

        let state = new_shared_state(en_ko());
        let ok = PipelineController::new(
            Arc::clone(&state),
            ScriptedClipboard::with(vec![text("Hello")]),
            StubOcr::ok(&[]),
            RecordingTranslator::ok(),
        )
        .with_history(Arc::clone(&history));
        ok.handle_paste().await.unwrap();

        let failing = PipelineController::new(
            Arc::clone(&state),
            ScriptedClipboard::with(vec![text("Oops")]),
            StubOcr::ok(&[]),
            RecordingTranslator::failing(),
        )
        .with_history(Arc::clone(&history));
        failing.handle_paste().await.unwrap_err();

        let items = history.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_text, "Hello");
        assert_eq!(items[0].target_text, "ko:Hello");
        assert_eq!(items[0].pair(), en_ko());
    }

    // -----------------------------------------------------------------------
    // Pair changes during a paste
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn pair_change_while_recognizing_is_used_for_translation() {
        let ja_en = LanguagePair::new(LanguageCode::Ja, LanguageCode::En);
        let ocr = StubOcr::gated(&["こんにちは"]);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(
            ko_en(),
            ScriptedClipboard::with(vec![image()]),
            ocr.clone(),
            translator.clone(),
        );

        let paste = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.handle_paste().await })
        };
        ocr.entered.notified().await;
        assert_eq!(
            state.lock().unwrap().phase,
            PipelinePhase::Processing(Stage::Recognizing)
        );

        assert_eq!(
            ctl.on_language_pair_changed(ja_en).await,
            Ok(RunOutcome::Unchanged)
        );
        ocr.release.notify_one();

        assert_eq!(paste.await.unwrap(), Ok(RunOutcome::Resolved));
        assert_eq!(
            translator.requests(),
            vec![TranslationRequest::new("こんにちは", ja_en)]
        );
        assert_eq!(
            state.lock().unwrap().result_text.as_deref(),
            Some("en:こんにちは")
        );
    }

    #[tokio::test]
    async fn pair_change_while_reading_is_used_for_pasted_text() {
        let (reply_tx, clipboard, mut entered) = GatedClipboard::new();
        let translator = RecordingTranslator::ok();
        let (ctl, _state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        let paste = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.handle_paste().await })
        };
        entered.recv().await.unwrap();

        ctl.on_language_pair_changed(ko_en()).await.unwrap();
        reply_tx.send(text("새 텍스트")).unwrap();

        assert_eq!(paste.await.unwrap(), Ok(RunOutcome::Resolved));
        assert_eq!(
            translator.requests(),
            vec![TranslationRequest::new("새 텍스트", ko_en())]
        );
    }

    #[tokio::test]
    async fn pair_change_while_reading_empty_clipboard_retranslates_source() {
        let en_ja = LanguagePair::new(LanguageCode::En, LanguageCode::Ja);
        let (reply_tx, clipboard, mut entered) = GatedClipboard::new();
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        reply_tx.send(text("first")).unwrap();
        assert_eq!(ctl.handle_paste().await, Ok(RunOutcome::Resolved));
        entered.recv().await.unwrap();

        let paste = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.handle_paste().await })
        };
        entered.recv().await.unwrap();
        assert_eq!(
            state.lock().unwrap().phase,
            PipelinePhase::Processing(Stage::Reading)
        );

        assert_eq!(
            ctl.on_language_pair_changed(en_ja).await,
            Ok(RunOutcome::Unchanged)
        );
        reply_tx.send(None).unwrap();

        assert_eq!(paste.await.unwrap(), Ok(RunOutcome::Resolved));
        assert_eq!(
            translator.requests(),
            vec![
                TranslationRequest::new("first", en_ko()),
                TranslationRequest::new("first", en_ja),
            ]
        );
        let st = state.lock().unwrap();
        assert_eq!(st.pair, en_ja);
        assert_eq!(st.source_text, "first");
        assert_eq!(st.result_text.as_deref(), Some("ja:first"));
        assert_eq!(st.phase, PipelinePhase::Resolved(Resolution::Success));
        assert_eq!(st.translated_pair, Some(en_ja));
    }

    #[tokio::test]
    async fn empty_paste_over_pending_translation_translates_again() {
        let clipboard = ScriptedClipboard::with(vec![text("hi"), None]);
        let translator = RecordingTranslator::gated("hi");
        let (ctl, state) = controller(en_ko(), clipboard, StubOcr::ok(&[]), translator.clone());

        let first = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.handle_paste().await })
        };
        translator.entered.notified().await;

        // The empty paste cuts off the translation of "hi", so it is issued again.
        let second = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.handle_paste().await })
        };
        translator.entered.notified().await;
        translator.release.notify_one();
        translator.release.notify_one();

        assert_eq!(first.await.unwrap(), Ok(RunOutcome::Superseded));
        assert_eq!(second.await.unwrap(), Ok(RunOutcome::Resolved));
        assert_eq!(translator.requests().len(), 2);
        assert_eq!(state.lock().unwrap().result_text.as_deref(), Some("ko:hi"));
    }

    #[tokio::test]
    async fn empty_paste_after_failed_translation_does_not_retry() {
        let translator = RecordingTranslator::failing();
        let (ctl, state) = controller(
            en_ko(),
            ScriptedClipboard::with(vec![text("hi"), None]),
            StubOcr::ok(&[]),
            translator.clone(),
        );

        ctl.handle_paste().await.unwrap_err();
        assert_eq!(
            ctl.handle_paste().await,
            Err(PipelineError::EmptyClipboard)
        );
        assert_eq!(translator.requests().len(), 1);
        assert_eq!(state.lock().unwrap().phase, PipelinePhase::Idle);
    }

    // -----------------------------------------------------------------------
    // Command loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_returns_when_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        let (ctl, state) = controller(
            en_ko(),
            ScriptedClipboard::with(vec![]),
            StubOcr::ok(&[]),
            RecordingTranslator::ok(),
        );

        tx.send(PipelineCommand::SetLanguagePair(ko_en())).await.unwrap();
        tx.send(PipelineCommand::SwapLanguages).await.unwrap();
        drop(tx);
        ctl.run(rx).await;

        // Pair updates are applied synchronously in arrival order.
        assert_eq!(state.lock().unwrap().pair, en_ko());
    }

    #[tokio::test]
    async fn run_processes_paste_commands() {
        let (tx, rx) = mpsc::channel(4);
        let translator = RecordingTranslator::ok();
        let (ctl, state) = controller(
            en_ko(),
            ScriptedClipboard::with(vec![text("cmd")]),
            StubOcr::ok(&[]),
            translator.clone(),
        );
        let loop_handle = tokio::spawn(ctl.run(rx));

        tx.send(PipelineCommand::Paste).await.unwrap();
        for _ in 0..200 {
            if state.lock().unwrap().phase == PipelinePhase::Resolved(Resolution::Success) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        drop(tx);
        loop_handle.await.unwrap();

        assert_eq!(
            state.lock().unwrap().result_text.as_deref(),
            Some("ko:cmd")
        );
        assert_eq!(translator.requests().len(), 1);
    }
}
