//! Application entry point: Paste Translator.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the clipboard reader, recognizer and translator from config.
//! 5. Open the translation history (when enabled).
//! 6. Spawn the [`PipelineController`] on the tokio runtime.
//! 7. Spawn the global paste-shortcut listener thread.
//! 8. Run [`eframe::run_native`]; blocks the main thread until the window
//!    is closed.
//! 9. Save the last selected language pair back to the config file.

use std::sync::{Arc, PoisonError};

use eframe::egui;
use tokio::sync::mpsc;

use paste_translator::{
    app::PasteTranslatorApp,
    clipboard::ArboardReader,
    config::{AppConfig, AppPaths},
    history::HistoryStore,
    hotkey::{HotkeyListener, PasteShortcut},
    ocr::recognizer_from_config,
    pipeline::{new_shared_state, PipelineCommand, PipelineController},
    translate::ApiTranslator,
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Paste Translator")
        .with_inner_size([width, height])
        .with_min_inner_size([320.0, 360.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

fn open_history(config: &AppConfig) -> Option<Arc<HistoryStore>> {
    if !config.history.enabled {
        return None;
    }

    let path = AppPaths::new().history_file;
    match HistoryStore::open(&path, config.history.max_items) {
        Ok(store) => {
            log::info!(
                "History loaded: {} item(s) from {}",
                store.len(),
                path.display()
            );
            Some(Arc::new(store))
        }
        Err(e) => {
            log::warn!(
                "Could not open history ({}): {e}. History is disabled for this session.",
                path.display()
            );
            None
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Paste Translator starting up");

    // 2. Configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads: OCR + translation each take one)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Backends
    let clipboard = Arc::new(ArboardReader::new());
    let recognizer = recognizer_from_config(&config.ocr);
    let translator = Arc::new(ApiTranslator::from_config(&config.translator));
    log::info!(
        "Translator: {} at {}",
        config.translator.model,
        config.translator.base_url
    );

    // 5. History
    let history = open_history(&config);

    // 6. Pipeline controller
    let state = new_shared_state(config.languages.pair());
    let mut controller =
        PipelineController::new(Arc::clone(&state), clipboard, recognizer, translator);
    if let Some(history) = &history {
        controller = controller.with_history(Arc::clone(history));
    }

    let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(16);
    rt.spawn(controller.run(command_rx));

    // 7. Paste shortcut listener thread
    let shortcut = PasteShortcut::parse(&config.hotkey.modifier, &config.hotkey.paste_key)
        .unwrap_or_else(|| {
            log::warn!(
                "Unknown paste shortcut {}+{}; using the platform default",
                config.hotkey.modifier,
                config.hotkey.paste_key
            );
            PasteShortcut::platform_default()
        });
    let _hotkey_listener = match HotkeyListener::start(shortcut, command_tx.clone()) {
        Ok(listener) => Some(listener),
        Err(e) => {
            log::warn!("Paste shortcut unavailable: {e}");
            None
        }
    };

    // 8. Build the egui app and run it (blocks until the window is closed)
    let app = PasteTranslatorApp::new(Arc::clone(&state), command_tx, history);
    let options = native_options(&config);

    let result = eframe::run_native(
        "Paste Translator",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    );

    // 9. Remember the last language pair
    let pair = state.lock().unwrap_or_else(PoisonError::into_inner).pair;
    if pair != config.languages.pair() {
        config.languages = pair.into();
        match config.save() {
            Ok(()) => log::info!("Saved language pair {pair}"),
            Err(e) => log::warn!("Could not save config: {e}"),
        }
    }

    result
}
