//! Paste Translator window: egui/eframe application.
//!
//! The window is a thin view over [`SharedState`].  It never mutates the
//! state itself; every user action becomes a [`PipelineCommand`] sent to the
//! [`PipelineController`](crate::pipeline::PipelineController).
//!
//! # Layout
//!
//! | Area | Contents |
//! |------|----------|
//! | Top bar | source picker, swap button, target picker, Paste button |
//! | Source | pasted text, or image size plus the recognized text |
//! | Result | translation with a Copy button, or the error message |
//! | Status | phase label ("Translating...", "Done", ...) |
//! | History | collapsible list of past translations (when enabled) |

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::history::HistoryStore;
use crate::language::{LanguageCode, LanguagePair};
use crate::pipeline::{
    AppState, PipelineCommand, PipelinePhase, Resolution, SharedState, SourceKind,
};

// ---------------------------------------------------------------------------
// Frame snapshot
// ---------------------------------------------------------------------------

/// Copy of the fields one frame needs, taken under a single short lock.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    phase: PipelinePhase,
    source_text: String,
    source_kind: SourceKind,
    result_text: Option<String>,
    error_message: Option<String>,
    pair: LanguagePair,
}

impl Snapshot {
    fn of(state: &AppState) -> Self {
        Self {
            phase: state.phase,
            source_text: state.source_text.clone(),
            source_kind: state.source_kind,
            result_text: state.result_text.clone(),
            error_message: state.error_message.clone(),
            pair: state.pair,
        }
    }

    /// Status line text: the error when there is one, else the phase label.
    fn status(&self) -> String {
        match (&self.error_message, self.phase) {
            (Some(message), PipelinePhase::Resolved(Resolution::Error)) => message.clone(),
            _ => self.phase.label().to_string(),
        }
    }

    fn source_caption(&self) -> String {
        match self.source_kind {
            SourceKind::Text => "Text".to_string(),
            SourceKind::Image { width, height } => format!("Image {width}×{height}"),
        }
    }
}

// ---------------------------------------------------------------------------
// PasteTranslatorApp
// ---------------------------------------------------------------------------

/// eframe application: the Paste Translator window.
pub struct PasteTranslatorApp {
    state: SharedState,
    command_tx: mpsc::Sender<PipelineCommand>,
    history: Option<Arc<HistoryStore>>,
}

impl PasteTranslatorApp {
    /// Create the window.
    ///
    /// * `state`: shared pipeline state, read each frame.
    /// * `command_tx`: sender end of the pipeline command channel.
    /// * `history`: history store, `None` when history is disabled.
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<PipelineCommand>,
        history: Option<Arc<HistoryStore>>,
    ) -> Self {
        Self {
            state,
            command_tx,
            history,
        }
    }

    fn snapshot(&self) -> Snapshot {
        let st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Snapshot::of(&st)
    }

    fn send(&self, command: PipelineCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: could not send pipeline command: {e}");
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    /// Returns the Paste button's response.
    fn draw_top_bar(&self, ui: &mut egui::Ui, view: &Snapshot) -> egui::Response {
        ui.horizontal(|ui| {
            let mut source = view.pair.source;
            let mut target = view.pair.target;

            language_picker(ui, "source-language", &mut source);
            if ui
                .button("⇄")
                .on_hover_text("Swap languages")
                .clicked()
            {
                self.send(PipelineCommand::SwapLanguages);
            }
            language_picker(ui, "target-language", &mut target);

            let picked = LanguagePair::new(source, target);
            if picked != view.pair {
                self.send(PipelineCommand::SetLanguagePair(picked));
            }

            // Stays enabled while busy: a new paste replaces a slow run.
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let paste = ui.button("Paste");
                if paste.clicked() {
                    self.send(PipelineCommand::Paste);
                }
                paste
            })
            .inner
        })
        .inner
    }

    fn draw_source(&self, ui: &mut egui::Ui, view: &Snapshot) {
        ui.label(
            egui::RichText::new(format!(
                "{} · {}",
                view.pair.source.display_name(),
                view.source_caption()
            ))
            .size(12.0)
            .color(egui::Color32::GRAY),
        );

        let mut text = view.source_text.as_str();
        ui.add(
            egui::TextEdit::multiline(&mut text)
                .hint_text("Copy text or an image, then press Paste")
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );
    }

    fn draw_result(&self, ui: &mut egui::Ui, ctx: &egui::Context, view: &Snapshot) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(view.pair.target.display_name())
                    .size(12.0)
                    .color(egui::Color32::GRAY),
            );
            if let Some(result) = &view.result_text {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Copy").clicked() {
                        ctx.copy_text(result.clone());
                    }
                });
            }
        });

        let mut text = view.result_text.as_deref().unwrap_or_default();
        ui.add(
            egui::TextEdit::multiline(&mut text)
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );
    }

    fn draw_status(&self, ui: &mut egui::Ui, view: &Snapshot) {
        ui.horizontal(|ui| {
            if view.phase.is_busy() {
                ui.spinner();
            }
            ui.label(
                egui::RichText::new(view.status())
                    .size(12.0)
                    .color(status_color(view.phase)),
            );
        });
    }

    fn draw_history(&self, ui: &mut egui::Ui) {
        let Some(history) = self.history.clone() else {
            return;
        };
        let items = history.items();

        egui::CollapsingHeader::new(format!("History ({})", items.len()))
            .id_salt("history")
            .default_open(false)
            .show(ui, |ui| {
                if !items.is_empty() && ui.small_button("Clear all").clicked() {
                    if let Err(e) = history.clear() {
                        log::warn!("ui: could not clear history: {e}");
                    }
                }

                egui::ScrollArea::vertical()
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for item in &items {
                            ui.separator();
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(format!(
                                        "{} · {}",
                                        item.pair(),
                                        item.timestamp.format("%Y-%m-%d %H:%M")
                                    ))
                                    .size(11.0)
                                    .color(egui::Color32::GRAY),
                                );
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.small_button("x").clicked() {
                                            if let Err(e) = history.delete(item.id) {
                                                log::warn!("ui: could not delete history item: {e}");
                                            }
                                        }
                                        if ui.small_button("Copy").clicked() {
                                            ui.ctx().copy_text(item.target_text.clone());
                                        }
                                    },
                                );
                            });
                            ui.label(item.source_text.as_str());
                            ui.label(egui::RichText::new(item.target_text.as_str()).strong());
                        }
                    });
            });
    }
}

fn language_picker(ui: &mut egui::Ui, id: &str, selected: &mut LanguageCode) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.display_name())
        .show_ui(ui, |ui| {
            for code in LanguageCode::ALL {
                ui.selectable_value(selected, code, code.display_name());
            }
        });
}

fn status_color(phase: PipelinePhase) -> egui::Color32 {
    match phase {
        PipelinePhase::Idle => egui::Color32::from_rgb(120, 120, 120),
        PipelinePhase::Processing(_) => egui::Color32::from_rgb(68, 136, 255),
        PipelinePhase::Resolved(Resolution::Success) => egui::Color32::from_rgb(80, 200, 120),
        PipelinePhase::Resolved(Resolution::Error) => egui::Color32::from_rgb(255, 136, 68),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for PasteTranslatorApp {
    /// Called every frame by eframe.  Snapshots the shared state, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let view = self.snapshot();

        // The pipeline writes from other threads; poll while a run is active
        // and slowly otherwise so hotkey pastes show up without input.
        if view.phase.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(66));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        egui::TopBottomPanel::top("languages").show(ctx, |ui| {
            ui.add_space(4.0);
            self.draw_top_bar(ui, &view);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.draw_status(ui, &view);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_source(ui, &view);
                ui.add_space(8.0);
                self.draw_result(ui, ctx, &view);
                ui.add_space(8.0);
                self.draw_history(ui);
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Paste Translator window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
