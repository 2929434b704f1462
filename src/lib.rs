pub mod app;
pub mod clipboard;
pub mod config;
pub mod history;
pub mod hotkey;
pub mod language;
pub mod ocr;
pub mod pipeline;
pub mod translate;
