//! Durable log of completed translations.

pub mod store;

pub use store::{HistoryError, HistoryItem, HistoryStore};
