//! Translation history persisted as JSON.
//!
//! [`HistoryStore`] keeps every successful translation in
//! `history.json` in the platform config directory (see
//! [`AppPaths`](crate::config::AppPaths)).  Records are append-only; the only
//! other mutations are deleting one record by id and clearing everything.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::language::{LanguageCode, LanguagePair};

// ---------------------------------------------------------------------------
// HistoryError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot read or write history file: {0}")]
    Io(#[from] std::io::Error),

    #[error("history file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// HistoryItem
// ---------------------------------------------------------------------------

/// One completed translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    pub source_text: String,
    pub target_text: String,
}

impl HistoryItem {
    /// A new record stamped with the current time and a fresh id.
    pub fn new(pair: LanguagePair, source_text: String, target_text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source_language: pair.source,
            target_language: pair.target,
            source_text,
            target_text,
        }
    }

    pub fn pair(&self) -> LanguagePair {
        LanguagePair::new(self.source_language, self.target_language)
    }
}

// ---------------------------------------------------------------------------
// HistoryStore
// ---------------------------------------------------------------------------

/// Thread-safe, file-backed translation log.
///
/// Shared between the pipeline (which appends) and the UI (which lists and
/// deletes) behind an `Arc`.  Every mutation rewrites the file.
pub struct HistoryStore {
    items: Mutex<Vec<HistoryItem>>,
    path: PathBuf,
    /// `0` means unbounded.
    max_items: usize,
}

impl HistoryStore {
    /// Open the store at `path`.  A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed, so a corrupt
    /// history is never silently overwritten.
    pub fn open(path: impl Into<PathBuf>, max_items: usize) -> Result<Self, HistoryError> {
        let path = path.into();
        let items = Self::load_items(&path)?;
        Ok(Self {
            items: Mutex::new(items),
            path,
            max_items,
        })
    }

    fn load_items(path: &Path) -> Result<Vec<HistoryItem>, HistoryError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HistoryItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append `item`, dropping the oldest records beyond `max_items`, then
    /// persist.
    pub fn append(&self, item: HistoryItem) -> Result<(), HistoryError> {
        let mut items = self.lock();
        items.push(item);
        if self.max_items > 0 && items.len() > self.max_items {
            let excess = items.len() - self.max_items;
            items.drain(..excess);
        }
        self.save(&items)
    }

    /// Remove the record with `id`.  Returns `false` if no such record exists.
    pub fn delete(&self, id: Uuid) -> Result<bool, HistoryError> {
        let mut items = self.lock();
        let Some(index) = items.iter().position(|item| item.id == id) else {
            return Ok(false);
        };
        items.remove(index);
        self.save(&items)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        let mut items = self.lock();
        items.clear();
        self.save(&items)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of all records, newest first.
    pub fn items(&self) -> Vec<HistoryItem> {
        self.lock().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn save(&self, items: &[HistoryItem]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
