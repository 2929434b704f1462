//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::language::{LanguageCode, LanguagePair};

// ---------------------------------------------------------------------------
// LanguageConfig
// ---------------------------------------------------------------------------

/// The language pair selected when the app starts.
///
/// Updated from the UI selection on exit so the next launch resumes with the
/// same direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguageConfig {
    pub fn pair(&self) -> LanguagePair {
        LanguagePair::new(self.source, self.target)
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        let pair = LanguagePair::default();
        Self {
            source: pair.source,
            target: pair.target,
        }
    }
}

impl From<LanguagePair> for LanguageConfig {
    fn from(pair: LanguagePair) -> Self {
        Self {
            source: pair.source,
            target: pair.target,
        }
    }
}

// ---------------------------------------------------------------------------
// TranslatorConfig
// ---------------------------------------------------------------------------

/// Settings for the translation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Base URL of an OpenAI-compatible API.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key: `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"qwen2.5:3b"`, `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a translation before timing out.
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            temperature: 0.2,
            timeout_secs: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// OcrConfig
// ---------------------------------------------------------------------------

/// Settings for text recognition on pasted images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// When `false`, pasting an image reports a recognition error instead of
    /// calling the vision model.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API that accepts image input.
    pub base_url: String,
    pub api_key: Option<String>,
    /// Vision-capable model (e.g. `"llava:7b"`, `"gpt-4o-mini"`).
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "llava:7b".into(),
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global paste shortcut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Modifier held with the key: `"Meta"`, `"Ctrl"`, `"Alt"` or `"Shift"`.
    pub modifier: String,
    /// Key name (e.g. `"V"`, `"F9"`).
    pub paste_key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        let modifier = if cfg!(target_os = "macos") { "Meta" } else { "Ctrl" };
        Self {
            modifier: modifier.into(),
            paste_key: "V".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
    /// Initial inner size `(width, height)` in logical pixels.
    pub window_size: (f32, f32),
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            always_on_top: false,
            window_size: (420.0, 560.0),
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Translation history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Record every successful translation to `history.json`.
    pub enabled: bool,
    /// Oldest records are dropped beyond this count.  `0` keeps everything.
    pub max_items: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_items: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use paste_translator::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language pair selected at startup.
    pub languages: LanguageConfig,
    /// Translation backend settings.
    pub translator: TranslatorConfig,
    /// Image text recognition settings.
    pub ocr: OcrConfig,
    /// Global paste shortcut.
    pub hotkey: HotkeyConfig,
    /// Window settings.
    pub ui: UiConfig,
    /// Translation history settings.
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
