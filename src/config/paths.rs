//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir (settings + history):
//!   Windows: %APPDATA%\paste-translator\
//!   macOS:   ~/Library/Application Support/paste-translator/
//!   Linux:   ~/.config/paste-translator/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and `history.json`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to `history.json`.
    pub history_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "paste-translator";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let history_file = config_dir.join("history.json");

        Self {
            config_dir,
            settings_file,
            history_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_config_dir() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.ends_with("paste-translator"));
        assert_eq!(paths.settings_file.parent(), Some(paths.config_dir.as_path()));
        assert!(paths
            .history_file
            .file_name()
            .is_some_and(|n| n == "history.json"));
    }
}
