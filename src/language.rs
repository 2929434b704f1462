//! Supported languages and the (source, target) pair a translation runs
//! against.
//!
//! [`LanguageCode`] is a closed set; configs and UI pickers only ever deal in
//! these values.  Codes serialise as their lowercase ISO-639-1 form so
//! `settings.toml` and `history.json` stay human-readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// LanguageCode
// ---------------------------------------------------------------------------

/// A language the translator can read from or write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Ko,
    Ja,
    Es,
    Fr,
    Zh,
}

/// Returned by [`LanguageCode::from_str`] for codes outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language code: {0:?}")]
pub struct UnknownLanguage(pub String);

impl LanguageCode {
    /// Every supported language, in picker order.
    pub const ALL: [LanguageCode; 6] = [
        LanguageCode::En,
        LanguageCode::Ko,
        LanguageCode::Ja,
        LanguageCode::Es,
        LanguageCode::Fr,
        LanguageCode::Zh,
    ];

    /// ISO-639-1 code, e.g. `"ko"`.
    pub fn code(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Ko => "ko",
            LanguageCode::Ja => "ja",
            LanguageCode::Es => "es",
            LanguageCode::Fr => "fr",
            LanguageCode::Zh => "zh",
        }
    }

    /// English name of the language, used in prompts and picker labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Ko => "Korean",
            LanguageCode::Ja => "Japanese",
            LanguageCode::Es => "Spanish",
            LanguageCode::Fr => "French",
            LanguageCode::Zh => "Chinese",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LanguageCode {
    type Err = UnknownLanguage;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        LanguageCode::ALL
            .into_iter()
            .find(|lang| lang.code() == needle)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// LanguagePair
// ---------------------------------------------------------------------------

/// The direction of a translation.
///
/// Pairs are plain values: changing the selection means building a new pair,
/// which is what lets the pipeline detect that an in-flight translation was
/// issued against a stale direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        Self { source, target }
    }

    /// The same pair with source and target exchanged.
    ///
    /// ```
    /// use paste_translator::language::{LanguageCode, LanguagePair};
    ///
    /// let pair = LanguagePair::new(LanguageCode::En, LanguageCode::Ko);
    /// assert_eq!(pair.swapped(), LanguagePair::new(LanguageCode::Ko, LanguageCode::En));
    /// ```
    pub fn swapped(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }

    /// `true` when no translation is needed.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new(LanguageCode::En, LanguageCode::Ko)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.source, self.target)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_code() {
        for lang in LanguageCode::ALL {
            assert_eq!(lang.code().parse::<LanguageCode>(), Ok(lang));
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(" KO ".parse::<LanguageCode>(), Ok(LanguageCode::Ko));
        assert_eq!("Zh".parse::<LanguageCode>(), Ok(LanguageCode::Zh));
    }

    #[test]
    fn parse_unknown_code_fails() {
        assert_eq!(
            "th".parse::<LanguageCode>(),
            Err(UnknownLanguage("th".into()))
        );
        assert!("".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn display_uses_iso_code() {
        assert_eq!(LanguageCode::Ja.to_string(), "ja");
        assert_eq!(LanguageCode::Ja.display_name(), "Japanese");
    }

    #[test]
    fn default_pair_is_english_to_korean() {
        let pair = LanguagePair::default();
        assert_eq!(pair.source, LanguageCode::En);
        assert_eq!(pair.target, LanguageCode::Ko);
        assert_eq!(pair.to_string(), "en → ko");
    }

    #[test]
    fn swapped_twice_is_original() {
        let pair = LanguagePair::new(LanguageCode::Fr, LanguageCode::Es);
        assert_eq!(pair.swapped().swapped(), pair);
        assert!(!pair.is_identity());
        assert!(LanguagePair::new(LanguageCode::En, LanguageCode::En).is_identity());
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        let json = serde_json::to_string(&LanguagePair::default()).unwrap();
        assert_eq!(json, r#"{"source":"en","target":"ko"}"#);
        let back: LanguagePair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LanguagePair::default());
    }
}
