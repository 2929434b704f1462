//! Translation backends.
//!
//! * [`Translator`]: async trait implemented by all backends.
//! * [`ApiTranslator`]: OpenAI-compatible REST API translator.
//! * [`PromptBuilder`]: builds the chat messages for a language pair.
//! * [`TranslationError`]: error variants for translation calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use paste_translator::config::AppConfig;
//! use paste_translator::translate::{ApiTranslator, TranslationRequest, Translator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let translator = ApiTranslator::from_config(&config.translator);
//!
//!     let request = TranslationRequest::new("Hello world", config.languages.pair());
//!     let result = translator.translate(&request).await.unwrap();
//!     println!("{}", result.target_text);
//! }
//! ```

pub mod prompt;
pub mod translator;

pub use prompt::PromptBuilder;
pub use translator::{
    ApiTranslator, TranslationError, TranslationRequest, TranslationResult, Translator,
};
