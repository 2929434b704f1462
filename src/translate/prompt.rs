//! Prompt builder for chat-model translation.
//!
//! [`PromptBuilder::build_chat`] returns a `(system_msg, user_msg)` tuple for
//! any OpenAI-compatible `/v1/chat/completions` endpoint.  The system message
//! names both languages explicitly; models are far less likely to answer in
//! the wrong language when the direction is spelled out in words rather than
//! ISO codes.

use crate::language::LanguagePair;

const SYSTEM_INSTRUCTION: &str = "\
You are a professional translator.
Task: Translate the user's text from {source} to {target}.

Rules:
1. Preserve the meaning, tone and formatting, including line breaks.
2. Keep proper nouns, numbers, URLs and code snippets unchanged.
3. Do not add notes, explanations, quotes or transliterations.
4. Reply with ONLY the {target} translation.";

/// Builds translation prompts for a fixed language pair.
///
/// # Example
/// ```rust
/// use paste_translator::language::{LanguageCode, LanguagePair};
/// use paste_translator::translate::PromptBuilder;
///
/// let builder = PromptBuilder::new(LanguagePair::new(LanguageCode::En, LanguageCode::Ko));
/// let (system, user) = builder.build_chat("Hello world");
/// assert!(system.contains("from English to Korean"));
/// assert_eq!(user, "Hello world");
/// ```
pub struct PromptBuilder {
    pair: LanguagePair,
}

impl PromptBuilder {
    pub fn new(pair: LanguagePair) -> Self {
        Self { pair }
    }

    /// Build `(system_msg, user_msg)` for the chat-completions API.
    ///
    /// The user message is the source text verbatim.
    pub fn build_chat(&self, text: &str) -> (String, String) {
        let system = SYSTEM_INSTRUCTION
            .replace("{source}", self.pair.source.display_name())
            .replace("{target}", self.pair.target.display_name());
        (system, text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageCode;

    #[test]
    fn names_both_languages() {
        let builder = PromptBuilder::new(LanguagePair::new(LanguageCode::Ja, LanguageCode::Fr));
        let (system, _) = builder.build_chat("こんにちは");
        assert!(system.contains("from Japanese to French"));
        assert!(system.contains("ONLY the French translation"));
        assert!(!system.contains('{'));
    }

    #[test]
    fn user_message_is_verbatim() {
        let builder = PromptBuilder::new(LanguagePair::default());
        let (_, user) = builder.build_chat("line one\nline two");
        assert_eq!(user, "line one\nline two");
    }
}
