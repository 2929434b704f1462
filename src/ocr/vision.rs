//! Vision-model text recognizer.
//!
//! Sends the clipboard image as a base64 PNG data URL to an OpenAI-compatible
//! `/v1/chat/completions` endpoint and asks the model to transcribe every line
//! of text it can see.  Works with Ollama vision models (llava, qwen2.5-vl),
//! OpenAI `gpt-4o-mini`, and anything else that accepts `image_url` parts.

use async_trait::async_trait;
use base64::Engine as _;

use super::recognizer::{RecognitionError, TextRecognizer};
use crate::clipboard::ClipboardImage;
use crate::config::OcrConfig;

const INSTRUCTION: &str = "\
Transcribe all text visible in this image.
Output one line of text per line, in reading order from top to bottom.
Do not translate, describe, or comment on the image.
If there is no text, reply with nothing.";

/// OCR through a multimodal chat model.
pub struct VisionRecognizer {
    client: reqwest::Client,
    config: OcrConfig,
}

impl VisionRecognizer {
    pub fn from_config(config: &OcrConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn request_body(&self, png: &[u8]) -> serde_json::Value {
        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        );

        serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": INSTRUCTION },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ],
            "stream": false,
            "temperature": 0.0
        })
    }
}

#[async_trait]
impl TextRecognizer for VisionRecognizer {
    async fn recognize(&self, image: &ClipboardImage) -> Result<Vec<String>, RecognitionError> {
        let png = image
            .to_png()
            .map_err(|e| RecognitionError::Image(e.to_string()))?;
        log::debug!(
            "ocr: sending {}x{} image ({} PNG bytes)",
            image.width,
            image.height,
            png.len()
        );

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let mut req = self.client.post(url).json(&self.request_body(&png));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?.error_for_status()?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RecognitionError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| RecognitionError::Parse("missing choices[0].message.content".into()))?;

        Ok(split_fragments(content))
    }
}

/// One fragment per non-blank line, trimmed, order preserved.
pub fn split_fragments(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
