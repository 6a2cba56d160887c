//! Text-to-speech collaborator client

use crate::config::TtsConfig;
use crate::{Error, Result};

/// Synthesizes spoken answers from text
///
/// Talks to any OpenAI-compatible `audio/speech` endpoint and returns MP3
/// bytes.
#[derive(Debug, Clone)]
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    model: String,
    voice: String,
    speed: f64,
    api_key: Option<String>,
}

impl TextToSpeech {
    /// Create a synthesis client from configuration
    #[must_use]
    pub fn new(config: &TtsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            voice: config.voice.clone(),
            speed: config.speed,
            api_key: config.api_key.clone(),
        }
    }

    /// Synthesize text to speech
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] on any backend or transport fault.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request_body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let mut request = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("backend error {status}: {body}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(format!("cannot read audio body: {e}")))?;

        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}
