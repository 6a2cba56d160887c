//! Speech-to-text collaborator client

use std::path::Path;

use crate::config::SttConfig;
use crate::{Error, Result};

/// Response from an OpenAI-compatible transcription endpoint
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes spoken queries to text
///
/// Talks to any OpenAI-compatible `audio/transcriptions` endpoint; by
/// default a local whisper server.
#[derive(Debug, Clone)]
pub struct SpeechToText {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl SpeechToText {
    /// Create a transcription client from configuration
    #[must_use]
    pub fn new(config: &SttConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Transcribe the spooled audio file to text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transcription`] on any backend or transport fault.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| Error::Transcription(format!("cannot read spooled audio: {e}")))?;

        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let mut request = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!(
                "backend error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Transcription(format!("cannot parse response: {e}")))?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
