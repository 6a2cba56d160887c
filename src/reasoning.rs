//! Vision-reasoning collaborator client
//!
//! Sends the transcribed question, with the paired camera frame when one is
//! available, to an Ollama-compatible generate endpoint.

use base64::Engine;
use serde::Serialize;

use crate::config::ReasoningConfig;
use crate::{Error, Result};

/// Request body for the generate endpoint
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    stream: bool,
}

/// Client for the multimodal reasoning backend
#[derive(Debug, Clone)]
pub struct ReasoningClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl ReasoningClient {
    /// Create a reasoning client from configuration
    #[must_use]
    pub fn new(config: &ReasoningConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    /// Ask the backend a question, optionally grounded in an image
    ///
    /// A reply carrying a textual `response` field succeeds; a reply carrying
    /// an `error` field is a backend-reported failure. Anything else is a
    /// protocol violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reasoning`] for backend-reported faults and
    /// [`Error::ReasoningProtocol`] for unrecognized reply shapes.
    pub async fn answer(&self, question: &str, image: Option<&[u8]>) -> Result<String> {
        let images = image.map(|bytes| {
            vec![base64::engine::general_purpose::STANDARD.encode(bytes)]
        });

        tracing::debug!(
            model = %self.model,
            with_image = images.is_some(),
            "starting reasoning call"
        );

        let request = GenerateRequest {
            model: &self.model,
            prompt: question,
            images,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Reasoning(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Reasoning(format!("cannot read response body: {e}")))?;
        tracing::debug!(status = %status, body = %body, "raw reasoning response");

        if !status.is_success() {
            // the error body may still carry a structured reason
            if let Some(message) = extract_error_field(&body) {
                return Err(Error::Reasoning(message));
            }
            return Err(Error::Reasoning(format!("backend error {status}: {body}")));
        }

        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|_| Error::ReasoningProtocol(format!("non-JSON reply: {body}")))?;

        if let Some(text) = payload.get("response").and_then(serde_json::Value::as_str) {
            tracing::info!(answer_chars = text.len(), "reasoning complete");
            return Ok(text.to_string());
        }

        if let Some(err) = payload.get("error") {
            let message = err
                .as_str()
                .map_or_else(|| err.to_string(), ToString::to_string);
            return Err(Error::Reasoning(message));
        }

        Err(Error::ReasoningProtocol(payload.to_string()))
    }
}

/// Pull a reported `error` field out of a reply body, if it parses as JSON
fn extract_error_field(body: &str) -> Option<String> {
    let payload: serde_json::Value = serde_json::from_str(body).ok()?;
    let err = payload.get("error")?;
    Some(
        err.as_str()
            .map_or_else(|| err.to_string(), ToString::to_string),
    )
}
