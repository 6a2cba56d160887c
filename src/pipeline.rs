//! Query orchestration pipeline
//!
//! Turns one inbound voice query into one spoken answer through a fixed
//! sequence: pair the query with the device's most recent frame, spool the
//! audio, transcribe, reason, synthesize. No stage is retried; every failure
//! is local to its request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::reasoning::ReasoningClient;
use crate::session::SessionRegistry;
use crate::speech::{SpeechToText, TextToSpeech};
use crate::storage::MediaStore;
use crate::{Error, Result};

/// Spoken preamble used when `notify_missing_frame` is set and no frame exists
const MISSING_FRAME_NOTICE: &str = "I don't have a current view from your camera.";

/// Collaborator-bound pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Speech-to-text on the spooled query audio
    Transcribe,
    /// Multimodal reasoning over the question and paired frame
    Reason,
    /// Text-to-speech on the answer
    Synthesize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transcribe => "transcribe",
            Self::Reason => "reason",
            Self::Synthesize => "synthesize",
        };
        f.write_str(name)
    }
}

/// Drives the transcribe → reason → synthesize sequence for one query
pub struct QueryPipeline {
    registry: Arc<SessionRegistry>,
    media: Arc<MediaStore>,
    stt: SpeechToText,
    reasoning: ReasoningClient,
    tts: TextToSpeech,
    stage_timeout: Duration,
    notify_missing_frame: bool,
}

impl QueryPipeline {
    /// Build a pipeline, constructing collaborator clients from configuration
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, media: Arc<MediaStore>, config: &Config) -> Self {
        Self {
            registry,
            media,
            stt: SpeechToText::new(&config.stt),
            reasoning: ReasoningClient::new(&config.reasoning),
            tts: TextToSpeech::new(&config.tts),
            stage_timeout: Duration::from_secs(config.stage_timeout_secs),
            notify_missing_frame: config.notify_missing_frame,
        }
    }

    /// Answer one voice query for a device
    ///
    /// The frame snapshot is taken before any collaborator call and pinned
    /// for the whole pipeline: a frame ingested while reasoning is in flight
    /// is never silently substituted, and eviction cannot delete the pinned
    /// file while this query still reads it. A device with no frames is
    /// answered from audio alone.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's error; see [`crate::Error`].
    pub async fn answer(&self, device_id: &str, audio: &[u8]) -> Result<Vec<u8>> {
        let query_id = uuid::Uuid::new_v4();

        let session = self.registry.get_or_create(device_id).await;
        let frame = session.latest_frame();
        match &frame {
            Some(record) => tracing::debug!(
                %query_id,
                device = %device_id,
                frame_ts = record.timestamp,
                "paired query with latest frame"
            ),
            None => tracing::debug!(
                %query_id,
                device = %device_id,
                "no frame available, proceeding audio-only"
            ),
        }

        // Spooled for the duration of the pipeline; removed on drop either way
        let scratch = self.media.spool_audio(audio)?;

        let question = self
            .bounded(Stage::Transcribe, self.stt.transcribe(scratch.path()))
            .await?;

        let image = match &frame {
            Some(record) => Some(tokio::fs::read(record.frame.path()).await.map_err(|e| {
                Error::Storage(format!(
                    "cannot read frame {}: {e}",
                    record.frame.path().display()
                ))
            })?),
            None => None,
        };

        let answer = self
            .bounded(Stage::Reason, self.reasoning.answer(&question, image.as_deref()))
            .await?;

        let answer = if self.notify_missing_frame && frame.is_none() {
            format!("{MISSING_FRAME_NOTICE} {answer}")
        } else {
            answer
        };

        let speech = self
            .bounded(Stage::Synthesize, self.tts.synthesize(&answer))
            .await?;

        tracing::info!(
            %query_id,
            device = %device_id,
            audio_bytes = speech.len(),
            "query answered"
        );
        Ok(speech)
    }

    /// Run one collaborator call under the per-stage time budget
    async fn bounded<T>(
        &self,
        stage: Stage,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.stage_timeout, call)
            .await
            .map_err(|_| Error::StageTimeout(stage))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_read_well_in_errors() {
        let err = Error::StageTimeout(Stage::Reason);
        assert_eq!(err.to_string(), "reason stage timed out");
        assert_eq!(Stage::Transcribe.to_string(), "transcribe");
        assert_eq!(Stage::Synthesize.to_string(), "synthesize");
    }
}
