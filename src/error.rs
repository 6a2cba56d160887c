//! Error types for the sightline gateway

use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the sightline gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Frame ingest arrived without image bytes
    #[error("no image provided")]
    NoImage,

    /// Query arrived without audio bytes
    #[error("no audio provided")]
    NoAudio,

    /// Transcription backend fault
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Reasoning backend reported an error
    #[error("reasoning error: {0}")]
    Reasoning(String),

    /// Reasoning backend replied with an unrecognized payload shape
    #[error("unexpected reasoning response: {0}")]
    ReasoningProtocol(String),

    /// Speech synthesis backend fault
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// A pipeline stage exceeded its time budget
    #[error("{0} stage timed out")]
    StageTimeout(Stage),

    /// Backing file write or delete failure
    #[error("storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
