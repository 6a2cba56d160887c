//! Configuration for the sightline gateway

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Default frame window capacity per device
pub const DEFAULT_FRAME_CAPACITY: usize = 10;

/// Sightline gateway configuration
///
/// Loaded from an optional TOML file, then overridden by `SIGHTLINE_*`
/// environment variables for the common knobs. Every field has a default so
/// the gateway runs with no configuration at all against local backends.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Directory holding rolling frame files and scratch audio spools
    pub data_dir: PathBuf,

    /// Maximum retained frames per device
    pub frame_capacity: usize,

    /// Per-stage collaborator call budget, in seconds
    pub stage_timeout_secs: u64,

    /// Prefix answers with a spoken notice when no frame is available.
    /// Off by default: audio-only queries are answered without comment.
    pub notify_missing_frame: bool,

    /// Transcription backend
    pub stt: SttConfig,

    /// Vision-reasoning backend
    pub reasoning: ReasoningConfig,

    /// Speech synthesis backend
    pub tts: TtsConfig,
}

/// Transcription backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SttConfig {
    /// Base URL of an OpenAI-compatible transcription server
    pub base_url: String,

    /// Model identifier passed through to the backend
    pub model: String,

    /// Bearer token, when the backend requires one
    pub api_key: Option<String>,
}

/// Vision-reasoning backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReasoningConfig {
    /// Base URL of an Ollama-compatible generate server
    pub base_url: String,

    /// Multimodal model identifier (must accept image payloads)
    pub model: String,
}

/// Speech synthesis backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TtsConfig {
    /// Base URL of an OpenAI-compatible speech server
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Speed multiplier (0.25 to 4.0)
    pub speed: f64,

    /// Bearer token, when the backend requires one
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5080,
            data_dir: default_data_dir(),
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            stage_timeout_secs: 60,
            notify_missing_frame: false,
            stt: SttConfig::default(),
            reasoning: ReasoningConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".to_string(),
            model: "whisper-1".to_string(),
            api_key: None,
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llava".to_string(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8002".to_string(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            speed: 1.0,
            api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or a value is out
    /// of range.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    Error::Config(format!("cannot read {}: {e}", p.display()))
                })?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `SIGHTLINE_*` environment variable overrides
    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("SIGHTLINE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("SIGHTLINE_STT_URL") {
            self.stt.base_url = url;
        }
        if let Ok(model) = std::env::var("SIGHTLINE_STT_MODEL") {
            self.stt.model = model;
        }
        if let Ok(key) = std::env::var("SIGHTLINE_STT_API_KEY") {
            self.stt.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("SIGHTLINE_REASONING_URL") {
            self.reasoning.base_url = url;
        }
        if let Ok(model) = std::env::var("SIGHTLINE_REASONING_MODEL") {
            self.reasoning.model = model;
        }
        if let Ok(url) = std::env::var("SIGHTLINE_TTS_URL") {
            self.tts.base_url = url;
        }
        if let Ok(model) = std::env::var("SIGHTLINE_TTS_MODEL") {
            self.tts.model = model;
        }
        if let Ok(voice) = std::env::var("SIGHTLINE_TTS_VOICE") {
            self.tts.voice = voice;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.frame_capacity == 0 {
            return Err(Error::Config(
                "frame_capacity must be at least 1".to_string(),
            ));
        }
        if self.stage_timeout_secs == 0 {
            return Err(Error::Config(
                "stage_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform data directory, falling back to a relative path
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "sightline", "sightline").map_or_else(
        || PathBuf::from("sightline-data"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.port, 5080);
        assert_eq!(config.frame_capacity, 10);
        assert_eq!(config.reasoning.model, "llava");
        assert!(!config.notify_missing_frame);
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let raw = r#"
            port = 9000
            frame_capacity = 4

            [reasoning]
            model = "llava:13b"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.frame_capacity, 4);
        assert_eq!(config.reasoning.model, "llava:13b");
        // untouched sections keep their defaults
        assert_eq!(config.tts.voice, "alloy");
        assert_eq!(config.stage_timeout_secs, 60);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let raw = "persona = \"orin\"";
        assert!(toml::from_str::<Config>(raw).is_err());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = Config {
            frame_capacity: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
