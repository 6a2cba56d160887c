//! Sightline Gateway - pairs edge-device camera frames with voice queries
//!
//! An edge device streams recent camera frames and spoken questions to this
//! gateway. Each query is paired with the device's most recent frame and
//! driven through external collaborators for transcription, multimodal
//! reasoning, and speech synthesis; the caller gets the answer back as audio.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Edge devices                        │
//! │      camera frames   │   spoken questions            │
//! └──────────┬───────────┴──────────┬───────────────────┘
//!            │ /image_stream        │ /query
//! ┌──────────▼──────────────────────▼───────────────────┐
//! │               Sightline Gateway                      │
//! │  Frame windows │ Session registry │ Query pipeline  │
//! └──────────┬──────────────┬──────────────┬────────────┘
//!            │              │              │
//!       transcription   reasoning      synthesis
//!        (whisper)    (ollama/llava)     (tts)
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reasoning;
pub mod session;
pub mod speech;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{QueryPipeline, Stage};
pub use reasoning::ReasoningClient;
pub use session::{DeviceSession, FrameRecord, FrameStore, SessionRegistry};
pub use speech::{SpeechToText, TextToSpeech};
pub use storage::{MediaStore, ScratchAudio, StoredFrame};
