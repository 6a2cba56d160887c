//! Speech collaborator clients
//!
//! Transcription and synthesis are external backends reached over HTTP;
//! this module only owns the call contracts.

mod stt;
mod tts;

pub use stt::SpeechToText;
pub use tts::TextToSpeech;
