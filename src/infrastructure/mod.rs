//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with cpal, rodio, flacenc and the OpenAI API.

pub mod capture;
pub mod config;
pub mod encoding;
pub mod playback;
pub mod transcription;

// Re-export adapters
pub use capture::CpalMicrophone;
pub use config::XdgConfigStore;
pub use encoding::{FlacTranscoder, WavChunkEncoder};
pub use playback::{RodioDecoder, RodioPlaybackEngine};
pub use transcription::OpenAiTranscriber;
