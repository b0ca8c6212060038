//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod microphone;
pub mod playback;
pub mod transcriber;

// Re-export common types
pub use config::ConfigStore;
pub use decoder::{AudioDecoder, DecodeError};
pub use encoder::{AudioEncoder, BlobTranscoder, EncoderError, EncoderEvent, EncoderHandle};
pub use microphone::{
    AnalysisTap, CaptureError, DeviceStream, Microphone, PcmEvent, PcmFeed, StreamFormat,
};
pub use playback::{EngineEvent, PlaybackEngine, PlaybackError, PlaybackHandle};
pub use transcriber::{Transcriber, TranscriptionError};
