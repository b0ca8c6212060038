//! Application layer - Use cases and port interfaces
//!
//! Contains the voice controller, its capture and playback sessions,
//! and the trait definitions for external system interactions.

pub mod blob_store;
pub mod controller;
pub mod duration_resolver;
pub mod events;
pub mod playback_session;
pub mod ports;
pub mod recording_session;
pub mod transcribe;
pub mod volume_meter;

// Re-export use cases
pub use blob_store::{BlobStore, ObjectUrl};
pub use controller::{ControllerError, ControllerSettings, VoiceController, VoiceSnapshot};
pub use transcribe::{
    TranscribeError, TranscribeInput, TranscribeOutput, TranscribeRecordingUseCase,
};
