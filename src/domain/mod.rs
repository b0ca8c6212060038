//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod meter;
pub mod playback;
pub mod recording;
pub mod transcription;

// Re-export common types
pub use config::{AppConfig, UploadFormat};
pub use error::*;
pub use meter::VolumeAnalyser;
pub use playback::{DurationCell, PlaybackCursor};
pub use recording::{AudioMimeType, Duration, RecordingBlob, RecordingState, VoiceSession};
pub use transcription::{Transcript, TranscriptSegment, TranscriptionReport};
