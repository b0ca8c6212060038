//! Recording domain: lifecycle state, durations and blobs

pub mod blob;
pub mod duration;
pub mod state;
pub mod wav;

pub use blob::{AudioMimeType, RecordingBlob};
pub use duration::{format_clock_ms, format_clock_secs, Duration};
pub use state::{InvalidStateTransition, RecordingState, VoiceSession};
