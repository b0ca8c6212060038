//! Playback port interfaces

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Audio output device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("Failed to load recording: {0}")]
    LoadFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Notification from a loaded playback handle
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Media duration became known or changed
    DurationChange(f64),
    /// Periodic position report in seconds
    TimeUpdate(f64),
    /// Playback actually started
    Playing,
    /// Playback actually paused
    Paused,
    /// A play request was rejected
    PlayFailed(String),
    /// Playback reached the end of the media
    Ended,
}

/// One loaded recording on an output device.
///
/// `play` and `pause` are requests; the outcome arrives as an `EngineEvent`.
pub trait PlaybackHandle: Send {
    /// Take the event stream. Returns None after the first call.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<EngineEvent>>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Current playback position in seconds
    fn position(&self) -> f64;

    fn set_position(&mut self, secs: f64);

    /// Duration as reported by the engine, if finite and known
    fn duration(&self) -> Option<f64>;

    /// Stop playback and free the output. Idempotent.
    fn release(&mut self);
}

/// Port for loading recordings into a playback engine
pub trait PlaybackEngine: Send + Sync {
    /// Load encoded bytes addressed by `url`. Loading is non-blocking; device
    /// failures surface later as `EngineEvent::PlayFailed`.
    fn load(&self, url: &str, data: Arc<[u8]>) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}
