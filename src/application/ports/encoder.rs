//! Encoder port interfaces

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::microphone::{PcmFeed, StreamFormat};
use crate::domain::recording::{AudioMimeType, RecordingBlob};

/// Encoding errors
#[derive(Debug, Clone, Error)]
pub enum EncoderError {
    #[error("Failed to open encoder: {0}")]
    OpenFailed(String),

    #[error("Encoder failed: {0}")]
    Runtime(String),

    #[error("Transcoding failed: {0}")]
    Transcode(String),
}

/// Event emitted by a running encoder
#[derive(Debug, Clone)]
pub enum EncoderEvent {
    /// One time slice of encoded data
    Data(Vec<u8>),
    /// Every buffered slice has been emitted; no further events follow
    Stopped,
    /// Fatal runtime failure; no further events follow
    Error(EncoderError),
}

/// Control handle of a running encoder
pub struct EncoderHandle {
    stop: Option<oneshot::Sender<()>>,
    events: Option<mpsc::UnboundedReceiver<EncoderEvent>>,
}

impl EncoderHandle {
    pub fn new(stop: oneshot::Sender<()>, events: mpsc::UnboundedReceiver<EncoderEvent>) -> Self {
        Self {
            stop: Some(stop),
            events: Some(events),
        }
    }

    /// Take the event stream. Returns None after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<EncoderEvent>> {
        self.events.take()
    }

    /// Ask the encoder to flush and stop. Returns false if already asked.
    pub fn request_stop(&mut self) -> bool {
        match self.stop.take() {
            Some(tx) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.is_none()
    }
}

/// Port for timesliced capture encoding
pub trait AudioEncoder: Send + Sync {
    /// Container produced by this encoder
    fn mime_type(&self) -> AudioMimeType;

    /// Start encoding `feed`, emitting one `Data` event per `timeslice`.
    /// Must be called from within a tokio runtime.
    fn open(
        &self,
        feed: PcmFeed,
        format: StreamFormat,
        timeslice: StdDuration,
    ) -> Result<EncoderHandle, EncoderError>;
}

/// Port for converting a finished recording into an upload container
#[async_trait]
pub trait BlobTranscoder: Send + Sync {
    async fn transcode(&self, blob: &RecordingBlob) -> Result<RecordingBlob, EncoderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_stop_is_idempotent() {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let mut handle = EncoderHandle::new(stop_tx, events_rx);

        assert!(!handle.is_stopping());
        assert!(handle.request_stop());
        assert!(!handle.request_stop());
        assert!(handle.is_stopping());
        assert!(stop_rx.try_recv().is_ok());
    }

    #[test]
    fn events_taken_once() {
        let (stop_tx, _stop_rx) = oneshot::channel();
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let mut handle = EncoderHandle::new(stop_tx, events_rx);
        assert!(handle.take_events().is_some());
        assert!(handle.take_events().is_none());
    }
}
