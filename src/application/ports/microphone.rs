//! Microphone port interface

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::meter::FFT_SIZE;
use crate::domain::recording::wav::WavFormat;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Microphone unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),
}

/// Layout of the PCM delivered by a device stream
pub type StreamFormat = WavFormat;

/// Item delivered on a device feed
#[derive(Debug, Clone, PartialEq)]
pub enum PcmEvent {
    /// Interleaved 16-bit samples
    Samples(Vec<i16>),
    /// The device reported a runtime failure
    Error(String),
}

/// Receiving side of a device stream. Closes when the stream stops.
pub type PcmFeed = mpsc::UnboundedReceiver<PcmEvent>;

struct TapState {
    ring: VecDeque<f32>,
    connected: bool,
}

/// Read-side view of the most recent samples of a live stream.
///
/// The device writes into it; the volume meter snapshots it once per frame.
/// After `disconnect` writes are dropped and the buffer is empty.
#[derive(Clone)]
pub struct AnalysisTap {
    state: Arc<StdMutex<TapState>>,
    capacity: usize,
}

impl AnalysisTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(StdMutex::new(TapState {
                ring: VecDeque::with_capacity(capacity),
                connected: true,
            })),
            capacity,
        }
    }

    /// Append samples, keeping only the newest `capacity`
    pub fn push(&self, samples: &[i16]) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !state.connected {
            return;
        }
        for s in samples {
            if state.ring.len() == self.capacity {
                state.ring.pop_front();
            }
            state.ring.push_back(f32::from(*s) / 32768.0);
        }
    }

    /// Copy of the buffered samples, oldest first
    pub fn snapshot(&self) -> Vec<f32> {
        self.state
            .lock()
            .map(|state| state.ring.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn disconnect(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.connected = false;
            state.ring.clear();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().map(|s| s.connected).unwrap_or(false)
    }
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new(FFT_SIZE)
    }
}

/// An acquired, running microphone stream.
///
/// Dropping the stream must release the device.
pub trait DeviceStream: Send {
    /// PCM layout of the feed
    fn format(&self) -> StreamFormat;

    /// Take the sample feed. Returns None after the first call.
    fn take_feed(&mut self) -> Option<PcmFeed>;

    /// Analysis tap attached to this stream
    fn tap(&self) -> AnalysisTap;

    /// Release the device. Idempotent; closes the feed.
    fn stop(&mut self);
}

/// Port for microphone acquisition
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Acquire the default input device and start streaming.
    ///
    /// # Returns
    /// A live stream or a capture error (no device, denied, busy)
    async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_keeps_newest_samples() {
        let tap = AnalysisTap::new(3);
        tap.push(&[0, 16384, -16384, 8192]);
        assert_eq!(tap.snapshot(), vec![0.5, -0.5, 0.25]);
    }

    #[test]
    fn disconnected_tap_drops_writes() {
        let tap = AnalysisTap::new(4);
        let writer = tap.clone();
        writer.push(&[1, 2]);
        tap.disconnect();
        writer.push(&[3]);
        assert!(tap.snapshot().is_empty());
        assert!(!writer.is_connected());
    }

    #[test]
    fn capture_error_messages() {
        assert_eq!(
            CaptureError::NoAudioDevice.to_string(),
            "No audio input device available"
        );
        assert!(CaptureError::DeviceUnavailable("denied".into())
            .to_string()
            .contains("denied"));
    }
}
