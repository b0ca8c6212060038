//! Internal events delivered to the voice controller loop
//!
//! Every event carries the generation of the capture or recording that
//! produced it; the loop drops events whose generation is no longer current.

use tokio::sync::mpsc;

use super::ports::{CaptureError, DeviceStream, EncoderEvent, EngineEvent};

/// Events raised by an active capture
#[derive(Debug)]
pub enum CaptureEvent {
    Encoder(EncoderEvent),
    /// Elapsed-time ticker fired
    Tick,
    /// Latest volume level 0..100
    Level(u8),
    /// Maximum duration reached
    Deadline,
}

/// Events raised by a loaded recording
#[derive(Debug)]
pub enum PlaybackEvent {
    Engine(EngineEvent),
    /// Position frame loop fired
    Frame,
}

pub enum ControllerEvent {
    Acquired {
        generation: u64,
        result: Result<Box<dyn DeviceStream>, CaptureError>,
    },
    Capture {
        generation: u64,
        event: CaptureEvent,
    },
    Playback {
        generation: u64,
        event: PlaybackEvent,
    },
    DurationProbed {
        generation: u64,
        secs: f64,
    },
}

pub type EventSender = mpsc::UnboundedSender<ControllerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ControllerEvent>;
