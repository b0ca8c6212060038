//! Active capture: device stream, encoder, chunk buffer and timers
//!
//! Every way a capture can end goes through `halt`: it cancels the ticker,
//! the deadline and the meter, asks the encoder to flush, and releases the
//! device. `halt` is idempotent and also runs on drop.

use std::time::Duration as StdDuration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::events::{CaptureEvent, ControllerEvent, EventSender};
use super::ports::{AudioEncoder, DeviceStream, EncoderError, EncoderHandle};
use super::volume_meter::VolumeMeter;
use crate::domain::recording::{AudioMimeType, Duration, RecordingBlob};

/// Timing parameters of a capture
#[derive(Debug, Clone, Copy)]
pub struct CaptureTiming {
    pub max_duration: Duration,
    pub tick_interval: StdDuration,
    pub timeslice: StdDuration,
    pub frame_interval: StdDuration,
}

pub struct ActiveCapture {
    generation: u64,
    stream: Box<dyn DeviceStream>,
    encoder: EncoderHandle,
    mime_type: AudioMimeType,
    chunks: Vec<Vec<u8>>,
    started_at: Instant,
    max_duration: Duration,
    forwarder: JoinHandle<()>,
    ticker: Option<JoinHandle<()>>,
    deadline: Option<JoinHandle<()>>,
    meter: Option<VolumeMeter>,
    halted: bool,
}

impl ActiveCapture {
    /// Open an encoder on `stream` and start the ticker, deadline and meter.
    ///
    /// On error the stream is dropped, releasing the device.
    pub fn begin<E>(
        generation: u64,
        mut stream: Box<dyn DeviceStream>,
        encoder: &E,
        timing: CaptureTiming,
        events: &EventSender,
    ) -> Result<Self, EncoderError>
    where
        E: AudioEncoder + ?Sized,
    {
        let feed = stream
            .take_feed()
            .ok_or_else(|| EncoderError::OpenFailed("stream feed already taken".into()))?;
        let mut handle = encoder.open(feed, stream.format(), timing.timeslice)?;
        let encoder_events = handle.take_events();

        let started_at = Instant::now();

        let forward_tx = events.clone();
        let forwarder = tokio::spawn(async move {
            let Some(mut encoder_events) = encoder_events else {
                return;
            };
            while let Some(event) = encoder_events.recv().await {
                let event = ControllerEvent::Capture {
                    generation,
                    event: CaptureEvent::Encoder(event),
                };
                if forward_tx.send(event).is_err() {
                    break;
                }
            }
        });

        let tick_tx = events.clone();
        let tick_interval = timing.tick_interval;
        let ticker = tokio::spawn(async move {
            let mut ticks = interval_at(started_at + tick_interval, tick_interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let event = ControllerEvent::Capture {
                    generation,
                    event: CaptureEvent::Tick,
                };
                if tick_tx.send(event).is_err() {
                    break;
                }
            }
        });

        let deadline_tx = events.clone();
        let deadline_at = started_at + timing.max_duration.as_std();
        let deadline = tokio::spawn(async move {
            sleep_until(deadline_at).await;
            let _ = deadline_tx.send(ControllerEvent::Capture {
                generation,
                event: CaptureEvent::Deadline,
            });
        });

        let meter = VolumeMeter::start(stream.tap(), timing.frame_interval, generation, events.clone());

        info!(generation, max = %timing.max_duration, "capture started");

        Ok(Self {
            generation,
            stream,
            encoder: handle,
            mime_type: encoder.mime_type(),
            chunks: Vec::new(),
            started_at,
            max_duration: timing.max_duration,
            forwarder,
            ticker: Some(ticker),
            deadline: Some(deadline),
            meter: Some(meter),
            halted: false,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Elapsed capture time, never beyond the maximum
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        elapsed.min(self.max_duration.as_millis())
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Append one encoded time slice
    pub fn push_chunk(&mut self, data: Vec<u8>) {
        if !data.is_empty() {
            self.chunks.push(data);
        }
    }

    /// Stop capturing. Returns false if already halted.
    pub fn halt(&mut self) -> bool {
        if self.halted {
            return false;
        }
        self.halted = true;

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(deadline) = self.deadline.take() {
            deadline.abort();
        }
        self.meter = None;
        self.encoder.request_stop();
        self.stream.stop();

        debug!(generation = self.generation, chunks = self.chunks.len(), "capture halted");
        true
    }

    /// Concatenate the buffered chunks into the finished recording
    pub fn finalize(mut self) -> RecordingBlob {
        self.halt();
        let chunks = std::mem::take(&mut self.chunks);
        RecordingBlob::from_chunks(chunks, self.mime_type)
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        self.halt();
        self.forwarder.abort();
    }
}
