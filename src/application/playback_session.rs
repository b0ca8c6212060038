//! Playback of a finished recording

use std::time::Duration as StdDuration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::blob_store::ObjectUrl;
use super::duration_resolver::DurationProbe;
use super::events::{ControllerEvent, EventSender, PlaybackEvent};
use super::ports::{EngineEvent, PlaybackError, PlaybackHandle};
use crate::domain::playback::PlaybackCursor;
use crate::domain::recording::RecordingBlob;

/// Playback state for one loaded recording.
///
/// The cursor is the only position the controller publishes. Engine events
/// and frame ticks are applied here, one at a time, from the controller loop.
pub struct PlaybackSession {
    generation: u64,
    handle: Option<Box<dyn PlaybackHandle>>,
    cursor: PlaybackCursor,
    frame_interval: StdDuration,
    events: EventSender,
    pump: Option<JoinHandle<()>>,
    frames: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    /// Wrap a loaded handle (or none, if loading failed)
    pub fn new(
        generation: u64,
        handle: Option<Box<dyn PlaybackHandle>>,
        frame_interval: StdDuration,
        events: EventSender,
    ) -> Self {
        let mut session = Self {
            generation,
            handle,
            cursor: PlaybackCursor::new(),
            frame_interval,
            events,
            pump: None,
            frames: None,
        };
        session.start_pump();
        session
    }

    fn start_pump(&mut self) {
        let Some(mut engine_events) = self.handle.as_mut().and_then(|h| h.take_events()) else {
            return;
        };
        let tx = self.events.clone();
        let generation = self.generation;
        self.pump = Some(tokio::spawn(async move {
            while let Some(event) = engine_events.recv().await {
                let event = ControllerEvent::Playback {
                    generation,
                    event: PlaybackEvent::Engine(event),
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
    }

    fn start_frames(&mut self) {
        if self.frames.is_some() {
            return;
        }
        let tx = self.events.clone();
        let generation = self.generation;
        let period = self.frame_interval;
        self.frames = Some(tokio::spawn(async move {
            let mut frames = interval(period);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                frames.tick().await;
                let event = ControllerEvent::Playback {
                    generation,
                    event: PlaybackEvent::Frame,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_frames(&mut self) {
        if let Some(frames) = self.frames.take() {
            frames.abort();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// Request play or pause; `playing` flips only on engine confirmation
    pub fn toggle(&mut self) -> Result<(), PlaybackError> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| PlaybackError::PlaybackFailed("no audio loaded".into()))?;
        if self.cursor.is_playing() {
            handle.pause();
        } else {
            handle.play();
        }
        Ok(())
    }

    /// Seek to `percent` of the best-known duration. No-op when unknown.
    pub fn seek(&mut self, percent: f64) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        let Some(target) = self.cursor.seek_target(percent) else {
            debug!(percent, "seek ignored: duration unknown");
            return;
        };
        handle.set_position(target);
        self.cursor.set_position(target);
    }

    /// Move by `delta` seconds, clamped to the recording
    pub fn skip(&mut self, delta: f64) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        let target = self
            .cursor
            .skip_target(handle.position(), delta, handle.duration());
        handle.set_position(target);
        self.cursor.set_position(handle.position());
    }

    pub fn begin_scrub(&mut self) {
        self.cursor.begin_scrub();
    }

    pub fn end_scrub(&mut self) {
        self.cursor.end_scrub();
    }

    /// Duration from the decode probe
    pub fn offer_duration(&mut self, secs: f64) {
        if self.cursor.offer_duration(secs) {
            debug!(generation = self.generation, secs, "duration resolved by decode");
        }
    }

    /// Apply an engine event. Returns a user-visible message on play failure.
    pub fn on_engine_event(&mut self, event: EngineEvent) -> Option<String> {
        match event {
            EngineEvent::DurationChange(secs) => {
                self.cursor.refine_duration(secs);
            }
            EngineEvent::TimeUpdate(secs) => {
                if let Some(d) = self.handle.as_ref().and_then(|h| h.duration()) {
                    self.cursor.refine_duration(d);
                }
                self.cursor.engine_position(secs);
            }
            EngineEvent::Playing => {
                self.cursor.set_playing(true);
                self.start_frames();
            }
            EngineEvent::Paused => {
                self.cursor.set_playing(false);
                self.stop_frames();
            }
            EngineEvent::PlayFailed(message) => {
                self.cursor.set_playing(false);
                self.stop_frames();
                return Some(PlaybackError::PlaybackFailed(message).to_string());
            }
            EngineEvent::Ended => {
                self.cursor.ended();
                self.stop_frames();
            }
        }
        None
    }

    /// Frame tick: poll the engine position while playing
    pub fn on_frame(&mut self) {
        if !self.cursor.is_playing() {
            return;
        }
        if let Some(handle) = self.handle.as_ref() {
            self.cursor.engine_position(handle.position());
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop_frames();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(mut handle) = self.handle.take() {
            handle.pause();
            handle.release();
        }
    }
}

/// Everything that exists while a recording is held.
///
/// Field order is teardown order: playback stops first, the decode probe is
/// cancelled, then the object URL is revoked.
pub struct FinishedRecording {
    playback: PlaybackSession,
    probe: Option<DurationProbe>,
    url: ObjectUrl,
    blob: RecordingBlob,
}

impl FinishedRecording {
    pub fn new(
        blob: RecordingBlob,
        url: ObjectUrl,
        playback: PlaybackSession,
        probe: Option<DurationProbe>,
    ) -> Self {
        Self {
            playback,
            probe,
            url,
            blob,
        }
    }

    pub fn blob(&self) -> &RecordingBlob {
        &self.blob
    }

    pub fn playback(&self) -> &PlaybackSession {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackSession {
        &mut self.playback
    }

    /// Duration reported by the decode probe; the probe is finished after this
    pub fn probe_resolved(&mut self, secs: f64) {
        self.probe = None;
        self.playback.offer_duration(secs);
    }
}

impl Drop for FinishedRecording {
    fn drop(&mut self) {
        if self.url.is_revoked() {
            warn!(url = %self.url.as_str(), "recording url revoked before teardown");
        }
        debug!(url = %self.url.as_str(), "releasing recording");
    }
}
