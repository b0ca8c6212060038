//! Voice capture and playback controller
//!
//! A single actor task owns every piece of capture and playback state and
//! processes one command or internal event at a time. The handle sends
//! commands; observers read `VoiceSnapshot`s from a watch channel.
//!
//! State machine:
//!   IDLE -> RECORDING (start, once the microphone is acquired)
//!   RECORDING -> RECORDED (stop or deadline, once the encoder has flushed)
//!   RECORDING -> IDLE (encoder failure)
//!   RECORDED -> IDLE (delete)
//!
//! `start` while RECORDED deletes first, then starts.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::blob_store::BlobStore;
use super::duration_resolver::DurationProbe;
use super::events::{
    CaptureEvent, ControllerEvent, EventReceiver, EventSender, PlaybackEvent,
};
use super::playback_session::{FinishedRecording, PlaybackSession};
use super::ports::{
    AudioDecoder, AudioEncoder, CaptureError, DeviceStream, EncoderError, EncoderEvent,
    Microphone, PlaybackEngine,
};
use super::recording_session::{ActiveCapture, CaptureTiming};
use crate::domain::config::AppConfig;
use crate::domain::recording::duration::{TICK_INTERVAL_MS, TIMESLICE_MS};
use crate::domain::recording::{
    format_clock_ms, format_clock_secs, Duration, RecordingBlob, RecordingState, VoiceSession,
};

/// Controller timing configuration
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub max_duration: Duration,
    pub frame_interval: StdDuration,
    pub tick_interval: StdDuration,
    pub timeslice: StdDuration,
}

impl ControllerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_duration: config.max_duration_or_default(),
            frame_interval: config.frame_interval(),
            ..Self::default()
        }
    }

    fn timing(&self) -> CaptureTiming {
        CaptureTiming {
            max_duration: self.max_duration,
            tick_interval: self.tick_interval,
            timeslice: self.timeslice,
            frame_interval: self.frame_interval,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_duration: Duration::default_max_duration(),
            frame_interval: AppConfig::empty().frame_interval(),
            tick_interval: StdDuration::from_millis(TICK_INTERVAL_MS),
            timeslice: StdDuration::from_millis(TIMESLICE_MS),
        }
    }
}

/// Observable controller state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSnapshot {
    pub state: RecordingState,
    /// Microphone acquisition in flight
    pub acquiring: bool,
    pub elapsed_ms: u64,
    pub max_duration_ms: u64,
    /// Latest volume level, 0..100
    pub volume_level: u8,
    pub position_secs: f64,
    pub duration_secs: Option<f64>,
    pub playing: bool,
    pub scrubbing: bool,
    pub error: Option<String>,
    pub recording_size: Option<usize>,
}

impl VoiceSnapshot {
    fn initial(max_duration: Duration) -> Self {
        Self {
            state: RecordingState::Idle,
            acquiring: false,
            elapsed_ms: 0,
            max_duration_ms: max_duration.as_millis(),
            volume_level: 0,
            position_secs: 0.0,
            duration_secs: None,
            playing: false,
            scrubbing: false,
            error: None,
            recording_size: None,
        }
    }

    pub fn elapsed_clock(&self) -> String {
        format_clock_ms(self.elapsed_ms as f64)
    }

    pub fn max_clock(&self) -> String {
        format_clock_ms(self.max_duration_ms as f64)
    }

    pub fn position_clock(&self) -> String {
        format_clock_ms(self.position_secs * 1000.0)
    }

    /// `m:ss`, or `--:--` while unknown
    pub fn duration_clock(&self) -> String {
        format_clock_secs(self.duration_secs)
    }

    /// Playback progress 0..100, 0 while the duration is unknown
    pub fn progress_percent(&self) -> f64 {
        match self.duration_secs {
            Some(d) if d > 0.0 => (self.position_secs / d * 100.0).min(100.0),
            _ => 0.0,
        }
    }
}

/// Errors from the controller handle
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    #[error("Voice controller has shut down")]
    Closed,
}

enum Command {
    Start,
    Stop,
    Delete,
    TogglePlayback,
    Seek(f64),
    Skip(f64),
    BeginScrub,
    EndScrub,
    Recording(oneshot::Sender<Option<RecordingBlob>>),
    Shutdown,
}

struct Envelope {
    command: Command,
    done: oneshot::Sender<()>,
}

/// Handle to a running voice controller.
///
/// Each method resolves once the controller has processed the command.
/// Asynchronous outcomes (acquisition, finalize, engine confirmation) are
/// observed through snapshots.
#[derive(Clone)]
pub struct VoiceController {
    commands: mpsc::UnboundedSender<Envelope>,
    snapshots: watch::Receiver<VoiceSnapshot>,
}

impl VoiceController {
    /// Spawn the controller task on the current runtime
    pub fn spawn<M, E, P, D>(
        microphone: M,
        encoder: E,
        engine: P,
        decoder: D,
        settings: ControllerSettings,
    ) -> Self
    where
        M: Microphone + 'static,
        E: AudioEncoder + 'static,
        P: PlaybackEngine + 'static,
        D: AudioDecoder + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(VoiceSnapshot::initial(settings.max_duration));

        let controller = ControllerLoop {
            microphone: Arc::new(microphone),
            encoder,
            engine,
            decoder: Arc::new(decoder),
            store: BlobStore::new(),
            settings,
            session: VoiceSession::new(),
            generation: 0,
            pending: None,
            capture: None,
            finished: None,
            elapsed_ms: 0,
            volume_level: 0,
            error: None,
            events: events_tx,
            snapshots: snapshot_tx,
        };
        tokio::spawn(controller.run(commands_rx, events_rx));

        Self {
            commands: commands_tx,
            snapshots: snapshot_rx,
        }
    }

    async fn send(&self, command: Command) -> Result<(), ControllerError> {
        let (done, ack) = oneshot::channel();
        self.commands
            .send(Envelope { command, done })
            .map_err(|_| ControllerError::Closed)?;
        ack.await.map_err(|_| ControllerError::Closed)
    }

    /// Begin acquiring the microphone; discards a held recording first
    pub async fn start(&self) -> Result<(), ControllerError> {
        self.send(Command::Start).await
    }

    /// Stop capturing (or cancel a pending acquisition). Idempotent.
    pub async fn stop(&self) -> Result<(), ControllerError> {
        self.send(Command::Stop).await
    }

    /// Discard the held recording
    pub async fn delete(&self) -> Result<(), ControllerError> {
        self.send(Command::Delete).await
    }

    pub async fn toggle_playback(&self) -> Result<(), ControllerError> {
        self.send(Command::TogglePlayback).await
    }

    /// Seek to `percent` (0..100) of the recording
    pub async fn seek(&self, percent: f64) -> Result<(), ControllerError> {
        self.send(Command::Seek(percent)).await
    }

    /// Move playback by `delta_secs` (negative skips back)
    pub async fn skip(&self, delta_secs: f64) -> Result<(), ControllerError> {
        self.send(Command::Skip(delta_secs)).await
    }

    pub async fn begin_scrub(&self) -> Result<(), ControllerError> {
        self.send(Command::BeginScrub).await
    }

    pub async fn end_scrub(&self) -> Result<(), ControllerError> {
        self.send(Command::EndScrub).await
    }

    /// The finished recording, if one is held
    pub async fn recording(&self) -> Result<Option<RecordingBlob>, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Recording(reply)).await?;
        response.await.map_err(|_| ControllerError::Closed)
    }

    /// Tear everything down and stop the controller task
    pub async fn shutdown(&self) -> Result<(), ControllerError> {
        self.send(Command::Shutdown).await
    }

    pub fn snapshot(&self) -> VoiceSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VoiceSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> Result<VoiceSnapshot, ControllerError>
    where
        F: FnMut(&VoiceSnapshot) -> bool,
    {
        let mut snapshots = self.snapshots.clone();
        snapshots
            .wait_for(predicate)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| ControllerError::Closed)
    }
}

struct PendingStart {
    generation: u64,
    cancelled: bool,
}

struct ControllerLoop<M, E, P, D> {
    microphone: Arc<M>,
    encoder: E,
    engine: P,
    decoder: Arc<D>,
    store: BlobStore,
    settings: ControllerSettings,
    session: VoiceSession,
    generation: u64,
    pending: Option<PendingStart>,
    capture: Option<ActiveCapture>,
    finished: Option<FinishedRecording>,
    elapsed_ms: u64,
    volume_level: u8,
    error: Option<String>,
    events: EventSender,
    snapshots: watch::Sender<VoiceSnapshot>,
}

impl<M, E, P, D> ControllerLoop<M, E, P, D>
where
    M: Microphone + 'static,
    E: AudioEncoder + 'static,
    P: PlaybackEngine + 'static,
    D: AudioDecoder + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Envelope>,
        mut events: EventReceiver,
    ) {
        loop {
            tokio::select! {
                biased;
                envelope = commands.recv() => {
                    let Some(Envelope { command, done }) = envelope else {
                        break;
                    };
                    let shutdown = matches!(command, Command::Shutdown);
                    self.handle_command(command);
                    self.publish();
                    let _ = done.send(());
                    if shutdown {
                        return;
                    }
                }
                Some(event) = events.recv() => {
                    self.handle_event(event);
                    self.publish();
                }
            }
        }

        // every handle dropped
        self.teardown();
        self.publish();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Delete => self.delete(),
            Command::TogglePlayback => self.toggle_playback(),
            Command::Seek(percent) => {
                if let Some(finished) = self.finished.as_mut() {
                    finished.playback_mut().seek(percent);
                }
            }
            Command::Skip(delta) => {
                if let Some(finished) = self.finished.as_mut() {
                    finished.playback_mut().skip(delta);
                }
            }
            Command::BeginScrub => {
                if let Some(finished) = self.finished.as_mut() {
                    finished.playback_mut().begin_scrub();
                }
            }
            Command::EndScrub => {
                if let Some(finished) = self.finished.as_mut() {
                    finished.playback_mut().end_scrub();
                }
            }
            Command::Recording(reply) => {
                let _ = reply.send(self.finished.as_ref().map(|f| f.blob().clone()));
            }
            Command::Shutdown => self.teardown(),
        }
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Acquired { generation, result } => self.on_acquired(generation, result),
            ControllerEvent::Capture { generation, event } => self.on_capture_event(generation, event),
            ControllerEvent::Playback { generation, event } => {
                let Some(finished) = self
                    .finished
                    .as_mut()
                    .filter(|f| f.playback().generation() == generation)
                else {
                    debug!(generation, "stale playback event dropped");
                    return;
                };
                match event {
                    PlaybackEvent::Engine(engine_event) => {
                        if let Some(message) = finished.playback_mut().on_engine_event(engine_event) {
                            warn!(%message, "playback failed");
                            self.error = Some(message);
                        }
                    }
                    PlaybackEvent::Frame => finished.playback_mut().on_frame(),
                }
            }
            ControllerEvent::DurationProbed { generation, secs } => {
                match self
                    .finished
                    .as_mut()
                    .filter(|f| f.playback().generation() == generation)
                {
                    Some(finished) => finished.probe_resolved(secs),
                    None => debug!(generation, "stale duration probe dropped"),
                }
            }
        }
    }

    fn start(&mut self) {
        self.error = None;
        if self.session.is_recording() || self.pending.as_ref().is_some_and(|p| !p.cancelled) {
            debug!("start ignored: capture already in progress");
            return;
        }
        if self.session.is_recorded() {
            info!("discarding held recording before re-recording");
            self.delete_recording();
        }

        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(PendingStart {
            generation,
            cancelled: false,
        });
        self.elapsed_ms = 0;
        self.volume_level = 0;

        let microphone = Arc::clone(&self.microphone);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = microphone.acquire().await;
            // a closed channel drops the stream, releasing the device
            let _ = events.send(ControllerEvent::Acquired { generation, result });
        });
        debug!(generation, "acquiring microphone");
    }

    fn on_acquired(
        &mut self,
        generation: u64,
        result: Result<Box<dyn DeviceStream>, CaptureError>,
    ) {
        let pending = match self.pending.take() {
            Some(p) if p.generation == generation => p,
            other => {
                self.pending = other;
                if let Ok(mut stream) = result {
                    stream.stop();
                }
                debug!(generation, "stale acquisition released");
                return;
            }
        };

        if pending.cancelled {
            if let Ok(mut stream) = result {
                stream.stop();
            }
            info!(generation, "capture cancelled during acquisition; device released");
            return;
        }

        match result {
            Ok(stream) => self.begin_capture(generation, stream),
            Err(e) => {
                warn!(error = %e, "microphone acquisition failed");
                self.error = Some(e.to_string());
            }
        }
    }

    fn begin_capture(&mut self, generation: u64, stream: Box<dyn DeviceStream>) {
        let capture = match ActiveCapture::begin(
            generation,
            stream,
            &self.encoder,
            self.settings.timing(),
            &self.events,
        ) {
            Ok(capture) => capture,
            Err(e) => {
                warn!(error = %e, "encoder could not be opened");
                self.error = Some(e.to_string());
                return;
            }
        };

        if let Err(e) = self.session.start_recording() {
            warn!(error = %e, "capture discarded");
            return;
        }
        self.capture = Some(capture);
        info!(generation, "recording");
    }

    fn stop(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            pending.cancelled = true;
            info!(generation = pending.generation, "stop requested during acquisition");
            return;
        }
        let Some(capture) = self.capture.as_mut() else {
            debug!("stop ignored: not recording");
            return;
        };
        if capture.halt() {
            self.elapsed_ms = capture.elapsed_ms();
            info!(
                generation = capture.generation(),
                elapsed_ms = self.elapsed_ms,
                "capture stopping"
            );
        }
        self.volume_level = 0;
    }

    fn on_capture_event(&mut self, generation: u64, event: CaptureEvent) {
        let is_current = self
            .capture
            .as_ref()
            .is_some_and(|c| c.generation() == generation);
        if !is_current {
            debug!(generation, "stale capture event dropped");
            return;
        }

        match event {
            CaptureEvent::Tick => {
                if let Some(capture) = self.capture.as_ref().filter(|c| !c.is_halted()) {
                    self.elapsed_ms = capture.elapsed_ms();
                }
            }
            CaptureEvent::Level(level) => {
                if self.capture.as_ref().is_some_and(|c| !c.is_halted()) {
                    self.volume_level = level;
                }
            }
            CaptureEvent::Deadline => {
                info!(generation, "maximum duration reached");
                self.stop();
            }
            CaptureEvent::Encoder(EncoderEvent::Data(bytes)) => {
                if let Some(capture) = self.capture.as_mut() {
                    capture.push_chunk(bytes);
                }
            }
            CaptureEvent::Encoder(EncoderEvent::Stopped) => self.finish_capture(),
            CaptureEvent::Encoder(EncoderEvent::Error(e)) => self.fail_capture(e),
        }
    }

    fn finish_capture(&mut self) {
        let Some(mut capture) = self.capture.take() else {
            return;
        };
        if capture.halt() {
            self.elapsed_ms = capture.elapsed_ms();
        }
        let generation = capture.generation();
        let blob = capture.finalize();
        self.volume_level = 0;

        if let Err(e) = self.session.finish_recording() {
            warn!(error = %e, "finished recording discarded");
            return;
        }
        info!(generation, size = %blob.human_readable_size(), "recording finished");

        let url = self.store.create_url(blob.clone());
        let handle = match self.engine.load(url.as_str(), blob.shared_data()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "recording could not be loaded for playback");
                self.error = Some(e.to_string());
                None
            }
        };
        let playback = PlaybackSession::new(
            generation,
            handle,
            self.settings.frame_interval,
            self.events.clone(),
        );
        let probe = DurationProbe::spawn(
            Arc::clone(&self.decoder),
            self.store.clone(),
            url.as_str().to_string(),
            generation,
            self.events.clone(),
        );
        self.finished = Some(FinishedRecording::new(blob, url, playback, Some(probe)));
    }

    fn fail_capture(&mut self, error: EncoderError) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        warn!(
            generation = capture.generation(),
            error = %error,
            "capture failed; partial recording discarded"
        );
        drop(capture);
        if let Err(e) = self.session.abort_recording() {
            warn!(error = %e, "unexpected state after capture failure");
        }
        self.elapsed_ms = 0;
        self.volume_level = 0;
        self.error = Some(error.to_string());
    }

    fn delete(&mut self) {
        self.error = None;
        if !self.session.is_recorded() {
            debug!(state = %self.session.state(), "delete ignored");
            return;
        }
        self.delete_recording();
    }

    fn delete_recording(&mut self) {
        self.finished = None;
        if let Err(e) = self.session.delete_recording() {
            warn!(error = %e, "unexpected state on delete");
        }
        self.elapsed_ms = 0;
        info!("recording deleted");
    }

    fn toggle_playback(&mut self) {
        self.error = None;
        let Some(finished) = self.finished.as_mut() else {
            debug!("toggle ignored: nothing recorded");
            return;
        };
        if let Err(e) = finished.playback_mut().toggle() {
            warn!(error = %e, "playback toggle failed");
            self.error = Some(e.to_string());
        }
    }

    fn teardown(&mut self) {
        self.pending = None;
        if let Some(mut capture) = self.capture.take() {
            capture.halt();
        }
        self.finished = None;
        self.session = VoiceSession::new();
        self.elapsed_ms = 0;
        self.volume_level = 0;
        info!("voice controller torn down");
    }

    fn snapshot(&self) -> VoiceSnapshot {
        let cursor = self.finished.as_ref().map(|f| f.playback().cursor());
        VoiceSnapshot {
            state: self.session.state(),
            acquiring: self.pending.as_ref().is_some_and(|p| !p.cancelled),
            elapsed_ms: self.elapsed_ms,
            max_duration_ms: self.settings.max_duration.as_millis(),
            volume_level: self.volume_level,
            position_secs: cursor.map_or(0.0, |c| c.position()),
            duration_secs: cursor.and_then(|c| c.duration()),
            playing: cursor.is_some_and(|c| c.is_playing()),
            scrubbing: cursor.is_some_and(|c| c.is_scrubbing()),
            error: self.error.clone(),
            recording_size: self.finished.as_ref().map(|f| f.blob().size_bytes()),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
