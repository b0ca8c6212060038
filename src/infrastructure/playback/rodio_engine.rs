//! Playback engine using rodio
//!
//! Each loaded recording gets a thread that owns the output stream and the
//! sink (`OutputStream` is not `Send`). The handle talks to it over a command
//! channel and reads the position from a shared play clock.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::{Duration as StdDuration, Instant};

use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::ports::{EngineEvent, PlaybackEngine, PlaybackError, PlaybackHandle};

/// How often the position is reported while playing
const TIME_UPDATE_INTERVAL: StdDuration = StdDuration::from_millis(250);

type MediaSource = Decoder<Cursor<Arc<[u8]>>>;

fn open_source(data: &Arc<[u8]>) -> Result<MediaSource, PlaybackError> {
    Decoder::new(Cursor::new(Arc::clone(data))).map_err(|e| PlaybackError::LoadFailed(e.to_string()))
}

struct ClockState {
    anchor: f64,
    running_since: Option<Instant>,
    limit: Option<f64>,
}

/// Playback time shared by the worker and the handle.
///
/// The worker pins it to the sink position on every state change and time
/// update. Between pins a running clock advances with wall time, so readers
/// see a live position at any rate.
#[derive(Clone)]
struct PlayClock {
    state: Arc<StdMutex<ClockState>>,
}

impl PlayClock {
    fn new(limit: Option<f64>) -> Self {
        Self {
            state: Arc::new(StdMutex::new(ClockState {
                anchor: 0.0,
                running_since: None,
                limit,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current position in seconds, never past the media length
    fn now(&self) -> f64 {
        let state = self.lock();
        let live = match state.running_since {
            Some(since) => state.anchor + since.elapsed().as_secs_f64(),
            None => state.anchor,
        };
        state.limit.map_or(live, |limit| live.min(limit))
    }

    /// Pin the clock to `secs`, running or stopped
    fn pin(&self, secs: f64, running: bool) {
        let mut state = self.lock();
        state.anchor = secs.max(0.0);
        state.running_since = running.then(Instant::now);
    }

    /// Move to `secs`, keeping the running state
    fn jump(&self, secs: f64) {
        let mut state = self.lock();
        state.anchor = secs.max(0.0);
        if state.running_since.is_some() {
            state.running_since = Some(Instant::now());
        }
    }
}

enum Command {
    Play,
    Pause,
    Seek(f64),
    Release,
}

/// Engine that plays recordings on the default output device
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioPlaybackEngine;

impl RodioPlaybackEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PlaybackEngine for RodioPlaybackEngine {
    fn load(&self, url: &str, data: Arc<[u8]>) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let source = open_source(&data)?;
        let duration = source
            .total_duration()
            .map(|d| d.as_secs_f64())
            .filter(|d| d.is_finite() && *d > 0.0);

        let (commands_tx, commands_rx) = std_mpsc::channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let clock = PlayClock::new(duration);

        if let Some(secs) = duration {
            let _ = events_tx.send(EngineEvent::DurationChange(secs));
        }

        let worker = Worker {
            data,
            commands: commands_rx,
            events: events_tx,
            clock: clock.clone(),
        };
        std::thread::Builder::new()
            .name("voicenote-playback".into())
            .spawn(move || worker.run(source))
            .map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;

        debug!(url, ?duration, "recording loaded");
        Ok(Box::new(RodioHandle {
            commands: Some(commands_tx),
            events: Some(events_rx),
            clock,
            duration,
        }))
    }
}

struct Worker {
    data: Arc<[u8]>,
    commands: std_mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<EngineEvent>,
    clock: PlayClock,
}

impl Worker {
    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    /// Queue a fresh, paused copy of the media. The sink must be empty.
    fn rewind(&self, sink: &Sink) {
        sink.pause();
        match open_source(&self.data) {
            Ok(source) => sink.append(source),
            Err(e) => warn!(error = %e, "failed to reopen recording"),
        }
        self.clock.pin(0.0, false);
    }

    fn run(self, source: MediaSource) {
        // Keep the stream alive for as long as the sink plays
        let output = OutputStream::try_default()
            .map_err(|e| e.to_string())
            .and_then(|(stream, handle)| {
                Sink::try_new(&handle)
                    .map(|sink| (stream, sink))
                    .map_err(|e| e.to_string())
            });

        let (_stream, sink) = match output {
            Ok(pair) => pair,
            Err(reason) => {
                warn!(error = %reason, "no audio output");
                self.serve_without_device(&reason);
                return;
            }
        };

        sink.pause();
        sink.append(source);
        let mut playing = false;

        loop {
            match self.commands.recv_timeout(TIME_UPDATE_INTERVAL) {
                Ok(Command::Play) => {
                    if sink.empty() {
                        self.rewind(&sink);
                    }
                    sink.play();
                    playing = true;
                    self.clock.pin(sink.get_pos().as_secs_f64(), true);
                    self.emit(EngineEvent::Playing);
                }
                Ok(Command::Pause) => {
                    sink.pause();
                    self.clock.pin(sink.get_pos().as_secs_f64(), false);
                    if playing {
                        playing = false;
                        self.emit(EngineEvent::Paused);
                    }
                }
                Ok(Command::Seek(secs)) => {
                    if sink.empty() {
                        self.rewind(&sink);
                    }
                    if let Err(e) = sink.try_seek(StdDuration::from_secs_f64(secs.max(0.0))) {
                        warn!(error = %e, secs, "seek failed");
                    }
                    self.clock.pin(sink.get_pos().as_secs_f64(), playing);
                }
                Ok(Command::Release) | Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                    sink.stop();
                    debug!("playback released");
                    return;
                }
                Err(std_mpsc::RecvTimeoutError::Timeout) => {}
            }

            if !playing {
                continue;
            }
            if sink.empty() {
                playing = false;
                self.rewind(&sink);
                self.emit(EngineEvent::Ended);
            } else {
                let secs = sink.get_pos().as_secs_f64();
                self.clock.pin(secs, true);
                self.emit(EngineEvent::TimeUpdate(secs));
            }
        }
    }

    /// Answer commands when no output device could be opened
    fn serve_without_device(&self, reason: &str) {
        while let Ok(command) = self.commands.recv() {
            match command {
                Command::Play => self.emit(EngineEvent::PlayFailed(reason.to_string())),
                Command::Seek(secs) => self.clock.pin(secs, false),
                Command::Pause => {}
                Command::Release => return,
            }
        }
    }
}

struct RodioHandle {
    commands: Option<std_mpsc::Sender<Command>>,
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
    clock: PlayClock,
    duration: Option<f64>,
}

impl RodioHandle {
    fn send(&self, command: Command) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(command);
        }
    }
}

impl PlaybackHandle for RodioHandle {
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.events.take()
    }

    fn play(&mut self) {
        self.send(Command::Play);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn position(&self) -> f64 {
        self.clock.now()
    }

    fn set_position(&mut self, secs: f64) {
        self.clock.jump(secs);
        self.send(Command::Seek(secs));
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn release(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Release);
        }
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        self.release();
    }
}
