//! Playback cursor and duration cell

/// Distance covered by one skip gesture
pub const SKIP_STEP_SECS: f64 = 10.0;

/// A duration is usable only when finite and strictly positive
pub fn is_valid_duration(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0
}

/// Best-known duration of a recording.
///
/// Two sources feed it: `offer` (first valid value wins, later offers are
/// ignored) and `refine` (overwrites with any valid value).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationCell {
    value: Option<f64>,
}

impl DurationCell {
    pub fn get(&self) -> Option<f64> {
        self.value
    }

    pub fn is_known(&self) -> bool {
        self.value.is_some()
    }

    /// Record `secs` if nothing valid is known yet. Returns true if stored.
    pub fn offer(&mut self, secs: f64) -> bool {
        if self.value.is_some() || !is_valid_duration(secs) {
            return false;
        }
        self.value = Some(secs);
        true
    }

    /// Overwrite with `secs` if valid. Returns true if the value changed.
    pub fn refine(&mut self, secs: f64) -> bool {
        if !is_valid_duration(secs) || self.value == Some(secs) {
            return false;
        }
        self.value = Some(secs);
        true
    }
}

/// Playback position model for one loaded recording
#[derive(Debug, Clone, Default)]
pub struct PlaybackCursor {
    position: f64,
    duration: DurationCell,
    playing: bool,
    scrubbing: bool,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position in seconds
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration.get()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn begin_scrub(&mut self) {
        self.scrubbing = true;
    }

    pub fn end_scrub(&mut self) {
        self.scrubbing = false;
    }

    /// Duration from the decode probe (first valid wins)
    pub fn offer_duration(&mut self, secs: f64) -> bool {
        let stored = self.duration.offer(secs);
        if stored {
            self.clamp_position();
        }
        stored
    }

    /// Duration reported by the playback handle
    pub fn refine_duration(&mut self, secs: f64) -> bool {
        let changed = self.duration.refine(secs);
        if changed {
            self.clamp_position();
        }
        changed
    }

    /// Position reported by the engine or the frame loop.
    /// Ignored while scrubbing; returns whether it was applied.
    pub fn engine_position(&mut self, secs: f64) -> bool {
        if self.scrubbing || !secs.is_finite() {
            return false;
        }
        self.position = self.bounded(secs);
        true
    }

    /// Position chosen by the user (seek or skip)
    pub fn set_position(&mut self, secs: f64) {
        if secs.is_finite() {
            self.position = self.bounded(secs);
        }
    }

    /// Target position for a seek to `percent` of the known duration.
    /// None when the duration is unknown.
    pub fn seek_target(&self, percent: f64) -> Option<f64> {
        let duration = self.duration.get()?;
        if !percent.is_finite() {
            return None;
        }
        Some(percent.clamp(0.0, 100.0) / 100.0 * duration)
    }

    /// Target position for a skip of `delta` seconds.
    ///
    /// The upper bound is the engine-reported duration when valid, else the
    /// last known estimate, which is 0 until one arrives.
    pub fn skip_target(&self, current: f64, delta: f64, engine_duration: Option<f64>) -> f64 {
        let upper = engine_duration
            .filter(|d| is_valid_duration(*d))
            .or(self.duration.get())
            .unwrap_or(0.0);
        (current + delta).min(upper).max(0.0)
    }

    /// Playback reached the end: rewind and stop, recording stays loaded
    pub fn ended(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    /// Progress as a percentage, 0 when the duration is unknown
    pub fn percent(&self) -> f64 {
        match self.duration.get() {
            Some(d) => (self.position / d * 100.0).min(100.0),
            None => 0.0,
        }
    }

    fn bounded(&self, secs: f64) -> f64 {
        let lower = secs.max(0.0);
        match self.duration.get() {
            Some(d) => lower.min(d),
            None => lower,
        }
    }

    fn clamp_position(&mut self) {
        self.position = self.bounded(self.position);
    }
}
