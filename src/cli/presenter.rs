//! CLI presenter for output formatting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::VoiceSnapshot;
use crate::domain::recording::{format_clock_ms, RecordingState};

const BAR_WIDTH: usize = 20;
const METER_WIDTH: usize = 10;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    pub fn is_spinner_active(&self) -> bool {
        self.is_spinner_active.load(Ordering::SeqCst)
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(format!("{} {}", "✓".green(), message)),
            None => self.success(message),
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(format!("{} {}", "✗".red(), message)),
            None => self.error(message),
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (transcripts and machine-readable output)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list and status)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print the command reference
    pub fn help(&self, entries: &[(&str, &str)]) {
        for (command, description) in entries {
            eprintln!("  {:<24} {}", command.cyan(), description);
        }
    }

    /// Format a fill bar for a 0..100 percentage
    pub fn format_bar(&self, percent: f64, width: usize) -> String {
        let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64) as usize;
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }

    /// Recording progress as `[bar] elapsed / max`
    pub fn format_progress(&self, elapsed_ms: u64, total_ms: u64) -> String {
        let percent = if total_ms > 0 {
            (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        format!(
            "[{}] {} / {}",
            self.format_bar(percent, BAR_WIDTH).cyan(),
            format_clock_ms(elapsed_ms as f64),
            format_clock_ms(total_ms as f64)
        )
    }

    /// Volume meter for a 0..100 level
    pub fn format_level(&self, level: u8) -> String {
        self.format_bar(f64::from(level), METER_WIDTH)
    }

    fn recording_line(&self, snapshot: &VoiceSnapshot) -> String {
        format!(
            "Recording {} {}",
            self.format_progress(snapshot.elapsed_ms, snapshot.max_duration_ms),
            self.format_level(snapshot.volume_level).green()
        )
    }

    fn playback_line(&self, snapshot: &VoiceSnapshot) -> String {
        format!(
            "Playing [{}] {} / {}",
            self.format_bar(snapshot.progress_percent(), BAR_WIDTH).cyan(),
            snapshot.position_clock(),
            snapshot.duration_clock()
        )
    }

    /// Reflect a snapshot change on the terminal
    pub fn render_transition(&mut self, previous: &VoiceSnapshot, current: &VoiceSnapshot) {
        if current.error != previous.error {
            if let Some(error) = &current.error {
                self.stop_spinner();
                self.error(error);
            }
        }

        match (previous.state, current.state) {
            (RecordingState::Recording, RecordingState::Recorded) => {
                let size = current
                    .recording_size
                    .map(|s| format!(" ({} bytes)", s))
                    .unwrap_or_default();
                self.spinner_success(&format!("Recorded {}{}", current.elapsed_clock(), size));
            }
            (RecordingState::Recording, RecordingState::Idle) => self.stop_spinner(),
            (RecordingState::Recorded, RecordingState::Idle) => {
                self.stop_spinner();
                self.info("Recording discarded");
            }
            _ => {}
        }

        match current.state {
            RecordingState::Idle if current.acquiring && !previous.acquiring => {
                self.start_spinner("Waiting for microphone...");
            }
            RecordingState::Idle if previous.acquiring && !current.acquiring => {
                self.stop_spinner();
            }
            RecordingState::Recording => {
                if !self.is_spinner_active() {
                    self.start_spinner("Recording");
                }
                self.update_spinner(&self.recording_line(current));
            }
            RecordingState::Recorded if current.playing => {
                if !previous.playing || !self.is_spinner_active() {
                    self.start_spinner("Playing");
                }
                self.update_spinner(&self.playback_line(current));
            }
            RecordingState::Recorded if previous.playing && previous.state == current.state => {
                self.stop_spinner();
                self.info(&format!(
                    "Paused at {} / {}",
                    current.position_clock(),
                    current.duration_clock()
                ));
            }
            _ => {}
        }
    }

    /// Print the full controller state
    pub fn status(&self, snapshot: &VoiceSnapshot) {
        self.key_value("state", &snapshot.state.to_string());
        match snapshot.state {
            RecordingState::Idle => {
                if snapshot.acquiring {
                    self.key_value("microphone", "acquiring");
                }
            }
            RecordingState::Recording => {
                self.key_value(
                    "elapsed",
                    &format!("{} / {}", snapshot.elapsed_clock(), snapshot.max_clock()),
                );
                self.key_value("level", &snapshot.volume_level.to_string());
            }
            RecordingState::Recorded => {
                self.key_value(
                    "position",
                    &format!(
                        "{} / {}",
                        snapshot.position_clock(),
                        snapshot.duration_clock()
                    ),
                );
                self.key_value("playing", &snapshot.playing.to_string());
                if let Some(size) = snapshot.recording_size {
                    self.key_value("size", &format!("{} bytes", size));
                }
            }
        }
        if let Some(error) = &snapshot.error {
            self.key_value("error", error);
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
