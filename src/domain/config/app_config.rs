//! Application configuration value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidUploadFormatError;
use crate::domain::recording::{AudioMimeType, Duration};

/// Default frame cadence for the meter and position loops
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Upper bound accepted for `frame_rate`
pub const MAX_FRAME_RATE: u32 = 240;

/// Default transcription model
pub const DEFAULT_MODEL: &str = "whisper-1";

/// Container used when a recording is handed to the transcription service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadFormat {
    /// Resample to 16 kHz mono and encode as FLAC
    #[default]
    Flac,
    /// Send the recorded WAV bytes untouched
    Wav,
}

impl UploadFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }

    pub const fn mime_type(&self) -> AudioMimeType {
        match self {
            Self::Flac => AudioMimeType::Flac,
            Self::Wav => AudioMimeType::Wav,
        }
    }
}

impl FromStr for UploadFormat {
    type Err = InvalidUploadFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flac" => Ok(Self::Flac),
            "wav" => Ok(Self::Wav),
            _ => Err(InvalidUploadFormatError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for UploadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub max_duration: Option<String>,
    pub frame_rate: Option<u32>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub upload_format: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            max_duration: Some(Duration::default_max_duration().to_string()),
            frame_rate: Some(DEFAULT_FRAME_RATE),
            model: Some(DEFAULT_MODEL.to_string()),
            language: None,
            upload_format: Some(UploadFormat::default().to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            max_duration: other.max_duration.or(self.max_duration),
            frame_rate: other.frame_rate.or(self.frame_rate),
            model: other.model.or(self.model),
            language: other.language.or(self.language),
            upload_format: other.upload_format.or(self.upload_format),
        }
    }

    /// Get max_duration as parsed Duration, or default if not set/invalid
    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_duration)
    }

    /// Get frame rate, or 60 if not set/out of range
    pub fn frame_rate_or_default(&self) -> u32 {
        self.frame_rate
            .filter(|r| (1..=MAX_FRAME_RATE).contains(r))
            .unwrap_or(DEFAULT_FRAME_RATE)
    }

    /// Interval between frames derived from the frame rate
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / u64::from(self.frame_rate_or_default()))
    }

    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Language hint, ignoring blank values
    pub fn language_hint(&self) -> Option<&str> {
        self.language.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Get upload format, or FLAC if not set/invalid
    pub fn upload_format_or_default(&self) -> UploadFormat {
        self.upload_format
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}
