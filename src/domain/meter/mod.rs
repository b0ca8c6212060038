//! Volume metering domain module

mod analyser;

pub use analyser::{normalize_level, VolumeAnalyser, BIN_COUNT, FFT_SIZE};
