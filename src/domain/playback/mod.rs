//! Playback domain module

mod cursor;

pub use cursor::{is_valid_duration, DurationCell, PlaybackCursor, SKIP_STEP_SECS};
