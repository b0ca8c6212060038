//! Configuration domain module

mod app_config;

pub use app_config::{AppConfig, UploadFormat, DEFAULT_FRAME_RATE, DEFAULT_MODEL, MAX_FRAME_RATE};
