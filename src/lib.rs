//! voicenote - record, review and transcribe short voice notes
//!
//! This crate provides a voice capture and playback controller: record from
//! the microphone with a live volume meter and a hard length limit, play the
//! take back with seeking, then hand it off for transcription.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the recording state machine, playback cursor
//!   and level analysis
//! - **Application**: The voice controller, its sessions, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, flacenc, OpenAI, XDG config)
//! - **CLI**: Argument parsing, interactive session and output formatting

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
