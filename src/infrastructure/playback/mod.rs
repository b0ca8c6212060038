//! Playback and decoding adapters

mod rodio_decoder;
mod rodio_engine;

pub use rodio_decoder::RodioDecoder;
pub use rodio_engine::RodioPlaybackEngine;
