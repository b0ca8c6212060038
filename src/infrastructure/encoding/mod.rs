//! Audio encoding adapters

mod flac_transcoder;
mod wav_encoder;

pub use flac_transcoder::{encode_to_flac, FlacTranscoder, TARGET_SAMPLE_RATE};
pub use wav_encoder::WavChunkEncoder;
