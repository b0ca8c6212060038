//! Full-decode duration prober using rodio's decoders

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use rodio::{Decoder, Source};
use tracing::debug;

use crate::application::ports::{AudioDecoder, DecodeError};

/// Decodes a whole recording to measure its length
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioDecoder;

impl RodioDecoder {
    pub fn new() -> Self {
        Self
    }

    fn measure(data: Arc<[u8]>) -> Result<f64, DecodeError> {
        let decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
        let channels = u64::from(decoder.channels());
        let sample_rate = u64::from(decoder.sample_rate());
        if channels == 0 || sample_rate == 0 {
            return Err(DecodeError::Failed("stream has no audio".into()));
        }

        let samples = decoder.count() as u64;
        Ok(samples as f64 / (channels * sample_rate) as f64)
    }
}

#[async_trait]
impl AudioDecoder for RodioDecoder {
    async fn decode_duration(&self, data: Arc<[u8]>) -> Result<f64, DecodeError> {
        let secs = tokio::task::spawn_blocking(move || Self::measure(data))
            .await
            .map_err(|e| DecodeError::Failed(e.to_string()))??;
        debug!(secs, "decoded recording duration");
        Ok(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::wav::{self, WavFormat};

    #[tokio::test]
    async fn measures_wav_length() {
        let bytes = wav::encode(WavFormat::new(16_000, 2), &vec![0i16; 48_000]).unwrap();

        let secs = RodioDecoder::new().decode_duration(bytes.into()).await.unwrap();
        assert!((secs - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn garbage_is_unsupported() {
        let result = RodioDecoder::new().decode_duration(vec![9u8; 32].into()).await;
        assert!(matches!(result, Err(DecodeError::Unsupported(_))));
    }
}
