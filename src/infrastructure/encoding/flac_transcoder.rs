//! FLAC upload transcoder
//!
//! Converts a finished WAV recording into speech-optimized FLAC:
//! - 16kHz sample rate
//! - Mono channel
//! - 16-bit samples

use std::io::Cursor;

use async_trait::async_trait;
use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use hound::{SampleFormat, WavReader};
use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::application::ports::{BlobTranscoder, EncoderError};
use crate::domain::recording::{AudioMimeType, RecordingBlob};

/// Target sample rate for speech-optimized encoding
pub const TARGET_SAMPLE_RATE: u32 = 16000;

const BITS_PER_SAMPLE: usize = 16;

const CHANNELS: usize = 1;

/// Encode mono 16kHz PCM samples to FLAC bytes
pub fn encode_to_flac(pcm_samples: &[i16]) -> Result<Vec<u8>, EncoderError> {
    // flacenc works on i32
    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncoderError::Transcode(format!("FLAC config error: {:?}", e)))?;

    let source = MemSource::from_samples(
        &samples_i32,
        CHANNELS,
        BITS_PER_SAMPLE,
        TARGET_SAMPLE_RATE as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncoderError::Transcode(format!("FLAC encoding failed: {:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| EncoderError::Transcode(format!("FLAC write failed: {}", e)))?;

    Ok(sink.into_inner())
}

/// Mix interleaved frames down to mono
fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Resample mono audio to 16kHz if needed
fn resample_to_16k(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, EncoderError> {
    if source_rate == TARGET_SAMPLE_RATE || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| EncoderError::Transcode(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());
        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        // Zero-pad the final partial chunk
        chunk.resize(frames_needed, 0.0);
        let waves = vec![chunk];

        let resampled = resampler
            .process(&waves, None)
            .map_err(|e| EncoderError::Transcode(format!("Resampling failed: {}", e)))?;

        output.extend(
            resampled[0]
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16),
        );
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}

/// WAV to FLAC transcoder for uploads
#[derive(Debug, Default, Clone, Copy)]
pub struct FlacTranscoder;

impl FlacTranscoder {
    pub fn new() -> Self {
        Self
    }

    fn transcode_blocking(bytes: &[u8]) -> Result<Vec<u8>, EncoderError> {
        let unreadable =
            |e: hound::Error| EncoderError::Transcode(format!("recording is not a readable WAV: {}", e));

        let mut reader = WavReader::new(Cursor::new(bytes)).map_err(unreadable)?;
        let spec = reader.spec();
        let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) => reader
                .samples::<i16>()
                .collect::<Result<_, _>>()
                .map_err(unreadable)?,
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
                .collect::<Result<_, _>>()
                .map_err(unreadable)?,
            (format, bits) => {
                return Err(EncoderError::Transcode(format!(
                    "unsupported WAV samples: {}-bit {:?}",
                    bits, format
                )))
            }
        };

        let mono = downmix(&samples, spec.channels);
        let resampled = resample_to_16k(&mono, spec.sample_rate)?;
        encode_to_flac(&resampled)
    }
}

#[async_trait]
impl BlobTranscoder for FlacTranscoder {
    async fn transcode(&self, blob: &RecordingBlob) -> Result<RecordingBlob, EncoderError> {
        if blob.mime_type() == AudioMimeType::Flac {
            return Ok(blob.clone());
        }
        if blob.mime_type() != AudioMimeType::Wav {
            return Err(EncoderError::Transcode(format!(
                "cannot transcode {} to FLAC",
                blob.mime_type()
            )));
        }

        let data = blob.shared_data();
        let flac = tokio::task::spawn_blocking(move || Self::transcode_blocking(&data))
            .await
            .map_err(|e| EncoderError::Transcode(format!("transcode task failed: {}", e)))??;

        debug!(
            wav_bytes = blob.size_bytes(),
            flac_bytes = flac.len(),
            "recording transcoded"
        );
        Ok(RecordingBlob::new(flac, AudioMimeType::Flac))
    }
}
