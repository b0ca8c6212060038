//! 16-bit PCM WAV container, read and written with hound
//!
//! The capture encoder streams a header with placeholder sizes in its first
//! slice and raw little-endian PCM after it. `assemble` turns the joined
//! slices back into a finished file with the real sizes.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Sample width written by the capture encoder
pub const BITS_PER_SAMPLE: u16 = 16;

const BYTES_PER_SAMPLE: u32 = (BITS_PER_SAMPLE / 8) as u32;

/// PCM stream layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl WavFormat {
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        }
    }

    /// Layout of a 16-bit integer spec; anything else is unsupported
    pub fn from_spec(spec: WavSpec) -> Result<Self, hound::Error> {
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != BITS_PER_SAMPLE {
            return Err(hound::Error::Unsupported);
        }
        Ok(Self::new(spec.sample_rate, spec.channels))
    }

    /// Bytes of PCM data per second of audio
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * BYTES_PER_SAMPLE
    }

    /// Seconds of audio in `samples` interleaved samples
    pub fn duration_secs(&self, samples: usize) -> f64 {
        let per_second = f64::from(self.sample_rate) * f64::from(self.channels);
        if per_second == 0.0 {
            return 0.0;
        }
        samples as f64 / per_second
    }

    /// Header of a stream whose PCM follows in later writes. Sizes are zero.
    pub fn stream_header(&self) -> Result<Vec<u8>, hound::Error> {
        encode(*self, &[])
    }
}

/// Write `samples` as a complete WAV file
pub fn encode(format: WavFormat, samples: &[i16]) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, format.spec())?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

/// Read a WAV file into its layout and interleaved samples
pub fn decode(bytes: &[u8]) -> Result<(WavFormat, Vec<i16>), hound::Error> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let format = WavFormat::from_spec(reader.spec())?;
    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    Ok((format, samples))
}

/// Rewrite a header-plus-PCM stream as a finished file.
///
/// Only the header is parsed; every byte after it is PCM regardless of the
/// sizes the header declares. A trailing odd byte is dropped.
pub fn assemble(stream: &[u8]) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = Cursor::new(stream);
    let spec = WavReader::new(&mut cursor)?.spec();
    let format = WavFormat::from_spec(spec)?;
    let data_start = usize::try_from(cursor.position()).unwrap_or(stream.len());
    let pcm = stream.get(data_start..).unwrap_or_default();
    encode(format, &pcm_samples(pcm))
}

/// Append little-endian PCM samples to a byte buffer
pub fn extend_pcm(buf: &mut Vec<u8>, samples: &[i16]) {
    buf.reserve(samples.len() * 2);
    for s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }
}

/// Decode little-endian PCM bytes into samples (a trailing odd byte is dropped)
pub fn pcm_samples(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_header_declares_no_data() {
        let format = WavFormat::new(16_000, 1);
        let header = format.stream_header().unwrap();

        let reader = WavReader::new(Cursor::new(&header)).unwrap();
        assert_eq!(reader.spec(), format.spec());
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn assemble_fixes_placeholder_sizes() {
        let format = WavFormat::new(8_000, 1);
        let mut stream = format.stream_header().unwrap();
        extend_pcm(&mut stream, &[1, 2]);
        extend_pcm(&mut stream, &[3, 4]);

        let file = assemble(&stream).unwrap();
        let (parsed, samples) = decode(&file).unwrap();
        assert_eq!(parsed, format);
        assert_eq!(samples, vec![1, 2, 3, 4]);
    }

    #[test]
    fn assemble_rejects_foreign_bytes() {
        assert!(assemble(b"fLaC and some more bytes that are long enough....").is_err());
        assert!(decode(b"not a wav").is_err());
    }

    #[test]
    fn decode_rejects_float_samples() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(decode(cursor.get_ref()), Err(hound::Error::Unsupported)));
    }

    #[test]
    fn duration_from_sample_count() {
        let stereo = WavFormat::new(16_000, 2);
        assert!((stereo.duration_secs(32_000) - 1.0).abs() < f64::EPSILON);
        assert_eq!(WavFormat::new(0, 1).duration_secs(100), 0.0);
        assert_eq!(WavFormat::new(16_000, 1).byte_rate(), 32_000);
    }
}
