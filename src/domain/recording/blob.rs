//! Recording blob value object

use std::fmt;
use std::sync::Arc;

use super::wav;

/// Supported audio MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMimeType {
    #[default]
    Wav,
    Flac,
    Ogg,
    Webm,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
            Self::Webm => "audio/webm",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Webm => "webm",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One finished recording: an opaque, content-type tagged byte payload.
/// Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone)]
pub struct RecordingBlob {
    data: Arc<[u8]>,
    mime_type: AudioMimeType,
}

impl RecordingBlob {
    /// Create a blob from raw bytes
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self {
            data: data.into(),
            mime_type,
        }
    }

    /// Concatenate encoder chunks, in order, into one blob.
    /// WAV streams are rewritten with their real sizes; a stream without a
    /// readable header is kept as joined.
    pub fn from_chunks(chunks: Vec<Vec<u8>>, mime_type: AudioMimeType) -> Self {
        let data = chunks.concat();
        if mime_type == AudioMimeType::Wav {
            if let Ok(file) = wav::assemble(&data) {
                return Self::new(file, mime_type);
            }
        }
        Self::new(data, mime_type)
    }

    /// Get the raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the raw bytes
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File name used when the blob is handed off as a file-like payload
    pub fn file_name(&self) -> String {
        format!("recording.{}", self.mime_type.extension())
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::wav::WavFormat;

    #[test]
    fn mime_type_strings() {
        assert_eq!(AudioMimeType::Wav.as_str(), "audio/wav");
        assert_eq!(AudioMimeType::Flac.extension(), "flac");
        assert_eq!(AudioMimeType::default(), AudioMimeType::Wav);
    }

    #[test]
    fn from_chunks_preserves_order_and_fixes_sizes() {
        let format = WavFormat::new(16_000, 1);
        let mut first = format.stream_header().unwrap();
        let header_len = first.len();
        first.extend_from_slice(&[1, 0]);
        let second = vec![2, 0, 3, 0];

        let blob = RecordingBlob::from_chunks(vec![first, second], AudioMimeType::Wav);
        let (_, samples) = wav::decode(blob.data()).unwrap();
        assert_eq!(samples, vec![1, 2, 3]);
        assert_eq!(blob.size_bytes(), header_len + 6);
    }

    #[test]
    fn from_chunks_keeps_unreadable_wav_as_joined() {
        let blob = RecordingBlob::from_chunks(vec![vec![9, 9], vec![9]], AudioMimeType::Wav);
        assert_eq!(blob.data(), &[9, 9, 9]);
    }

    #[test]
    fn from_chunks_leaves_other_formats_untouched() {
        let blob = RecordingBlob::from_chunks(vec![vec![1, 2], vec![3]], AudioMimeType::Ogg);
        assert_eq!(blob.data(), &[1, 2, 3]);
    }

    #[test]
    fn clones_share_bytes() {
        let blob = RecordingBlob::new(vec![0u8; 10], AudioMimeType::Wav);
        let other = blob.clone();
        assert!(Arc::ptr_eq(&blob.shared_data(), &other.shared_data()));
    }

    #[test]
    fn human_readable_sizes() {
        assert_eq!(RecordingBlob::new(vec![0; 500], AudioMimeType::Wav).human_readable_size(), "500 B");
        assert_eq!(RecordingBlob::new(vec![0; 2048], AudioMimeType::Wav).human_readable_size(), "2.0 KB");
        assert_eq!(
            RecordingBlob::new(vec![0; 2 * 1024 * 1024], AudioMimeType::Wav).human_readable_size(),
            "2.0 MB"
        );
    }

    #[test]
    fn file_name_uses_extension() {
        let blob = RecordingBlob::new(vec![], AudioMimeType::Flac);
        assert_eq!(blob.file_name(), "recording.flac");
        assert!(blob.is_empty());
    }
}
