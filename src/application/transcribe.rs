//! Transcribe recording use case

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::config::UploadFormat;
use crate::domain::recording::{AudioMimeType, RecordingBlob};
use crate::domain::transcription::{Transcript, TranscriptionReport};

use super::ports::{BlobTranscoder, EncoderError, Transcriber, TranscriptionError};

/// Errors from the transcribe use case
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("No audio recorded")]
    NoRecording,

    #[error("Failed to prepare audio: {0}")]
    Transcode(#[from] EncoderError),

    #[error("{0}")]
    Transcription(#[from] TranscriptionError),
}

/// Input parameters for the transcribe use case
#[derive(Debug, Clone, Default)]
pub struct TranscribeInput {
    /// Container to upload
    pub upload_format: UploadFormat,
}

/// Output from the transcribe use case
#[derive(Debug, Clone)]
pub struct TranscribeOutput {
    pub transcript: Transcript,
    /// Uploaded payload size in human-readable format
    pub upload_size: String,
}

/// Hand a finished recording to the transcription service, once.
pub struct TranscribeRecordingUseCase<T, X>
where
    T: Transcriber,
    X: BlobTranscoder,
{
    transcriber: Option<T>,
    transcoder: X,
}

impl<T, X> TranscribeRecordingUseCase<T, X>
where
    T: Transcriber,
    X: BlobTranscoder,
{
    /// Create a new use case instance. A missing transcriber means no
    /// credentials were configured.
    pub fn new(transcriber: Option<T>, transcoder: X) -> Self {
        Self {
            transcriber,
            transcoder,
        }
    }

    /// Execute the transcription workflow
    pub async fn execute(
        &self,
        recording: Option<&RecordingBlob>,
        input: &TranscribeInput,
    ) -> Result<TranscribeOutput, TranscribeError> {
        let transcriber = self.transcriber.as_ref().ok_or(TranscribeError::MissingApiKey)?;
        let recording = recording
            .filter(|blob| !blob.is_empty())
            .ok_or(TranscribeError::NoRecording)?;

        let upload = self.prepare(recording, input.upload_format).await?;
        let upload_size = upload.human_readable_size();
        info!(mime = %upload.mime_type(), size = %upload_size, "uploading recording");

        let transcript = transcriber.transcribe(&upload).await?;
        debug!(chars = transcript.text.len(), "transcript received");

        Ok(TranscribeOutput {
            transcript,
            upload_size,
        })
    }

    /// Execute and fold the outcome into a report
    pub async fn report(
        &self,
        recording: Option<&RecordingBlob>,
        input: &TranscribeInput,
    ) -> TranscriptionReport {
        match self.execute(recording, input).await {
            Ok(output) => TranscriptionReport::success(output.transcript),
            Err(e) => TranscriptionReport::failure(e.to_string()),
        }
    }

    async fn prepare(
        &self,
        recording: &RecordingBlob,
        format: UploadFormat,
    ) -> Result<RecordingBlob, TranscribeError> {
        let wants_transcode =
            format == UploadFormat::Flac && recording.mime_type() == AudioMimeType::Wav;
        if !wants_transcode {
            return Ok(recording.clone());
        }
        Ok(self.transcoder.transcode(recording).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockTranscriber {
        seen: Mutex<Vec<AudioMimeType>>,
        result: Result<Transcript, TranscriptionError>,
    }

    impl MockTranscriber {
        fn ok(text: &str) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                result: Ok(Transcript::new(text)),
            }
        }

        fn failing(error: TranscriptionError) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                result: Err(error),
            }
        }
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, audio: &RecordingBlob) -> Result<Transcript, TranscriptionError> {
            self.seen.lock().unwrap().push(audio.mime_type());
            self.result.clone()
        }
    }

    struct MockTranscoder;

    #[async_trait]
    impl BlobTranscoder for MockTranscoder {
        async fn transcode(&self, blob: &RecordingBlob) -> Result<RecordingBlob, EncoderError> {
            Ok(RecordingBlob::new(blob.data()[..1].to_vec(), AudioMimeType::Flac))
        }
    }

    fn wav() -> RecordingBlob {
        RecordingBlob::new(vec![0u8; 100], AudioMimeType::Wav)
    }

    #[tokio::test]
    async fn execute_returns_transcript() {
        let use_case = TranscribeRecordingUseCase::new(Some(MockTranscriber::ok("hello")), MockTranscoder);
        let output = use_case
            .execute(Some(&wav()), &TranscribeInput::default())
            .await
            .unwrap();
        assert_eq!(output.transcript.text, "hello");
        assert_eq!(output.upload_size, "1 B");
    }

    #[tokio::test]
    async fn wav_upload_skips_transcoding() {
        let transcriber = MockTranscriber::ok("hello");
        let use_case = TranscribeRecordingUseCase::new(Some(transcriber), MockTranscoder);
        let input = TranscribeInput {
            upload_format: UploadFormat::Wav,
        };
        let output = use_case.execute(Some(&wav()), &input).await.unwrap();
        assert_eq!(output.upload_size, "100 B");
        let seen = use_case.transcriber.as_ref().unwrap().seen.lock().unwrap().clone();
        assert_eq!(seen, vec![AudioMimeType::Wav]);
    }

    #[tokio::test]
    async fn missing_api_key_is_reported() {
        let use_case: TranscribeRecordingUseCase<MockTranscriber, _> =
            TranscribeRecordingUseCase::new(None, MockTranscoder);
        let report = use_case.report(Some(&wav()), &TranscribeInput::default()).await;
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("OPENAI_API_KEY is not set"));
    }

    #[tokio::test]
    async fn empty_recording_is_rejected() {
        let use_case = TranscribeRecordingUseCase::new(Some(MockTranscriber::ok("x")), MockTranscoder);
        let err = use_case
            .execute(None, &TranscribeInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TranscribeError::NoRecording));

        let empty = RecordingBlob::new(Vec::new(), AudioMimeType::Wav);
        let report = use_case.report(Some(&empty), &TranscribeInput::default()).await;
        assert_eq!(report.error.as_deref(), Some("No audio recorded"));
    }

    #[tokio::test]
    async fn service_failure_is_reported_once() {
        let use_case = TranscribeRecordingUseCase::new(
            Some(MockTranscriber::failing(TranscriptionError::RateLimited)),
            MockTranscoder,
        );
        let report = use_case.report(Some(&wav()), &TranscribeInput::default()).await;
        assert!(!report.success);
        assert!(report.error.unwrap().contains("Rate limit"));
        let calls = use_case.transcriber.as_ref().unwrap().seen.lock().unwrap().len();
        assert_eq!(calls, 1);
    }
}
