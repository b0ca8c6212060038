//! Transcription port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::RecordingBlob;
use crate::domain::transcription::Transcript;

/// Transcription errors
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Empty transcription response")]
    EmptyResponse,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Port for audio transcription
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a finished recording.
    ///
    /// # Arguments
    /// * `audio` - Opaque recording bytes tagged with their content type
    ///
    /// # Returns
    /// The transcript or an error
    async fn transcribe(&self, audio: &RecordingBlob) -> Result<Transcript, TranscriptionError>;
}
