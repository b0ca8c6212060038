//! OpenAI Whisper transcriber adapter

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::ports::{Transcriber, TranscriptionError};
use crate::domain::config::DEFAULT_MODEL;
use crate::domain::recording::RecordingBlob;
use crate::domain::transcription::{Transcript, TranscriptSegment};

/// OpenAI API base URL
const API_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT_SECS: u64 = 60;

// Response types for the transcription endpoint

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    text: String,
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenAI Whisper transcriber
pub struct OpenAiTranscriber {
    api_key: String,
    model: String,
    language: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
    /// Create a new transcriber with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            language: None,
            base_url: API_BASE_URL.to_string(),
            client,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// ISO-639-1 hint passed to the service
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Point the client at another API root (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the API URL
    fn api_url(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }

    /// Build the multipart body
    fn build_form(&self, audio: &RecordingBlob) -> Result<Form, TranscriptionError> {
        let file = Part::bytes(audio.data().to_vec())
            .file_name(audio.file_name())
            .mime_str(audio.mime_type().as_str())
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }
        Ok(form)
    }

    fn into_transcript(response: VerboseTranscription) -> Result<Transcript, TranscriptionError> {
        let text = response.text.trim();
        if text.is_empty() {
            return Err(TranscriptionError::EmptyResponse);
        }
        Ok(Transcript {
            text: text.to_string(),
            segments: response
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    text: s.text,
                    start_second: s.start,
                    end_second: s.end,
                })
                .collect(),
            language: response.language,
            duration_in_seconds: response.duration,
        })
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &RecordingBlob) -> Result<Transcript, TranscriptionError> {
        let form = self.build_form(audio)?;
        debug!(model = %self.model, bytes = audio.size_bytes(), "sending transcription request");

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let status = response.status();

        // Handle HTTP errors
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TranscriptionError::InvalidApiKey);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptionError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(TranscriptionError::ApiError(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let body: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;

        let transcript = Self::into_transcript(body)?;
        info!(
            chars = transcript.text.len(),
            segments = transcript.segments.len(),
            "transcription complete"
        );
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_uses_base() {
        let transcriber = OpenAiTranscriber::new("key").with_base_url("http://localhost:9999/v1/");
        assert_eq!(
            transcriber.api_url(),
            "http://localhost:9999/v1/audio/transcriptions"
        );
    }

    #[test]
    fn default_model_is_whisper() {
        let transcriber = OpenAiTranscriber::new("key");
        assert_eq!(transcriber.model, "whisper-1");
        assert!(transcriber.api_url().starts_with("https://api.openai.com/v1"));
    }

    #[test]
    fn verbose_response_maps_to_transcript() {
        let json = r#"{
            "text": " Hello there. ",
            "language": "english",
            "duration": 2.5,
            "segments": [{"id": 0, "text": " Hello there.", "start": 0.0, "end": 2.5}]
        }"#;
        let response: VerboseTranscription = serde_json::from_str(json).unwrap();
        let transcript = OpenAiTranscriber::into_transcript(response).unwrap();

        assert_eq!(transcript.text, "Hello there.");
        assert_eq!(transcript.language.as_deref(), Some("english"));
        assert_eq!(transcript.duration_in_seconds, Some(2.5));
        assert_eq!(transcript.segments[0].end_second, 2.5);
    }

    #[test]
    fn blank_text_is_empty_response() {
        let response: VerboseTranscription = serde_json::from_str(r#"{"text": "   "}"#).unwrap();
        assert!(matches!(
            OpenAiTranscriber::into_transcript(response),
            Err(TranscriptionError::EmptyResponse)
        ));
    }
}
