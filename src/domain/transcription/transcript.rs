//! Transcript value objects

use serde::{Deserialize, Serialize};

/// One timed segment of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub text: String,
    pub start_second: f64,
    pub end_second: f64,
}

/// Result returned by a transcription service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub language: Option<String>,
    pub duration_in_seconds: Option<f64>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Outcome of one transcription request as reported to the caller.
///
/// Serializes to `{success: true, text, segments?, language?, durationInSeconds?}`
/// or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptionReport {
    pub fn success(transcript: Transcript) -> Self {
        Self {
            success: true,
            text: Some(transcript.text),
            segments: (!transcript.segments.is_empty()).then_some(transcript.segments),
            language: transcript.language,
            duration_in_seconds: transcript.duration_in_seconds,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            segments: None,
            language: None,
            duration_in_seconds: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_report_json_shape() {
        let transcript = Transcript {
            text: "hello".to_string(),
            segments: vec![TranscriptSegment {
                text: "hello".to_string(),
                start_second: 0.0,
                end_second: 1.5,
            }],
            language: Some("english".to_string()),
            duration_in_seconds: Some(1.5),
        };

        let json = serde_json::to_value(TranscriptionReport::success(transcript)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["text"], "hello");
        assert_eq!(json["segments"][0]["startSecond"], 0.0);
        assert_eq!(json["segments"][0]["endSecond"], 1.5);
        assert_eq!(json["durationInSeconds"], 1.5);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_report_json_shape() {
        let json = serde_json::to_value(TranscriptionReport::failure("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn empty_segments_are_omitted() {
        let json = serde_json::to_value(TranscriptionReport::success(Transcript::new("hi"))).unwrap();
        assert!(json.get("segments").is_none());
        assert!(json.get("language").is_none());
    }
}
