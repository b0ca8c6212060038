//! Recording state machine

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Recorded,
}

impl RecordingState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Recorded => "recorded",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: RecordingState,
    pub action: String,
}

/// Voice session entity.
/// Single source of truth for which lifecycle phase the controller is in.
///
/// State machine:
///   IDLE -> RECORDING (start_recording)
///   RECORDING -> RECORDED (finish_recording)
///   RECORDING -> IDLE (abort_recording, fatal encoder error)
///   RECORDED -> IDLE (delete_recording)
///
/// There is no RECORDED -> RECORDING edge; re-recording passes through IDLE.
#[derive(Debug, Default)]
pub struct VoiceSession {
    state: RecordingState,
}

impl VoiceSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RecordingState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn is_recorded(&self) -> bool {
        self.state == RecordingState::Recorded
    }

    /// Transition from IDLE to RECORDING
    pub fn start_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecordingState::Idle, RecordingState::Recording, "start recording")
    }

    /// Transition from RECORDING to RECORDED
    pub fn finish_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            RecordingState::Recording,
            RecordingState::Recorded,
            "finish recording",
        )
    }

    /// Transition from RECORDING to IDLE, discarding the capture
    pub fn abort_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecordingState::Recording, RecordingState::Idle, "abort recording")
    }

    /// Transition from RECORDED to IDLE
    pub fn delete_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecordingState::Recorded, RecordingState::Idle, "delete recording")
    }

    fn transition(
        &mut self,
        from: RecordingState,
        to: RecordingState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle() {
        let session = VoiceSession::new();
        assert!(session.is_idle());
        assert!(!session.is_recording());
        assert!(!session.is_recorded());
    }

    #[test]
    fn start_then_finish() {
        let mut session = VoiceSession::new();
        session.start_recording().unwrap();
        assert!(session.is_recording());
        session.finish_recording().unwrap();
        assert!(session.is_recorded());
    }

    #[test]
    fn start_while_recording_fails() {
        let mut session = VoiceSession::new();
        session.start_recording().unwrap();

        let err = session.start_recording().unwrap_err();
        assert_eq!(err.current_state, RecordingState::Recording);
        assert!(err.action.contains("start recording"));
    }

    #[test]
    fn recorded_cannot_start_directly() {
        let mut session = VoiceSession::new();
        session.start_recording().unwrap();
        session.finish_recording().unwrap();

        let err = session.start_recording().unwrap_err();
        assert_eq!(err.current_state, RecordingState::Recorded);

        session.delete_recording().unwrap();
        assert!(session.start_recording().is_ok());
    }

    #[test]
    fn abort_returns_to_idle() {
        let mut session = VoiceSession::new();
        session.start_recording().unwrap();
        session.abort_recording().unwrap();
        assert!(session.is_idle());
    }

    #[test]
    fn finish_from_idle_fails() {
        let mut session = VoiceSession::new();
        let err = session.finish_recording().unwrap_err();
        assert_eq!(err.current_state, RecordingState::Idle);
    }

    #[test]
    fn delete_from_recording_fails() {
        let mut session = VoiceSession::new();
        session.start_recording().unwrap();
        let err = session.delete_recording().unwrap_err();
        assert_eq!(err.current_state, RecordingState::Recording);
    }

    #[test]
    fn state_display() {
        assert_eq!(RecordingState::Idle.to_string(), "idle");
        assert_eq!(RecordingState::Recording.to_string(), "recording");
        assert_eq!(RecordingState::Recorded.to_string(), "recorded");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: RecordingState::Recorded,
            action: "start recording".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start recording"));
        assert!(msg.contains("recorded"));
    }
}
