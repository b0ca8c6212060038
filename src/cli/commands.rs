//! Interactive session commands
//!
//! One command per input line, e.g. `seek 50`, `skip -10`, `scrub begin`.

use std::str::FromStr;

use thiserror::Error;

/// A command typed at the session prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    Start,
    Stop,
    Delete,
    Play,
    Pause,
    Toggle,
    /// Jump to a percentage of the recording
    Seek(f64),
    /// Move by signed seconds
    Skip(f64),
    ScrubBegin,
    ScrubEnd,
    Status,
    Transcribe { json: bool },
    Help,
    Quit,
}

/// Errors from parsing a session line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandParseError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands")]
    Unknown(String),

    #[error("'{command}' needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// Help lines shown by the `help` command
pub const HELP: &[(&str, &str)] = &[
    ("start", "start recording (discards a held recording)"),
    ("stop", "stop recording"),
    ("delete", "discard the recording"),
    ("play | pause | toggle", "control playback"),
    ("seek <0-100>", "jump to a percentage of the recording"),
    ("skip <secs>", "move forward or back, e.g. skip -10"),
    ("scrub begin | end", "hold position updates while dragging"),
    ("status", "show the current state"),
    ("transcribe [--json]", "send the recording for transcription"),
    ("help", "show this help"),
    ("quit", "exit"),
];

fn number(command: &'static str, arg: Option<&str>) -> Result<f64, CommandParseError> {
    let raw = arg.ok_or(CommandParseError::MissingArgument {
        command,
        expected: "a number",
    })?;
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| CommandParseError::InvalidNumber(raw.to_string()))
}

impl SessionCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, CommandParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

impl FromStr for SessionCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let head = words.next().unwrap_or_default().to_lowercase();
        let arg = words.next();

        let command = match head.as_str() {
            "start" | "record" => Self::Start,
            "stop" => Self::Stop,
            "delete" | "discard" => Self::Delete,
            "play" => Self::Play,
            "pause" => Self::Pause,
            "toggle" => Self::Toggle,
            "seek" => Self::Seek(number("seek", arg)?),
            "skip" => Self::Skip(number("skip", arg)?),
            "scrub" => match arg.map(str::to_lowercase).as_deref() {
                Some("begin") => Self::ScrubBegin,
                Some("end") => Self::ScrubEnd,
                Some(other) => return Err(CommandParseError::UnexpectedArgument(other.into())),
                None => {
                    return Err(CommandParseError::MissingArgument {
                        command: "scrub",
                        expected: "'begin' or 'end'",
                    })
                }
            },
            "status" => Self::Status,
            "transcribe" => match arg {
                None => Self::Transcribe { json: false },
                Some("--json") => Self::Transcribe { json: true },
                Some(other) => return Err(CommandParseError::UnexpectedArgument(other.into())),
            },
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => return Err(CommandParseError::Unknown(head)),
        };

        let takes_arg = matches!(
            command,
            Self::Seek(_) | Self::Skip(_) | Self::ScrubBegin | Self::ScrubEnd | Self::Transcribe { .. }
        );
        let extra = if takes_arg { words.next() } else { arg };
        match extra {
            Some(extra) => Err(CommandParseError::UnexpectedArgument(extra.to_string())),
            None => Ok(command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!("start".parse(), Ok(SessionCommand::Start));
        assert_eq!("STOP".parse(), Ok(SessionCommand::Stop));
        assert_eq!("discard".parse(), Ok(SessionCommand::Delete));
        assert_eq!("toggle".parse(), Ok(SessionCommand::Toggle));
        assert_eq!("exit".parse(), Ok(SessionCommand::Quit));
    }

    #[test]
    fn parses_numeric_arguments() {
        assert_eq!("seek 50".parse(), Ok(SessionCommand::Seek(50.0)));
        assert_eq!("skip -10".parse(), Ok(SessionCommand::Skip(-10.0)));
        assert_eq!("skip 2.5".parse(), Ok(SessionCommand::Skip(2.5)));
    }

    #[test]
    fn numeric_argument_required() {
        assert_eq!(
            "seek".parse::<SessionCommand>(),
            Err(CommandParseError::MissingArgument {
                command: "seek",
                expected: "a number"
            })
        );
        assert_eq!(
            "skip ten".parse::<SessionCommand>(),
            Err(CommandParseError::InvalidNumber("ten".into()))
        );
        assert_eq!(
            "seek NaN".parse::<SessionCommand>(),
            Err(CommandParseError::InvalidNumber("NaN".into()))
        );
    }

    #[test]
    fn parses_scrub() {
        assert_eq!("scrub begin".parse(), Ok(SessionCommand::ScrubBegin));
        assert_eq!("scrub END".parse(), Ok(SessionCommand::ScrubEnd));
        assert!("scrub".parse::<SessionCommand>().is_err());
        assert!("scrub sideways".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn parses_transcribe_flags() {
        assert_eq!(
            "transcribe".parse(),
            Ok(SessionCommand::Transcribe { json: false })
        );
        assert_eq!(
            "transcribe --json".parse(),
            Ok(SessionCommand::Transcribe { json: true })
        );
        assert!("transcribe --xml".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn rejects_trailing_arguments() {
        assert_eq!(
            "stop now".parse::<SessionCommand>(),
            Err(CommandParseError::UnexpectedArgument("now".into()))
        );
        assert_eq!(
            "seek 10 20".parse::<SessionCommand>(),
            Err(CommandParseError::UnexpectedArgument("20".into()))
        );
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            "rewind".parse::<SessionCommand>(),
            Err(CommandParseError::Unknown("rewind".into()))
        );
    }

    #[test]
    fn blank_line_is_none() {
        assert_eq!(SessionCommand::parse_line("   "), Ok(None));
        assert_eq!(
            SessionCommand::parse_line(" play \n"),
            Ok(Some(SessionCommand::Play))
        );
    }
}
