//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::config::{AppConfig, UploadFormat};

/// voicenote - record, review and transcribe short voice notes
#[derive(Parser, Debug)]
#[command(name = "voicenote")]
#[command(version)]
#[command(about = "Record, play back and transcribe voice notes from the terminal")]
#[command(long_about = None)]
pub struct Cli {
    /// Maximum recording length (e.g., 90s, 3m, 2m30s)
    #[arg(short = 'm', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Meter and playback refresh rate in frames per second
    #[arg(long, value_name = "FPS")]
    pub frame_rate: Option<u32>,

    /// Container uploaded for transcription
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub upload_format: Option<UploadFormatArg>,

    /// Language hint for transcription (ISO-639-1, e.g. en)
    #[arg(short = 'l', long, value_name = "LANG")]
    pub language: Option<String>,

    /// Transcription model
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Settings given on the command line, as the highest-precedence config layer
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            api_key: None, // API key comes from env/file only
            max_duration: self.max_duration.clone(),
            frame_rate: self.frame_rate,
            model: self.model.clone(),
            language: self.language.clone(),
            upload_format: self
                .upload_format
                .map(|f| UploadFormat::from(f).to_string()),
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Upload format argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum UploadFormatArg {
    Flac,
    Wav,
}

impl From<UploadFormatArg> for UploadFormat {
    fn from(arg: UploadFormatArg) -> Self {
        match arg {
            UploadFormatArg::Flac => UploadFormat::Flac,
            UploadFormatArg::Wav => UploadFormat::Wav,
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_key",
    "max_duration",
    "frame_rate",
    "model",
    "language",
    "upload_format",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["voicenote"]);
        assert!(cli.max_duration.is_none());
        assert!(cli.frame_rate.is_none());
        assert!(cli.upload_format.is_none());
        assert!(cli.language.is_none());
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_max_duration() {
        let cli = Cli::parse_from(["voicenote", "-m", "90s"]);
        assert_eq!(cli.max_duration, Some("90s".to_string()));
    }

    #[test]
    fn cli_parses_upload_format() {
        let cli = Cli::parse_from(["voicenote", "--upload-format", "wav"]);
        assert_eq!(cli.upload_format, Some(UploadFormatArg::Wav));
        assert_eq!(cli.to_config().upload_format, Some("wav".to_string()));
    }

    #[test]
    fn cli_rejects_unknown_upload_format() {
        assert!(Cli::try_parse_from(["voicenote", "-f", "mp3"]).is_err());
    }

    #[test]
    fn to_config_never_carries_api_key() {
        let cli = Cli::parse_from(["voicenote", "--frame-rate", "30", "-l", "en", "-v"]);
        let config = cli.to_config();
        assert!(config.api_key.is_none());
        assert_eq!(config.frame_rate, Some(30));
        assert_eq!(config.language, Some("en".to_string()));
        assert!(cli.verbose);
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["voicenote", "config", "init"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["voicenote", "config", "set", "model", "whisper-1"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "model");
            assert_eq!(value, "whisper-1");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("api_key"));
        assert!(is_valid_config_key("frame_rate"));
        assert!(is_valid_config_key("upload_format"));
        assert!(!is_valid_config_key("duration"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
