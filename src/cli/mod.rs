//! CLI layer - Command-line interface
//!
//! Contains argument parsing, the interactive session runner, the
//! line-command parser, output formatting and signal handling.

pub mod app;
pub mod args;
pub mod commands;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{load_merged_config, run_session, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use commands::SessionCommand;
pub use presenter::Presenter;
