//! voicenote CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voicenote::cli::{
    app::{load_merged_config, run_session, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use voicenote::domain::config::MAX_FRAME_RATE;
use voicenote::domain::recording::Duration;
use voicenote::infrastructure::XdgConfigStore;

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "voicenote=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let presenter = Presenter::new();
    let store = XdgConfigStore::new();

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Validate CLI values before merging
    if let Some(raw) = cli.max_duration.as_deref() {
        match raw.parse::<Duration>() {
            Ok(d) if d.as_millis() > 0 => {}
            Ok(_) => {
                presenter.error("Invalid max duration: must be positive");
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
            Err(e) => {
                presenter.error(&format!("Invalid max duration: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        }
    }
    if let Some(rate) = cli.frame_rate {
        if !(1..=MAX_FRAME_RATE).contains(&rate) {
            presenter.error(&format!(
                "Invalid frame rate {}: must be 1 to {}",
                rate,
                MAX_FRAME_RATE
            ));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    // Merge config: defaults < file < env < cli
    let config = load_merged_config(&store, cli.to_config()).await;

    run_session(config).await
}
