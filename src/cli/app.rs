//! Interactive session runner

use std::env;
use std::io::BufRead;
use std::ops::ControlFlow;
use std::process::ExitCode;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::application::ports::ConfigStore;
use crate::application::{
    ControllerError, ControllerSettings, TranscribeInput, TranscribeRecordingUseCase,
    VoiceController, VoiceSnapshot,
};
use crate::domain::config::AppConfig;
use crate::domain::transcription::TranscriptionReport;
use crate::infrastructure::{
    CpalMicrophone, FlacTranscoder, OpenAiTranscriber, RodioDecoder, RodioPlaybackEngine,
    WavChunkEncoder,
};

use super::commands::{SessionCommand, HELP};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable holding the transcription API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

type Transcription = TranscribeRecordingUseCase<OpenAiTranscriber, FlacTranscoder>;

/// Load and merge configuration: defaults < file < env < cli
pub async fn load_merged_config<S: ConfigStore>(store: &S, cli_config: AppConfig) -> AppConfig {
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            Presenter::new().warn(&format!("Ignoring config file: {}", e));
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        api_key: env::var(API_KEY_ENV).ok().filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };

    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

fn build_transcription(config: &AppConfig) -> Transcription {
    let transcriber = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|key| {
            OpenAiTranscriber::new(key)
                .with_model(config.model_or_default())
                .with_language(config.language_hint().map(str::to_string))
        });
    TranscribeRecordingUseCase::new(transcriber, FlacTranscoder::new())
}

/// Read stdin lines on a dedicated thread so a blocked read never holds up shutdown
fn spawn_line_reader() -> std::io::Result<mpsc::UnboundedReceiver<std::io::Result<String>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("voicenote-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Mirror controller snapshots onto the terminal
async fn render_snapshots(mut snapshots: watch::Receiver<VoiceSnapshot>) {
    let mut presenter = Presenter::new();
    let mut previous = snapshots.borrow_and_update().clone();
    while snapshots.changed().await.is_ok() {
        let current = snapshots.borrow_and_update().clone();
        presenter.render_transition(&previous, &current);
        previous = current;
    }
    presenter.stop_spinner();
}

struct Session {
    controller: VoiceController,
    transcription: Transcription,
    input: TranscribeInput,
    presenter: Presenter,
}

impl Session {
    async fn dispatch(&mut self, command: SessionCommand) -> Result<ControlFlow<()>, ControllerError> {
        match command {
            SessionCommand::Start => self.controller.start().await?,
            SessionCommand::Stop => self.controller.stop().await?,
            SessionCommand::Delete => self.controller.delete().await?,
            SessionCommand::Toggle => self.controller.toggle_playback().await?,
            SessionCommand::Play => {
                if !self.controller.snapshot().playing {
                    self.controller.toggle_playback().await?;
                }
            }
            SessionCommand::Pause => {
                if self.controller.snapshot().playing {
                    self.controller.toggle_playback().await?;
                }
            }
            SessionCommand::Seek(percent) => self.controller.seek(percent).await?,
            SessionCommand::Skip(secs) => self.controller.skip(secs).await?,
            SessionCommand::ScrubBegin => self.controller.begin_scrub().await?,
            SessionCommand::ScrubEnd => self.controller.end_scrub().await?,
            SessionCommand::Status => self.presenter.status(&self.controller.snapshot()),
            SessionCommand::Transcribe { json } => self.transcribe(json).await?,
            SessionCommand::Help => self.presenter.help(HELP),
            SessionCommand::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn transcribe(&mut self, json: bool) -> Result<(), ControllerError> {
        let recording = self.controller.recording().await?;

        if !json {
            self.presenter.start_spinner("Transcribing...");
        }
        let report = self
            .transcription
            .report(recording.as_ref(), &self.input)
            .await;

        if json {
            self.print_json(&report);
            return Ok(());
        }

        match (&report.text, &report.error) {
            (Some(text), _) => {
                self.presenter.spinner_success("Transcription complete");
                self.presenter.output(text);
            }
            (None, error) => {
                let message = error.as_deref().unwrap_or("Transcription failed");
                self.presenter.spinner_fail(message);
            }
        }
        Ok(())
    }

    fn print_json(&self, report: &TranscriptionReport) {
        match serde_json::to_string_pretty(report) {
            Ok(body) => self.presenter.output(&body),
            Err(e) => self.presenter.error(&format!("Failed to encode report: {}", e)),
        }
    }
}

/// Run the interactive session until `quit`, end of input or a shutdown signal
pub async fn run_session(config: AppConfig) -> ExitCode {
    let bootstrap = Presenter::new();

    let mut shutdown = match ShutdownSignal::listen() {
        Ok(signal) => signal,
        Err(e) => {
            bootstrap.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut lines = match spawn_line_reader() {
        Ok(lines) => lines,
        Err(e) => {
            bootstrap.error(&format!("Failed to read input: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let settings = ControllerSettings::from_config(&config);
    info!(
        max_duration = %settings.max_duration,
        frame_rate = config.frame_rate_or_default(),
        "starting voice controller"
    );
    let controller = VoiceController::spawn(
        CpalMicrophone::new(),
        WavChunkEncoder::new(),
        RodioPlaybackEngine::new(),
        RodioDecoder::new(),
        settings,
    );
    let renderer = tokio::spawn(render_snapshots(controller.subscribe()));

    let mut session = Session {
        controller: controller.clone(),
        transcription: build_transcription(&config),
        input: TranscribeInput {
            upload_format: config.upload_format_or_default(),
        },
        presenter: Presenter::new(),
    };

    bootstrap.info(&format!(
        "Ready. Max recording {}. Type 'help' for commands.",
        settings.max_duration.clock()
    ));

    let mut exit = EXIT_SUCCESS;

    loop {
        let line = tokio::select! {
            _ = shutdown.recv() => {
                debug!("shutdown requested");
                break;
            }
            line = lines.recv() => line,
        };

        let line = match line {
            Some(Ok(line)) => line,
            None => break,
            Some(Err(e)) => {
                bootstrap.error(&format!("Failed to read input: {}", e));
                exit = EXIT_ERROR;
                break;
            }
        };

        let command = match SessionCommand::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                bootstrap.warn(&e.to_string());
                continue;
            }
        };

        match session.dispatch(command).await {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => break,
            Err(e) => {
                bootstrap.error(&e.to_string());
                exit = EXIT_ERROR;
                break;
            }
        }
    }

    // Tear down capture and playback before the runtime exits
    let _ = controller.shutdown().await;
    drop(session);
    drop(controller);
    let _ = renderer.await;

    ExitCode::from(exit)
}
