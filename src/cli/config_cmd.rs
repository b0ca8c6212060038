//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, UploadFormat, MAX_FRAME_RATE};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;

    match key {
        "api_key" => config.api_key = Some(value.to_string()),
        "max_duration" => config.max_duration = Some(value.to_string()),
        "frame_rate" => config.frame_rate = Some(parse_frame_rate(key, value)?),
        "model" => config.model = Some(value.to_string()),
        "language" => config.language = Some(value.to_string()),
        "upload_format" => config.upload_format = Some(value.trim().to_lowercase()),
        _ => unreachable!(), // Already validated
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

/// Display value of a key, masking secrets
fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "api_key" => config.api_key.as_deref().map(mask_api_key),
        "max_duration" => config.max_duration.clone(),
        "frame_rate" => config.frame_rate.map(|r| r.to_string()),
        "model" => config.model.clone(),
        "language" => config.language.clone(),
        "upload_format" => config.upload_format.clone(),
        _ => None,
    }
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match display_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(
            key,
            &display_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()),
        );
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn parse_frame_rate(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|r| (1..=MAX_FRAME_RATE).contains(r))
        .ok_or_else(|| ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Value must be a whole number from 1 to {}", MAX_FRAME_RATE),
        })
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "max_duration" => {
            let duration =
                value
                    .parse::<Duration>()
                    .map_err(|e| ConfigError::ValidationError {
                        key: key.to_string(),
                        message: e.to_string(),
                    })?;
            if duration.as_millis() == 0 {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Duration must be positive".to_string(),
                });
            }
        }
        "frame_rate" => {
            parse_frame_rate(key, value)?;
        }
        "upload_format" => {
            value
                .parse::<UploadFormat>()
                .map_err(|e| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        "model" if value.trim().is_empty() => {
            return Err(ConfigError::ValidationError {
                key: key.to_string(),
                message: "Model name cannot be empty".to_string(),
            });
        }
        _ => {} // api_key and language accept any string
    }
    Ok(())
}

/// Mask API key for display (show first 4 and last 4 chars)
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
