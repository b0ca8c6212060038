//! Decoder port interface

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Decoding errors
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    #[error("Failed to decode audio: {0}")]
    Failed(String),
}

/// Port for fully decoding a recording
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Decode `data` completely and return its duration in seconds
    async fn decode_duration(&self, data: Arc<[u8]>) -> Result<f64, DecodeError>;
}
