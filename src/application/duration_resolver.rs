//! Decode probe for recording durations
//!
//! Fetches the recording through its object URL, decodes it fully and
//! reports the resulting duration. The playback handle reports durations on
//! its own; whichever valid value reaches the duration cell first wins.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::blob_store::BlobStore;
use super::events::{ControllerEvent, EventSender};
use super::ports::AudioDecoder;
use crate::domain::playback::is_valid_duration;

/// A running decode probe. Dropping it cancels the decode.
pub struct DurationProbe {
    task: JoinHandle<()>,
}

impl DurationProbe {
    pub fn spawn<D>(
        decoder: Arc<D>,
        store: BlobStore,
        url: String,
        generation: u64,
        events: EventSender,
    ) -> Self
    where
        D: AudioDecoder + ?Sized + 'static,
    {
        let task = tokio::spawn(async move {
            let Some(blob) = store.fetch(&url) else {
                debug!(%url, "decode probe: url already revoked");
                return;
            };
            match decoder.decode_duration(blob.shared_data()).await {
                Ok(secs) if is_valid_duration(secs) => {
                    let _ = events.send(ControllerEvent::DurationProbed { generation, secs });
                }
                Ok(secs) => debug!(secs, "decode probe: unusable duration"),
                Err(e) => debug!(error = %e, "decode probe failed"),
            }
        });
        Self { task }
    }
}

impl Drop for DurationProbe {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::DecodeError;
    use crate::domain::recording::{AudioMimeType, RecordingBlob};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct FixedDecoder(Result<f64, DecodeError>);

    #[async_trait]
    impl AudioDecoder for FixedDecoder {
        async fn decode_duration(&self, _data: Arc<[u8]>) -> Result<f64, DecodeError> {
            self.0.clone()
        }
    }

    fn store_with_blob() -> (BlobStore, crate::application::blob_store::ObjectUrl) {
        let store = BlobStore::new();
        let url = store.create_url(RecordingBlob::new(vec![0; 8], AudioMimeType::Wav));
        (store, url)
    }

    #[tokio::test]
    async fn reports_valid_duration() {
        let (store, url) = store_with_blob();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _probe = DurationProbe::spawn(
            Arc::new(FixedDecoder(Ok(7.2))),
            store,
            url.as_str().to_string(),
            3,
            tx,
        );

        match rx.recv().await {
            Some(ControllerEvent::DurationProbed { generation, secs }) => {
                assert_eq!(generation, 3);
                assert_eq!(secs, 7.2);
            }
            _ => panic!("expected a probed duration"),
        }
    }

    #[tokio::test]
    async fn failures_and_invalid_values_stay_silent() {
        for result in [Ok(f64::INFINITY), Ok(0.0), Err(DecodeError::Failed("bad".into()))] {
            let (store, url) = store_with_blob();
            let (tx, mut rx) = mpsc::unbounded_channel();
            let _probe = DurationProbe::spawn(
                Arc::new(FixedDecoder(result)),
                store,
                url.as_str().to_string(),
                1,
                tx,
            );
            assert!(rx.recv().await.is_none());
        }
    }

    #[tokio::test]
    async fn revoked_url_is_skipped() {
        let (store, url) = store_with_blob();
        let key = url.as_str().to_string();
        drop(url);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _probe = DurationProbe::spawn(Arc::new(FixedDecoder(Ok(1.0))), store, key, 1, tx);
        assert!(rx.recv().await.is_none());
    }
}
