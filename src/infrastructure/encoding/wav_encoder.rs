//! Timesliced WAV encoder
//!
//! Emits a hound-written header with zero sizes in the first slice, then raw
//! PCM. `RecordingBlob::from_chunks` rewrites the joined slices with the real
//! sizes.

use std::time::Duration as StdDuration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::ports::{
    AudioEncoder, EncoderError, EncoderEvent, EncoderHandle, PcmEvent, PcmFeed, StreamFormat,
};
use crate::domain::recording::wav::extend_pcm;
use crate::domain::recording::AudioMimeType;

/// Encoder producing canonical 16-bit PCM WAV
#[derive(Debug, Default, Clone, Copy)]
pub struct WavChunkEncoder;

impl WavChunkEncoder {
    pub fn new() -> Self {
        Self
    }
}

/// Pending bytes of the current slice
struct SliceBuffer {
    pending: Vec<u8>,
}

impl SliceBuffer {
    /// Start with the stream header so it leads the first slice
    fn new(header: Vec<u8>) -> Self {
        Self { pending: header }
    }

    fn push(&mut self, samples: &[i16]) {
        extend_pcm(&mut self.pending, samples);
    }

    /// Emit the slice if it holds anything
    fn flush(&mut self, events: &mpsc::UnboundedSender<EncoderEvent>) {
        if self.pending.is_empty() {
            return;
        }
        let slice = std::mem::take(&mut self.pending);
        let _ = events.send(EncoderEvent::Data(slice));
    }
}

async fn run(
    mut feed: PcmFeed,
    mut stop: oneshot::Receiver<()>,
    header: Vec<u8>,
    timeslice: StdDuration,
    events: mpsc::UnboundedSender<EncoderEvent>,
) {
    let mut buffer = SliceBuffer::new(header);
    let mut ticker = interval_at(Instant::now() + timeslice, timeslice);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            // A dropped handle counts as a stop request
            _ = &mut stop => {
                while let Ok(event) = feed.try_recv() {
                    if let PcmEvent::Samples(samples) = event {
                        buffer.push(&samples);
                    }
                }
                buffer.flush(&events);
                let _ = events.send(EncoderEvent::Stopped);
                debug!("wav encoder stopped");
                return;
            }
            event = feed.recv() => match event {
                Some(PcmEvent::Samples(samples)) => buffer.push(&samples),
                Some(PcmEvent::Error(message)) => {
                    warn!(error = %message, "capture stream failed");
                    let _ = events.send(EncoderEvent::Error(EncoderError::Runtime(message)));
                    return;
                }
                None => {
                    buffer.flush(&events);
                    let _ = events.send(EncoderEvent::Stopped);
                    debug!("capture feed closed");
                    return;
                }
            },
            _ = ticker.tick() => buffer.flush(&events),
        }
    }
}

impl AudioEncoder for WavChunkEncoder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Wav
    }

    fn open(
        &self,
        feed: PcmFeed,
        format: StreamFormat,
        timeslice: StdDuration,
    ) -> Result<EncoderHandle, EncoderError> {
        if format.sample_rate == 0 || format.channels == 0 {
            return Err(EncoderError::OpenFailed(format!(
                "unsupported stream format {} Hz x {}",
                format.sample_rate, format.channels
            )));
        }
        if timeslice.is_zero() {
            return Err(EncoderError::OpenFailed("timeslice must be positive".into()));
        }

        let header = format
            .stream_header()
            .map_err(|e| EncoderError::OpenFailed(e.to_string()))?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(feed, stop_rx, header, timeslice, events_tx));

        Ok(EncoderHandle::new(stop_tx, events_rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::wav;
    use crate::domain::recording::RecordingBlob;

    const FORMAT: StreamFormat = StreamFormat::new(16_000, 1);

    fn header_len() -> usize {
        FORMAT.stream_header().unwrap().len()
    }

    async fn collect(mut rx: mpsc::UnboundedReceiver<EncoderEvent>) -> (Vec<Vec<u8>>, bool) {
        let mut chunks = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                EncoderEvent::Data(d) => chunks.push(d),
                EncoderEvent::Stopped => return (chunks, true),
                EncoderEvent::Error(_) => return (chunks, false),
            }
        }
        (chunks, false)
    }

    #[tokio::test]
    async fn rejects_empty_format() {
        let (_tx, feed) = mpsc::unbounded_channel();
        let result = WavChunkEncoder::new().open(
            feed,
            StreamFormat::new(0, 1),
            StdDuration::from_secs(1),
        );
        assert!(matches!(result, Err(EncoderError::OpenFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_slice_per_timeslice() {
        let (tx, feed) = mpsc::unbounded_channel();
        let mut handle = WavChunkEncoder::new()
            .open(feed, FORMAT, StdDuration::from_secs(1))
            .unwrap();
        let mut events = handle.take_events().unwrap();

        tx.send(PcmEvent::Samples(vec![1; 100])).unwrap();
        tokio::time::sleep(StdDuration::from_millis(1100)).await;
        match events.recv().await {
            Some(EncoderEvent::Data(first)) => assert_eq!(first.len(), header_len() + 200),
            other => panic!("expected data, got {:?}", other),
        }

        tx.send(PcmEvent::Samples(vec![2; 50])).unwrap();
        handle.request_stop();
        let (chunks, stopped) = collect(events).await;
        assert!(stopped);
        assert_eq!(chunks, vec![[2i16.to_le_bytes(); 50].concat()]);
    }

    #[tokio::test]
    async fn stop_drains_feed_into_a_finished_file() {
        let (tx, feed) = mpsc::unbounded_channel();
        let mut handle = WavChunkEncoder::new()
            .open(feed, FORMAT, StdDuration::from_secs(1))
            .unwrap();
        let events = handle.take_events().unwrap();

        tx.send(PcmEvent::Samples(vec![7; 16_000])).unwrap();
        handle.request_stop();
        let (chunks, stopped) = collect(events).await;
        assert!(stopped);

        let blob = RecordingBlob::from_chunks(chunks, AudioMimeType::Wav);
        let reader = hound::WavReader::new(std::io::Cursor::new(blob.data())).unwrap();
        assert_eq!(reader.spec(), FORMAT.spec());
        assert_eq!(reader.duration(), 16_000);
        let (_, samples) = wav::decode(blob.data()).unwrap();
        assert!(samples.iter().all(|&s| s == 7));
    }

    #[tokio::test]
    async fn feed_error_is_fatal() {
        let (tx, feed) = mpsc::unbounded_channel();
        let mut handle = WavChunkEncoder::new()
            .open(feed, FORMAT, StdDuration::from_secs(1))
            .unwrap();
        let mut events = handle.take_events().unwrap();

        tx.send(PcmEvent::Error("device lost".into())).unwrap();
        match events.recv().await {
            Some(EncoderEvent::Error(EncoderError::Runtime(msg))) => assert_eq!(msg, "device lost"),
            other => panic!("expected runtime error, got {:?}", other),
        }
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_feed_stops() {
        let (tx, feed) = mpsc::unbounded_channel();
        let mut handle = WavChunkEncoder::new()
            .open(feed, FORMAT, StdDuration::from_secs(1))
            .unwrap();
        let events = handle.take_events().unwrap();

        drop(tx);
        let (chunks, stopped) = collect(events).await;
        assert!(stopped);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), header_len());
    }
}
