//! Cross-platform microphone using cpal
//!
//! `cpal::Stream` is not `Send`, so each acquired stream lives on its own
//! thread. The thread reports the acquisition result, then parks until the
//! stream is stopped or dropped.

use std::sync::mpsc as std_mpsc;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::application::ports::{
    AnalysisTap, CaptureError, DeviceStream, Microphone, PcmEvent, PcmFeed, StreamFormat,
};
use crate::domain::meter::FFT_SIZE;

/// Microphone backed by the default cpal input device
pub struct CpalMicrophone;

impl CpalMicrophone {
    /// Create a new cpal-based microphone
    pub fn new() -> Self {
        Self
    }

    /// Get the default input device
    fn input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device().ok_or(CaptureError::NoAudioDevice)
    }

    /// Mix interleaved frames down to mono
    fn to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels <= 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    }

    /// Open and start the default input stream.
    /// Samples are mixed to mono and written to both the feed and the tap.
    fn open_stream(
        feed: mpsc::UnboundedSender<PcmEvent>,
        tap: AnalysisTap,
    ) -> Result<(cpal::Stream, StreamFormat), CaptureError> {
        let device = Self::input_device()?;
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let channels = config.channels;
        let format = StreamFormat::new(config.sample_rate.0, 1);

        let error_feed = feed.clone();
        let on_error = move |err: cpal::StreamError| {
            let _ = error_feed.send(PcmEvent::Error(err.to_string()));
        };

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mono = Self::to_mono(data, channels);
                    tap.push(&mono);
                    let _ = feed.send(PcmEvent::Samples(mono));
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let pcm: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                        .collect();
                    let mono = Self::to_mono(&pcm, channels);
                    tap.push(&mono);
                    let _ = feed.send(PcmEvent::Samples(mono));
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::StartFailed(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        Ok((stream, format))
    }
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Microphone for CpalMicrophone {
    async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (release_tx, release_rx) = std_mpsc::channel::<()>();
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        let tap = AnalysisTap::new(FFT_SIZE);
        let writer = tap.clone();

        std::thread::Builder::new()
            .name("voicenote-capture".into())
            .spawn(move || match Self::open_stream(feed_tx, writer) {
                Ok((stream, format)) => {
                    if ready_tx.send(Ok(format)).is_err() {
                        return;
                    }
                    // Blocks until a release signal or the sender is dropped
                    let _ = release_rx.recv();
                    drop(stream);
                    debug!("input stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        let format = ready_rx
            .await
            .map_err(|_| CaptureError::StartFailed("capture thread exited".into()))??;
        info!(sample_rate = format.sample_rate, "microphone acquired");

        Ok(Box::new(CpalStream {
            format,
            feed: Some(feed_rx),
            tap,
            release: Some(release_tx),
        }))
    }
}

/// A running cpal input stream, owned by its capture thread
struct CpalStream {
    format: StreamFormat,
    feed: Option<PcmFeed>,
    tap: AnalysisTap,
    release: Option<std_mpsc::Sender<()>>,
}

impl DeviceStream for CpalStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn take_feed(&mut self) -> Option<PcmFeed> {
        self.feed.take()
    }

    fn tap(&self) -> AnalysisTap {
        self.tap.clone()
    }

    fn stop(&mut self) {
        if let Some(release) = self.release.take() {
            if release.send(()).is_err() {
                warn!("capture thread already gone");
            }
            debug!("microphone released");
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop();
    }
}
