//! Live volume meter
//!
//! Samples the analysis tap once per frame and reports the normalized level.
//! Only level changes are reported. Dropping the meter stops the frame loop
//! and disconnects the tap.

use std::time::Duration as StdDuration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::events::{CaptureEvent, ControllerEvent, EventSender};
use super::ports::AnalysisTap;
use crate::domain::meter::VolumeAnalyser;

pub struct VolumeMeter {
    tap: AnalysisTap,
    task: JoinHandle<()>,
}

impl VolumeMeter {
    /// Start metering `tap` at `frame_interval`
    pub fn start(
        tap: AnalysisTap,
        frame_interval: StdDuration,
        generation: u64,
        events: EventSender,
    ) -> Self {
        let reader = tap.clone();
        let task = tokio::spawn(async move {
            let mut analyser = VolumeAnalyser::new();
            let mut frames = interval(frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last = None;

            loop {
                frames.tick().await;
                if !reader.is_connected() {
                    break;
                }
                let level = analyser.level(&reader.snapshot());
                if last == Some(level) {
                    continue;
                }
                last = Some(level);
                let event = ControllerEvent::Capture {
                    generation,
                    event: CaptureEvent::Level(level),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            debug!(generation, "volume meter stopped");
        });

        Self { tap, task }
    }
}

impl Drop for VolumeMeter {
    fn drop(&mut self) {
        self.task.abort();
        self.tap.disconnect();
    }
}
