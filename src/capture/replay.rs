//! Replay camera producer
//!
//! Delivers the frames of a replay script into a [`CameraFeed`] from a
//! background thread at `max_fps`, holding each frame for its `hold_ms`.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::frame::CapturedFrame;
use super::CameraFeed;
use crate::vision::ReplayScript;

/// Camera producer backed by a replay script
pub struct ReplayCamera {
    script: ReplayScript,
    frame_interval: Duration,
}

/// Handle to a running replay camera thread
pub struct ReplayHandle {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl ReplayHandle {
    /// Ask the producer to stop early
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the producer thread to exit
    pub fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!("Replay camera thread panicked");
        }
    }
}

impl ReplayCamera {
    pub fn new(script: ReplayScript, max_fps: u32) -> Self {
        let fps = max_fps.max(1);
        Self {
            script,
            frame_interval: Duration::from_secs(1) / fps,
        }
    }

    /// Start delivering frames on a background thread
    pub fn spawn(self, feed: Arc<CameraFeed>) -> ReplayHandle {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = std::thread::spawn(move || {
            info!("Replay camera starting ({} frames)", self.script.frames.len());

            for (index, scripted) in self.script.frames.iter().enumerate() {
                let until = Instant::now() + Duration::from_millis(scripted.hold_ms);
                debug!("Replay frame {} ({}x{})", index, scripted.width, scripted.height);

                if let Some(error) = &scripted.error {
                    feed.report_error(error);
                    match stop_rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => {
                            info!("Replay camera stopped");
                            return;
                        }
                    }
                }

                loop {
                    feed.push_frame(CapturedFrame::new(index as u64, scripted.width, scripted.height));

                    match stop_rx.recv_timeout(self.frame_interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        _ => {
                            info!("Replay camera stopped");
                            return;
                        }
                    }

                    if Instant::now() >= until {
                        break;
                    }
                }
            }

            info!("Replay camera finished");
        });

        ReplayHandle { stop_tx, handle }
    }
}
