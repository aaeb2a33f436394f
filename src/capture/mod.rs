//! Camera Capture Layer
//!
//! The camera is an external producer: it pushes frames into a [`CameraFeed`]
//! at its own rate, and the scan orchestrator samples the latest frame on its
//! own slower cadence. The feed also carries the active gate (paused when the
//! screen loses focus) and the device availability status.

pub mod frame;
pub mod replay;

pub use frame::CapturedFrame;
pub use replay::ReplayCamera;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Availability of the camera device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    /// Permission granted and a device is present
    #[default]
    Ready,
    /// The user denied camera access
    PermissionDenied,
    /// No usable camera device was found
    NoDevice,
}

impl Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraStatus::Ready => write!(f, "ready"),
            CameraStatus::PermissionDenied => write!(f, "camera permission denied"),
            CameraStatus::NoDevice => write!(f, "no camera device available"),
        }
    }
}

/// Latest-frame mailbox shared between the camera producer and the scanner
pub struct CameraFeed {
    status: CameraStatus,
    active: AtomicBool,
    latest: Mutex<Option<Arc<CapturedFrame>>>,
    frames_delivered: AtomicU64,
    errors: AtomicU64,
}

impl CameraFeed {
    /// Create a feed with the given device status. Starts inactive.
    pub fn new(status: CameraStatus) -> Self {
        Self {
            status,
            active: AtomicBool::new(false),
            latest: Mutex::new(None),
            frames_delivered: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Feed for an available device
    pub fn ready() -> Self {
        Self::new(CameraStatus::Ready)
    }

    pub fn status(&self) -> CameraStatus {
        self.status
    }

    /// Whether frames should currently be processed
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Pause or resume processing (focus lost, app backgrounded, ...)
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
        debug!("Camera feed active: {}", active);
    }

    /// Publish a new frame, replacing the previous one
    pub fn push_frame(&self, frame: CapturedFrame) {
        *self.latest.lock() = Some(Arc::new(frame));
        self.frames_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Most recent frame, if any has been delivered
    pub fn latest_frame(&self) -> Option<Arc<CapturedFrame>> {
        self.latest.lock().clone()
    }

    /// Record a camera runtime failure. Delivery continues.
    pub fn report_error(&self, error: impl Display) {
        let count = self.errors.fetch_add(1, Ordering::Relaxed) + 1;
        warn!("Camera runtime error ({} so far): {}", count, error);
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl Default for CameraFeed {
    fn default() -> Self {
        Self::ready()
    }
}
