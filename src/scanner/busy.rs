//! Busy flag and shared geometry cells
//!
//! These are the only pieces of state the camera side and the processing
//! side both touch.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::vision::{FrameGeometry, Rect};

/// At most one processing cycle in flight
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    busy: Arc<AtomicBool>,
    released: Arc<Notify>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Set the flag if it is clear. The returned guard clears it on drop.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                busy: Arc::clone(&self.busy),
                released: Arc::clone(&self.released),
            })
    }

    /// Resolve once the flag is clear
    pub async fn wait_idle(&self) {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed
            released.as_mut().enable();
            if !self.is_busy() {
                return;
            }
            released.await;
        }
    }
}

/// Holds the busy flag for the lifetime of one cycle
#[derive(Debug)]
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
    released: Arc<Notify>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.released.notify_waiters();
    }
}

/// Last observed frame dimensions, written every tick
#[derive(Debug, Default)]
pub struct FrameGeometryCell {
    inner: Mutex<Option<FrameGeometry>>,
}

impl FrameGeometryCell {
    pub fn set(&self, geometry: FrameGeometry) {
        *self.inner.lock() = Some(geometry);
    }

    pub fn get(&self) -> Option<FrameGeometry> {
        *self.inner.lock()
    }
}

/// Rectangles measured at layout time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanLayout {
    pub viewport: Option<Rect>,
    pub scan_region: Option<Rect>,
}
