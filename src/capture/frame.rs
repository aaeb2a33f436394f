//! Frame data structures for captured camera content
//!
//! Pixels stay with the camera collaborator; the pipeline only needs to know
//! which frame it is and how large it was.

use std::time::Instant;

/// A frame delivered by the camera
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Producer-assigned frame identifier
    pub frame_id: u64,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl CapturedFrame {
    pub fn new(frame_id: u64, width: u32, height: u32) -> Self {
        Self {
            frame_id,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
