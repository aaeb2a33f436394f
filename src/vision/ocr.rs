//! OCR collaborator interface
//!
//! The recognition engine is consumed as a black box: given a frame it
//! returns the text blocks it found, each with a bounding box in the
//! engine's own (frame) coordinate space.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::capture::frame::CapturedFrame;

/// Bounding box of a recognized block, in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[cfg(test)]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// A unit of recognized text produced from one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Recognized text, untrimmed
    pub text: String,
    /// Location of the text in the frame
    pub bounding_box: BoundingBox,
}

impl TextBlock {
    #[cfg(test)]
    pub fn new(text: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bounding_box,
        }
    }
}

/// Text recognition engine
///
/// Implementations may be slow; the orchestrator calls `scan` on a blocking
/// worker at most once per processing cycle. An empty vector is a valid
/// answer and means "nothing recognized".
pub trait TextRecognizer: Send + Sync {
    /// Run recognition on a single frame
    fn scan(&self, frame: &CapturedFrame) -> Result<Vec<TextBlock>>;
}
