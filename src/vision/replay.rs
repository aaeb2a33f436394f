//! Recorded recognition script
//!
//! A replay script is a JSON list of frames, each with its size, how long the
//! camera should keep delivering it, and the blocks the OCR engine reported
//! for it. The same script feeds both the replay camera and the replay
//! recognizer so that frame ids line up.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::ocr::{TextBlock, TextRecognizer};
use crate::capture::frame::CapturedFrame;
use crate::capture::CameraStatus;

fn default_hold_ms() -> u64 {
    1000
}

/// One scripted camera frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub width: u32,
    pub height: u32,
    /// How long the camera keeps delivering this frame
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    /// Simulated camera runtime error; the frame is not delivered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayFrame {
    #[cfg(test)]
    pub fn new(width: u32, height: u32, hold_ms: u64, blocks: Vec<TextBlock>) -> Self {
        Self {
            width,
            height,
            hold_ms,
            blocks,
            error: None,
        }
    }
}

/// A full replay script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Device status reported before scanning starts
    #[serde(default)]
    pub camera: CameraStatus,
    pub frames: Vec<ReplayFrame>,
}

/// Load a replay script from a JSON file
pub fn load_replay(path: &Path) -> Result<ReplayScript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay script {:?}", path))?;
    let script: ReplayScript = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse replay script {:?}", path))?;
    Ok(script)
}

/// Recognizer answering from a replay script, keyed by frame id
pub struct ReplayRecognizer {
    blocks_by_frame: HashMap<u64, Vec<TextBlock>>,
}

impl ReplayRecognizer {
    pub fn new(script: &ReplayScript) -> Self {
        let blocks_by_frame = script
            .frames
            .iter()
            .enumerate()
            .map(|(index, frame)| (index as u64, frame.blocks.clone()))
            .collect();
        Self { blocks_by_frame }
    }

    /// Recognizer that reports the same blocks for every frame id in `0..frames`
    #[cfg(test)]
    pub fn repeating(blocks: Vec<TextBlock>, frames: u64) -> Self {
        let blocks_by_frame = (0..frames).map(|id| (id, blocks.clone())).collect();
        Self { blocks_by_frame }
    }
}

impl TextRecognizer for ReplayRecognizer {
    fn scan(&self, frame: &CapturedFrame) -> Result<Vec<TextBlock>> {
        Ok(self
            .blocks_by_frame
            .get(&frame.frame_id)
            .cloned()
            .unwrap_or_default())
    }
}
