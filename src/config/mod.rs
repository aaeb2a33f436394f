//! Application Configuration
//!
//! User settings stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::analysis::TemplateType;
use crate::vision::Rect;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Camera capture settings
    pub capture: CaptureSettings,
    /// Scan pipeline settings
    pub scan: ScanSettings,
    /// Screen layout of the camera preview and scan boxes
    pub layout: LayoutSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
    /// Save the results payload as JSON when a session ends
    pub save_results: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            save_results: true,
        }
    }
}

/// Capture-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Frame delivery rate of the camera producer
    pub max_fps: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self { max_fps: 30 }
    }
}

/// Scan pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Interval between processing attempts
    pub tick_interval_ms: u64,
    /// Frames shorter than this are not processed
    pub min_frame_height: u32,
    /// Pause after each toast
    pub notify_pacing_ms: u64,
    /// Qualifying blocks an ABF frame needs before a value is taken
    pub abf_min_matches: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            min_frame_height: 200,
            notify_pacing_ms: 1000,
            abf_min_matches: 2,
        }
    }
}

impl ScanSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn notify_pacing(&self) -> Duration {
        Duration::from_millis(self.notify_pacing_ms)
    }
}

/// On-screen rectangles, in display points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Area covered by the live camera preview
    pub viewport: Rect,
    /// Scan box for Polyboard labels: a wide, short strip
    pub polyboard_region: Rect,
    /// Scan box for ABF labels: a taller window
    pub abf_region: Rect,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            viewport: Rect::new(0.0, 0.0, 390.0, 844.0),
            polyboard_region: Rect::new(45.0, 340.0, 300.0, 110.0),
            abf_region: Rect::new(70.0, 270.0, 250.0, 250.0),
        }
    }
}

impl LayoutSettings {
    /// Scan box shape for the given template
    pub fn region_for(&self, template: TemplateType) -> Rect {
        match template {
            TemplateType::Polyboard => self.polyboard_region,
            TemplateType::Abf => self.abf_region,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
