use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use farmguard_core::shared::constants::{
    CAPTURE_HEIGHT, CAPTURE_WIDTH, DEFAULT_ALERT_COOLDOWN, DEFAULT_DETECTION_CONFIDENCE,
    DEFAULT_FACE_CHECK_INTERVAL, DEFAULT_MATCH_TOLERANCE,
};
use farmguard_core::video::infrastructure::ffmpeg_camera_source::DEFAULT_DEVICE;

/// Persistent monitor settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub device: String,
    /// libavdevice input format; `None` picks the platform camera format.
    pub input_format: Option<String>,
    pub width: u32,
    pub height: u32,
    pub data_dir: PathBuf,
    pub model_dir: Option<PathBuf>,
    pub sounds_dir: Option<PathBuf>,
    pub cooldown_secs: f64,
    pub face_check_interval_secs: f64,
    pub tolerance: f64,
    pub confidence: f64,
    pub face_recognition: bool,
    pub mirror: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            input_format: None,
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            data_dir: PathBuf::from("."),
            model_dir: None,
            sounds_dir: None,
            cooldown_secs: DEFAULT_ALERT_COOLDOWN.as_secs_f64(),
            face_check_interval_secs: DEFAULT_FACE_CHECK_INTERVAL.as_secs_f64(),
            tolerance: DEFAULT_MATCH_TOLERANCE,
            confidence: DEFAULT_DETECTION_CONFIDENCE,
            face_recognition: true,
            mirror: true,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FarmGuard").join("settings.json"))
    }

    /// Reads settings from `path`; a missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring invalid settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Alert sounds live next to the data unless configured otherwise.
    pub fn sounds_dir(&self) -> PathBuf {
        self.sounds_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.clone())
    }

    pub fn cooldown(&self) -> Result<Duration, Box<dyn std::error::Error>> {
        positive_duration("Cooldown", self.cooldown_secs)
    }

    pub fn face_check_interval(&self) -> Result<Duration, Box<dyn std::error::Error>> {
        positive_duration("Face check interval", self.face_check_interval_secs)
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.device.trim().is_empty() {
            return Err("Device must not be empty".into());
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Capture size must be positive, got {}x{}",
                self.width, self.height
            )
            .into());
        }
        if !(0.0..1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )
            .into());
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(format!("Tolerance must be positive, got {}", self.tolerance).into());
        }
        self.cooldown()?;
        self.face_check_interval()?;
        Ok(())
    }
}

fn positive_duration(label: &str, secs: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    if !(secs.is_finite() && secs > 0.0) {
        return Err(format!("{label} must be positive, got {secs}").into());
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("{label} of {secs} s is out of range: {e}").into())
}
