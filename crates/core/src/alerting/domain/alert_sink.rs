use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::alerting::domain::alert_sound::AlertSounds;
use crate::detection::domain::detection::Detection;
use crate::shared::constants::SNAPSHOT_TIMESTAMP_FORMAT;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// `{class_name}_{YYYYMMDD_HHMMSS}.jpg`
pub fn snapshot_file_name(class_name: &str, at: DateTime<Local>) -> String {
    format!("{class_name}_{}.jpg", at.format(SNAPSHOT_TIMESTAMP_FORMAT))
}

/// Side effects of a fired alert: the type's sound and a snapshot on disk.
pub struct AlertSink {
    sounds: AlertSounds,
    writer: Box<dyn ImageWriter>,
    detections_dir: PathBuf,
}

impl AlertSink {
    pub fn new(sounds: AlertSounds, writer: Box<dyn ImageWriter>, detections_dir: PathBuf) -> Self {
        Self {
            sounds,
            writer,
            detections_dir,
        }
    }

    /// Plays the sound, then writes the snapshot and returns its path.
    ///
    /// A sound that fails to play is logged and does not stop the snapshot.
    pub fn fire(
        &self,
        detection: &Detection,
        frame: &Frame,
        at: DateTime<Local>,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        log::warn!(
            "ALERT: {} detected ({}, confidence {:.2})",
            detection.class_name,
            detection.detection_type,
            detection.confidence
        );
        if let Err(e) = self.sounds.for_type(detection.detection_type).play() {
            log::warn!("Could not play {} alert sound: {e}", detection.detection_type);
        }

        let path = self
            .detections_dir
            .join(snapshot_file_name(&detection.class_name, at));
        self.writer.write(&path, frame)?;
        log::info!("Saved detection image: {}", path.display());
        Ok(path)
    }
}
