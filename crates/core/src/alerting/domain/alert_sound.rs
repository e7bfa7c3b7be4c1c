use std::time::Duration;

use crate::detection::domain::detection::DetectionType;

/// Domain interface for a pre-loaded alert sound.
pub trait AlertSound: Send {
    /// Starts playback and returns without waiting for it to finish.
    fn play(&self) -> Result<(), Box<dyn std::error::Error>>;

    fn duration(&self) -> Result<Duration, Box<dyn std::error::Error>>;
}

/// Stand-in used when a sound file is missing or audio is unavailable.
pub struct SilentSound;

impl AlertSound for SilentSound {
    fn play(&self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn duration(&self) -> Result<Duration, Box<dyn std::error::Error>> {
        Ok(Duration::ZERO)
    }
}

/// One sound per detection type.
pub struct AlertSounds {
    pub human: Box<dyn AlertSound>,
    pub animal: Box<dyn AlertSound>,
    pub bird: Box<dyn AlertSound>,
}

impl AlertSounds {
    pub fn silent() -> Self {
        Self {
            human: Box::new(SilentSound),
            animal: Box::new(SilentSound),
            bird: Box::new(SilentSound),
        }
    }

    pub fn for_type(&self, detection_type: DetectionType) -> &dyn AlertSound {
        match detection_type {
            DetectionType::Human => self.human.as_ref(),
            DetectionType::Animal => self.animal.as_ref(),
            DetectionType::Bird => self.bird.as_ref(),
        }
    }
}
