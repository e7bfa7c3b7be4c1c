use std::fmt;

use crate::shared::region::Region;

/// Coarse bucket a detector class falls into; selects the alert sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionType {
    Human,
    Animal,
    Bird,
}

impl DetectionType {
    pub const ALL: &[DetectionType] = &[
        DetectionType::Human,
        DetectionType::Animal,
        DetectionType::Bird,
    ];
}

impl fmt::Display for DetectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionType::Human => write!(f, "human"),
            DetectionType::Animal => write!(f, "animal"),
            DetectionType::Bird => write!(f, "bird"),
        }
    }
}

/// A detection of interest on the current frame. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub class_name: String,
    pub detection_type: DetectionType,
    pub confidence: f64,
    pub bounding_box: Region,
}

impl Detection {
    pub fn is_human(&self) -> bool {
        self.detection_type == DetectionType::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_lowercase() {
        let names: Vec<String> = DetectionType::ALL.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["human", "animal", "bird"]);
    }

    #[test]
    fn test_is_human() {
        let mut detection = Detection {
            class_id: 0,
            class_name: "person".into(),
            detection_type: DetectionType::Human,
            confidence: 0.9,
            bounding_box: Region::new(0, 0, 10, 10),
        };
        assert!(detection.is_human());
        detection.detection_type = DetectionType::Bird;
        assert!(!detection.is_human());
    }
}
