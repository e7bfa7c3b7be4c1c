use std::collections::HashMap;

use crate::detection::domain::detection::{Detection, DetectionType};
use crate::detection::domain::object_detector::RawDetection;
use crate::shared::constants::DEFAULT_DETECTION_CONFIDENCE;

/// COCO class ids the monitor reacts to.
const COCO_TARGETS: &[(u32, &str, DetectionType)] = &[
    (0, "person", DetectionType::Human),
    (14, "bird", DetectionType::Bird),
    (15, "cat", DetectionType::Animal),
    (16, "dog", DetectionType::Animal),
    (17, "horse", DetectionType::Animal),
    (18, "sheep", DetectionType::Animal),
    (19, "cow", DetectionType::Animal),
    (20, "elephant", DetectionType::Animal),
    (21, "bear", DetectionType::Animal),
    (22, "zebra", DetectionType::Animal),
    (23, "giraffe", DetectionType::Animal),
];

#[derive(Clone, Debug, PartialEq)]
pub struct TargetClass {
    pub name: String,
    pub detection_type: DetectionType,
}

/// Static mapping from detector class id to `(name, type)`, plus the
/// acceptance threshold.
#[derive(Clone, Debug)]
pub struct TargetClasses {
    classes: HashMap<u32, TargetClass>,
    confidence_threshold: f64,
}

impl TargetClasses {
    pub fn new(classes: HashMap<u32, TargetClass>, confidence_threshold: f64) -> Self {
        Self {
            classes,
            confidence_threshold,
        }
    }

    /// Person, bird and the nine animal species from the COCO label set.
    pub fn coco(confidence_threshold: f64) -> Self {
        let classes = COCO_TARGETS
            .iter()
            .map(|&(id, name, detection_type)| {
                (
                    id,
                    TargetClass {
                        name: name.to_string(),
                        detection_type,
                    },
                )
            })
            .collect();
        Self::new(classes, confidence_threshold)
    }

    pub fn get(&self, class_id: u32) -> Option<&TargetClass> {
        self.classes.get(&class_id)
    }

    /// Accepts a raw box if its class is targeted and its confidence is
    /// strictly above the threshold.
    pub fn classify(&self, raw: &RawDetection) -> Option<Detection> {
        if raw.confidence <= self.confidence_threshold {
            return None;
        }
        let target = self.classes.get(&raw.class_id)?;
        Some(Detection {
            class_id: raw.class_id,
            class_name: target.name.clone(),
            detection_type: target.detection_type,
            confidence: raw.confidence,
            bounding_box: raw.region,
        })
    }

    /// Classifies a whole frame's output, keeping detector order.
    pub fn classify_all(&self, raw: &[RawDetection]) -> Vec<Detection> {
        raw.iter().filter_map(|r| self.classify(r)).collect()
    }
}

impl Default for TargetClasses {
    fn default() -> Self {
        Self::coco(DEFAULT_DETECTION_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::Region;
    use rstest::rstest;

    fn raw(class_id: u32, confidence: f64) -> RawDetection {
        RawDetection {
            class_id,
            confidence,
            region: Region::new(10, 20, 30, 40),
        }
    }

    #[rstest]
    #[case::person(0, "person", DetectionType::Human)]
    #[case::bird(14, "bird", DetectionType::Bird)]
    #[case::cat(15, "cat", DetectionType::Animal)]
    #[case::dog(16, "dog", DetectionType::Animal)]
    #[case::cow(19, "cow", DetectionType::Animal)]
    #[case::giraffe(23, "giraffe", DetectionType::Animal)]
    fn test_coco_mapping(#[case] id: u32, #[case] name: &str, #[case] ty: DetectionType) {
        let classes = TargetClasses::default();
        let detection = classes.classify(&raw(id, 0.9)).unwrap();
        assert_eq!(detection.class_name, name);
        assert_eq!(detection.detection_type, ty);
        assert_eq!(detection.bounding_box, Region::new(10, 20, 30, 40));
    }

    #[test]
    fn test_coco_has_eleven_targets() {
        let classes = TargetClasses::default();
        let count = (0..80).filter(|id| classes.get(*id).is_some()).count();
        assert_eq!(count, 11);
    }

    #[rstest]
    #[case::car(2)]
    #[case::truck(7)]
    #[case::toothbrush(79)]
    fn test_untargeted_classes_are_dropped(#[case] id: u32) {
        assert!(TargetClasses::default().classify(&raw(id, 0.99)).is_none());
    }

    #[rstest]
    #[case::below(0.3, false)]
    #[case::exactly_threshold(0.5, false)]
    #[case::above(0.51, true)]
    fn test_threshold_is_strict(#[case] confidence: f64, #[case] accepted: bool) {
        let classes = TargetClasses::default();
        assert_eq!(classes.classify(&raw(16, confidence)).is_some(), accepted);
    }

    #[test]
    fn test_classify_all_keeps_order() {
        let classes = TargetClasses::default();
        let detections = classes.classify_all(&[raw(16, 0.9), raw(2, 0.9), raw(14, 0.8)]);
        let names: Vec<&str> = detections.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(names, vec!["dog", "bird"]);
    }
}
