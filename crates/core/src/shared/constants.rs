use std::time::Duration;

/// COCO object detector (80 classes).
pub const OBJECT_MODEL_NAME: &str = "yolov8n.onnx";

/// YOLO face detector trained on WIDER FACE, used to locate faces.
pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";

/// ArcFace embedding model.
pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";

/// Minimum time between two fired alerts, across all detection types.
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(5);

/// Minimum time between two face-matching passes.
pub const DEFAULT_FACE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Embedding distance cutoff for an identity match (smaller is stricter),
/// measured with the encoder's metric.
pub const DEFAULT_MATCH_TOLERANCE: f64 = 0.6;

/// Detections must score strictly above this to be considered.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.5;

/// Pixels added around an enrolled face before archiving the crop.
pub const ENROLLMENT_CROP_PADDING: i32 = 30;

pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

pub const DETECTIONS_DIR_NAME: &str = "detected_images";
pub const AUTHORIZED_DIR_NAME: &str = "authorized_users";
pub const GALLERY_FILE_NAME: &str = "authorized_users.json";

pub const HUMAN_ALERT_FILE: &str = "human_alert.wav";
pub const ANIMAL_ALERT_FILE: &str = "animal_alert.wav";
pub const BIRD_ALERT_FILE: &str = "bird_alert.wav";

/// Snapshot timestamp format, second granularity.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
