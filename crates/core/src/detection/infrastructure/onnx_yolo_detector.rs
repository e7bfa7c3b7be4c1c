/// COCO object detector using a YOLOv8 ONNX export via `ort`.
///
/// Handles letterbox preprocessing, inference, per-class NMS and mapping
/// boxes back to frame coordinates. Class filtering happens in the domain.
use std::path::Path;

use crate::detection::domain::object_detector::{ObjectDetector, RawDetection};
use crate::detection::infrastructure::execution_provider::preferred_execution_providers;
use crate::detection::infrastructure::yolo_tensor::{self, YoloBox};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Boxes scoring below this never leave the detector.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Leading box values per row: cx, cy, w, h.
const BOX_VALUES: usize = 4;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    min_confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's NCHW input shape,
    /// falling back to 640 if the shape is dynamic.
    pub fn new(model_path: &Path, min_confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        let input_size = yolo_tensor::model_input_size(&session);
        log::debug!(
            "Loaded object detector {} ({input_size}px input)",
            model_path.display()
        );

        Ok(Self {
            session,
            min_confidence,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        let (input_tensor, lb) = yolo_tensor::letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let rows = yolo_tensor::output_rows(data, tensor.shape())?;

        let mut boxes: Vec<YoloBox> = rows
            .iter()
            .filter_map(|row| decode_row(row, self.min_confidence))
            .map(|(cx, cy, w, h, score, class_id)| {
                let (x1, y1, x2, y2) = lb.unmap(cx, cy, w, h);
                YoloBox {
                    x1,
                    y1,
                    x2,
                    y2,
                    score,
                    class_id,
                }
            })
            .collect();

        let kept = yolo_tensor::nms(&mut boxes, NMS_IOU_THRESH);
        Ok(kept
            .into_iter()
            .map(|b| RawDetection {
                class_id: b.class_id,
                confidence: b.score,
                region: Region::from_corners(b.x1, b.y1, b.x2, b.y2),
            })
            .collect())
    }
}

/// Row format: `[cx, cy, w, h, score_0, ..., score_79]`; picks the best class.
fn decode_row(row: &[f32], min_confidence: f64) -> Option<(f64, f64, f64, f64, f64, u32)> {
    if row.len() <= BOX_VALUES {
        return None;
    }
    let (class_id, score) = row[BOX_VALUES..]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
    let score = *score as f64;
    if score < min_confidence {
        return None;
    }
    Some((
        row[0] as f64,
        row[1] as f64,
        row[2] as f64,
        row[3] as f64,
        score,
        class_id as u32,
    ))
}
