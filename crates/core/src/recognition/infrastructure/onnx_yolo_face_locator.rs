/// Face locator backed by a YOLO face model (WIDER FACE, pose head) via `ort`.
///
/// Rows are `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`; only the box
/// and confidence are used. Faces come back sorted by confidence.
use std::path::Path;

use crate::detection::infrastructure::execution_provider::preferred_execution_providers;
use crate::detection::infrastructure::yolo_tensor::{self, YoloBox};
use crate::recognition::domain::face_locator::FaceLocator;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// Index of the face confidence inside a row.
const CONF_INDEX: usize = 4;

pub struct OnnxYoloFaceLocator {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloFaceLocator {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        let input_size = yolo_tensor::model_input_size(&session);
        log::debug!(
            "Loaded face locator {} ({input_size}px input)",
            model_path.display()
        );
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceLocator for OnnxYoloFaceLocator {
    fn locate_faces(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let (input_tensor, lb) = yolo_tensor::letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let rows = yolo_tensor::output_rows(data, tensor.shape())?;

        let mut boxes: Vec<YoloBox> = rows
            .iter()
            .filter_map(|row| {
                let conf = *row.get(CONF_INDEX)? as f64;
                if conf < self.confidence {
                    return None;
                }
                let (x1, y1, x2, y2) =
                    lb.unmap(row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
                Some(YoloBox {
                    x1,
                    y1,
                    x2,
                    y2,
                    score: conf,
                    class_id: 0,
                })
            })
            .collect();

        Ok(yolo_tensor::nms(&mut boxes, NMS_IOU_THRESH)
            .into_iter()
            .map(|b| Region::from_corners(b.x1, b.y1, b.x2, b.y2))
            .filter_map(|r| r.clamped(frame.width(), frame.height()))
            .collect())
    }
}
