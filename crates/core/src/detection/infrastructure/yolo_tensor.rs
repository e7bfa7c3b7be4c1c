//! Pre/post-processing shared by the YOLO-family ONNX models.

use crate::shared::frame::Frame;

/// Fallback input resolution when the model doesn't specify dimensions.
pub(crate) const DEFAULT_INPUT_SIZE: u32 = 640;

/// Letterbox geometry needed to map model coordinates back to the frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Letterbox {
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// Converts a `(cx, cy, w, h)` box in model space to frame `(x1, y1, x2, y2)`.
    pub fn unmap(&self, cx: f64, cy: f64, w: f64, h: f64) -> (f64, f64, f64, f64) {
        let px = self.pad_x as f64;
        let py = self.pad_y as f64;
        (
            ((cx - w / 2.0) - px) / self.scale,
            ((cy - h / 2.0) - py) / self.scale,
            ((cx + w / 2.0) - px) / self.scale,
            ((cy + h / 2.0) - py) / self.scale,
        )
    }
}

/// Reads the square input size from an NCHW model input, if static.
pub(crate) fn model_input_size(session: &ort::session::Session) -> u32 {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    Some(shape[2] as u32)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or(DEFAULT_INPUT_SIZE)
}

/// Letterbox-resize a frame to `target_size` x `target_size`, normalised to [0,1] NCHW.
pub(crate) fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // YOLO convention: pad with 114/255 gray
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

/// Splits a `[1, features, boxes]` or `[1, boxes, features]` output into rows.
///
/// YOLOv8+ exports are feature-major; the smaller axis is taken as features.
pub(crate) fn output_rows(data: &[f32], shape: &[usize]) -> Result<Vec<Vec<f32>>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}"));
    }
    let transposed = shape[1] < shape[2];
    let (num_boxes, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_boxes * num_feats {
        return Err(format!(
            "YOLO output has {} values, shape {shape:?} needs {}",
            data.len(),
            num_boxes * num_feats
        ));
    }

    Ok((0..num_boxes)
        .map(|i| {
            if transposed {
                (0..num_feats).map(|f| data[f * num_boxes + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            }
        })
        .collect())
}

#[derive(Clone, Debug)]
pub(crate) struct YoloBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
    pub class_id: u32,
}

/// Greedy NMS: sort by score descending, suppress overlapping boxes of the same class.
pub(crate) fn nms(boxes: &mut [YoloBox], iou_thresh: f64) -> Vec<YoloBox> {
    boxes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(boxes[i].clone());
        for j in (i + 1)..boxes.len() {
            if suppressed[j] || boxes[j].class_id != boxes[i].class_id {
                continue;
            }
            if bbox_iou(&boxes[i], &boxes[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &YoloBox, b: &YoloBox) -> f64 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn yolo_box(x1: f64, y1: f64, x2: f64, y2: f64, score: f64, class_id: u32) -> YoloBox {
        YoloBox {
            x1,
            y1,
            x2,
            y2,
            score,
            class_id,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, new 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        assert!((tensor[[0, 0, y, 1]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 80,
        };
        // Box centred at (100, 180) of size 40x40 in model space
        let (x1, y1, x2, y2) = lb.unmap(100.0, 180.0, 40.0, 40.0);
        assert_relative_eq!(x1, 40.0);
        assert_relative_eq!(y1, 40.0);
        assert_relative_eq!(x2, 60.0);
        assert_relative_eq!(y2, 60.0);
    }

    #[test]
    fn test_output_rows_transposed_layout() {
        // 2 features x 3 boxes, feature-major
        let data = [1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
        let rows = output_rows(&data, &[1, 2, 3]).unwrap();
        assert_eq!(rows, vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]]);
    }

    #[test]
    fn test_output_rows_row_major_layout() {
        // 3 boxes x 2 features
        let data = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        let rows = output_rows(&data, &[1, 3, 2]).unwrap();
        assert_eq!(rows[2], vec![3.0, 30.0]);
    }

    #[test]
    fn test_output_rows_rejects_bad_shape() {
        assert!(output_rows(&[0.0; 4], &[4]).is_err());
        assert!(output_rows(&[0.0; 4], &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping_same_class() {
        let mut boxes = vec![
            yolo_box(0.0, 0.0, 100.0, 100.0, 0.8, 16),
            yolo_box(5.0, 5.0, 105.0, 105.0, 0.9, 16),
        ];
        let kept = nms(&mut boxes, 0.45);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_overlapping_different_classes() {
        let mut boxes = vec![
            yolo_box(0.0, 0.0, 100.0, 100.0, 0.9, 0),
            yolo_box(5.0, 5.0, 105.0, 105.0, 0.8, 16),
        ];
        assert_eq!(nms(&mut boxes, 0.45).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut boxes: Vec<YoloBox> = Vec::new();
        assert!(nms(&mut boxes, 0.45).is_empty());
    }
}
