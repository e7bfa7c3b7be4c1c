/// ArcFace face encoder using ONNX Runtime.
///
/// Each face is cropped, resized to 112x112, normalised to [-1, 1] and run
/// through the model; the output is L2-normalised and compared by cosine
/// distance.
use std::path::Path;

use crate::detection::infrastructure::execution_provider::preferred_execution_providers;
use crate::recognition::domain::face_embedding::{DistanceMetric, FaceEmbedding};
use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceEncoder {
    session: ort::session::Session,
}

impl OnnxArcFaceEncoder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        log::debug!("Loaded face encoder {}", model_path.display());
        Ok(Self { session })
    }

    fn embed(&mut self, crop: &Frame) -> Result<FaceEmbedding, Box<dyn std::error::Error>> {
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(FaceEmbedding::new(embedding))
    }
}

impl FaceEncoder for OnnxArcFaceEncoder {
    fn encode(
        &mut self,
        frame: &Frame,
        faces: &[Region],
    ) -> Result<Vec<FaceEmbedding>, Box<dyn std::error::Error>> {
        faces
            .iter()
            .map(|region| {
                let crop = frame
                    .crop(region)
                    .ok_or_else(|| format!("face region {region:?} lies outside the frame"))?;
                self.embed(&crop)
            })
            .collect()
    }

    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let rgb_data = crop.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
