use crate::recognition::domain::face_embedding::{DistanceMetric, FaceEmbedding};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for the face-embedding extractor.
///
/// Returns one embedding per input region, in the same order.
pub trait FaceEncoder: Send {
    fn encode(
        &mut self,
        frame: &Frame,
        faces: &[Region],
    ) -> Result<Vec<FaceEmbedding>, Box<dyn std::error::Error>>;

    /// Metric the embeddings are meant to be compared with.
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Euclidean
    }
}
