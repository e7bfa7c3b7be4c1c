use crate::recognition::domain::face_embedding::{DistanceMetric, FaceEmbedding};
use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::recognition::domain::face_locator::FaceLocator;
use crate::recognition::domain::identity_gallery::IdentityGallery;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// An authorized face found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMatch {
    pub name: String,
    pub region: Region,
    pub distance: f64,
}

/// Locates faces, embeds them and compares against the gallery.
pub struct FaceMatcher {
    locator: Box<dyn FaceLocator>,
    encoder: Box<dyn FaceEncoder>,
    tolerance: f64,
}

impl FaceMatcher {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        encoder: Box<dyn FaceEncoder>,
        tolerance: f64,
    ) -> Self {
        Self {
            locator,
            encoder,
            tolerance,
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.encoder.metric()
    }

    /// Returns the first face (in locator order) that matches any gallery record.
    ///
    /// An empty gallery short-circuits without running the models.
    pub fn match_frame(
        &mut self,
        frame: &Frame,
        gallery: &IdentityGallery,
    ) -> Result<Option<FaceMatch>, Box<dyn std::error::Error>> {
        if gallery.is_empty() {
            return Ok(None);
        }

        let faces = self.locator.locate_faces(frame)?;
        if faces.is_empty() {
            return Ok(None);
        }
        let embeddings = self.encoder.encode(frame, &faces)?;

        let metric = self.encoder.metric();
        for (region, embedding) in faces.iter().zip(embeddings.iter()) {
            if let Some(record) = gallery.find_match(embedding, self.tolerance, metric) {
                return Ok(Some(FaceMatch {
                    name: record.name.clone(),
                    region: *region,
                    distance: record.embedding.distance(embedding, metric),
                }));
            }
        }
        Ok(None)
    }

    /// Locates faces and embeds only the first one.
    pub fn capture_face(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<(Region, FaceEmbedding)>, Box<dyn std::error::Error>> {
        let faces = self.locator.locate_faces(frame)?;
        let Some(first) = faces.first().copied() else {
            return Ok(None);
        };
        let embedding = self
            .encoder
            .encode(frame, &[first])?
            .into_iter()
            .next()
            .ok_or("face encoder returned no embedding")?;
        Ok(Some((first, embedding)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::recognition::domain::identity_gallery::tests::{record, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns fixed regions and counts calls.
    pub(crate) struct StubLocator {
        pub faces: Vec<Region>,
        pub calls: Arc<AtomicUsize>,
    }

    impl StubLocator {
        pub fn new(faces: Vec<Region>) -> Self {
            Self {
                faces,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl FaceLocator for StubLocator {
        fn locate_faces(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.faces.clone())
        }
    }

    /// Embeds each region as `[x, y]`, so tests control distances via position.
    pub(crate) struct PositionEncoder;

    impl FaceEncoder for PositionEncoder {
        fn encode(
            &mut self,
            _frame: &Frame,
            faces: &[Region],
        ) -> Result<Vec<FaceEmbedding>, Box<dyn std::error::Error>> {
            Ok(faces
                .iter()
                .map(|r| FaceEmbedding::new(vec![r.x as f32, r.y as f32]))
                .collect())
        }
    }

    pub(crate) fn matcher(faces: Vec<Region>) -> FaceMatcher {
        FaceMatcher::new(
            Box::new(StubLocator::new(faces)),
            Box::new(PositionEncoder),
            0.6,
        )
    }

    pub(crate) fn frame() -> Frame {
        Frame::new(vec![0u8; 64 * 48 * 3], 64, 48, 3, 0)
    }

    fn gallery_with(records: Vec<crate::recognition::domain::identity_gallery::IdentityRecord>) -> IdentityGallery {
        IdentityGallery::load(Box::new(MemoryStore::with(records))).unwrap()
    }

    #[test]
    fn test_empty_gallery_skips_models() {
        let locator = StubLocator::new(vec![Region::new(0, 0, 10, 10)]);
        let calls = locator.calls.clone();
        let mut m = FaceMatcher::new(Box::new(locator), Box::new(PositionEncoder), 0.6);
        let gallery = IdentityGallery::load(Box::new(MemoryStore::default())).unwrap();

        assert_eq!(m.match_frame(&frame(), &gallery).unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_matching_face_wins() {
        let mut m = matcher(vec![
            Region::new(40, 40, 10, 10),
            Region::new(10, 10, 10, 10),
            Region::new(20, 20, 10, 10),
        ]);
        let gallery = gallery_with(vec![record("bob", vec![20.0, 20.0]), record("alice", vec![10.0, 10.0])]);

        let found = m.match_frame(&frame(), &gallery).unwrap().unwrap();
        assert_eq!(found.name, "alice");
        assert_eq!(found.region, Region::new(10, 10, 10, 10));
    }

    #[test]
    fn test_no_face_no_match() {
        let mut m = matcher(Vec::new());
        let gallery = gallery_with(vec![record("alice", vec![0.0, 0.0])]);
        assert_eq!(m.match_frame(&frame(), &gallery).unwrap(), None);
    }

    #[test]
    fn test_capture_face_takes_first_only() {
        let mut m = matcher(vec![Region::new(3, 4, 10, 10), Region::new(30, 30, 5, 5)]);
        let (region, embedding) = m.capture_face(&frame()).unwrap().unwrap();
        assert_eq!(region, Region::new(3, 4, 10, 10));
        assert_eq!(embedding.as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn test_capture_face_without_faces() {
        let mut m = matcher(Vec::new());
        assert!(m.capture_face(&frame()).unwrap().is_none());
    }

    /// Embeds every face as the same fixed vector and compares by cosine.
    struct FixedCosineEncoder(Vec<f32>);

    impl FaceEncoder for FixedCosineEncoder {
        fn encode(
            &mut self,
            _frame: &Frame,
            faces: &[Region],
        ) -> Result<Vec<FaceEmbedding>, Box<dyn std::error::Error>> {
            Ok(faces.iter().map(|_| FaceEmbedding::new(self.0.clone())).collect())
        }

        fn metric(&self) -> DistanceMetric {
            DistanceMetric::Cosine
        }
    }

    #[test]
    fn test_matcher_uses_encoder_metric() {
        // cos = 0.5 between the live face and the enrolled one.
        let live = vec![0.5, 0.866_025_4];
        let mut m = FaceMatcher::new(
            Box::new(StubLocator::new(vec![Region::new(0, 0, 10, 10)])),
            Box::new(FixedCosineEncoder(live)),
            crate::shared::constants::DEFAULT_MATCH_TOLERANCE,
        );
        let gallery = gallery_with(vec![record("alice", vec![1.0, 0.0])]);

        assert_eq!(m.metric(), DistanceMetric::Cosine);
        let found = m.match_frame(&frame(), &gallery).unwrap().unwrap();
        assert_eq!(found.name, "alice");
        approx::assert_relative_eq!(found.distance, 0.5, epsilon = 1e-5);
    }
}
