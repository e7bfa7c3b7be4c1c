/// Fixed-length face descriptor produced by a [`FaceEncoder`].
///
/// [`FaceEncoder`]: crate::recognition::domain::face_encoder::FaceEncoder
/// How two embeddings are compared.
///
/// `Cosine` is `1 - cos(a, b)`, so a tolerance of 0.6 accepts pairs with
/// cosine similarity of at least 0.4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Cosine,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaceEmbedding(Vec<f32>);

impl FaceEmbedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distance under `metric`. Embeddings of different length are
    /// infinitely far apart.
    pub fn distance(&self, other: &FaceEmbedding, metric: DistanceMetric) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }
        let pairs = self.0.iter().zip(other.0.iter());
        match metric {
            DistanceMetric::Euclidean => pairs
                .map(|(a, b)| {
                    let d = *a as f64 - *b as f64;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::Cosine => {
                let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
                for (a, b) in pairs {
                    let (a, b) = (*a as f64, *b as f64);
                    dot += a * b;
                    norm_a += a * a;
                    norm_b += b * b;
                }
                let denom = norm_a.sqrt() * norm_b.sqrt();
                if denom < 1e-12 {
                    return f64::INFINITY;
                }
                1.0 - dot / denom
            }
        }
    }

    /// True when `other` lies within `tolerance` (inclusive) under `metric`.
    pub fn matches(&self, other: &FaceEmbedding, tolerance: f64, metric: DistanceMetric) -> bool {
        self.distance(other, metric) <= tolerance
    }
}

impl From<Vec<f32>> for FaceEmbedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}
