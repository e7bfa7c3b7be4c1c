use std::path::PathBuf;

use thiserror::Error;

use crate::recognition::domain::face_embedding::{DistanceMetric, FaceEmbedding};

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("gallery file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("gallery has {encodings} encodings but {names} names")]
    LengthMismatch { encodings: usize, names: usize },
}

/// One enrolled face. Several records may share a name.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityRecord {
    pub name: String,
    pub embedding: FaceEmbedding,
}

/// Persistence for the whole gallery as a single blob.
pub trait GalleryStore: Send {
    /// Returns `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Vec<IdentityRecord>>, GalleryError>;

    /// Overwrites the persisted blob with `records`.
    fn save(&self, records: &[IdentityRecord]) -> Result<(), GalleryError>;
}

/// Ordered collection of enrolled faces, mirrored to a [`GalleryStore`].
///
/// Every append is followed by a full save; if that save fails the append is
/// undone so memory and storage stay identical.
pub struct IdentityGallery {
    records: Vec<IdentityRecord>,
    store: Box<dyn GalleryStore>,
}

impl IdentityGallery {
    /// Loads the persisted gallery; a store with nothing saved yields an empty gallery.
    pub fn load(store: Box<dyn GalleryStore>) -> Result<Self, GalleryError> {
        let records = store.load()?.unwrap_or_default();
        Ok(Self { records, store })
    }

    /// Like [`IdentityGallery::load`], but a corrupt or unreadable store
    /// degrades to an empty gallery.
    pub fn load_or_empty(store: Box<dyn GalleryStore>) -> Self {
        match store.load() {
            Ok(Some(records)) => {
                log::info!("Loaded {} authorized users", records.len());
                Self { records, store }
            }
            Ok(None) => {
                log::info!("No authorized users file found, starting with an empty gallery");
                Self {
                    records: Vec::new(),
                    store,
                }
            }
            Err(e) => {
                log::warn!("Error loading authorized users: {e}; starting with an empty gallery");
                Self {
                    records: Vec::new(),
                    store,
                }
            }
        }
    }

    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a record and immediately persists the whole gallery.
    pub fn append(&mut self, name: &str, embedding: FaceEmbedding) -> Result<(), GalleryError> {
        self.records.push(IdentityRecord {
            name: name.to_string(),
            embedding,
        });
        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }
        log::info!("Added authorized user: {name}");
        Ok(())
    }

    pub fn save(&self) -> Result<(), GalleryError> {
        self.store.save(&self.records)?;
        log::info!("Saved {} authorized users", self.records.len());
        Ok(())
    }

    /// First record (in enrollment order) within `tolerance` of `embedding`.
    pub fn find_match(
        &self,
        embedding: &FaceEmbedding,
        tolerance: f64,
        metric: DistanceMetric,
    ) -> Option<&IdentityRecord> {
        self.records
            .iter()
            .find(|r| r.embedding.matches(embedding, tolerance, metric))
    }

    pub fn compare(&self, embedding: &FaceEmbedding, tolerance: f64, metric: DistanceMetric) -> bool {
        self.find_match(embedding, tolerance, metric).is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory store that records every save.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryStore {
        pub saved: Arc<Mutex<Option<Vec<IdentityRecord>>>>,
        pub save_count: Arc<Mutex<usize>>,
        pub fail_saves: bool,
    }

    impl MemoryStore {
        pub fn with(records: Vec<IdentityRecord>) -> Self {
            Self {
                saved: Arc::new(Mutex::new(Some(records))),
                ..Default::default()
            }
        }
    }

    impl GalleryStore for MemoryStore {
        fn load(&self) -> Result<Option<Vec<IdentityRecord>>, GalleryError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save(&self, records: &[IdentityRecord]) -> Result<(), GalleryError> {
            if self.fail_saves {
                return Err(GalleryError::Io {
                    path: PathBuf::from("memory"),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            *self.saved.lock().unwrap() = Some(records.to_vec());
            *self.save_count.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct CorruptStore;

    impl GalleryStore for CorruptStore {
        fn load(&self) -> Result<Option<Vec<IdentityRecord>>, GalleryError> {
            Err(GalleryError::Corrupt {
                path: PathBuf::from("gallery.json"),
                reason: "truncated".into(),
            })
        }

        fn save(&self, _records: &[IdentityRecord]) -> Result<(), GalleryError> {
            Ok(())
        }
    }

    pub(crate) fn record(name: &str, values: Vec<f32>) -> IdentityRecord {
        IdentityRecord {
            name: name.to_string(),
            embedding: FaceEmbedding::new(values),
        }
    }

    #[test]
    fn test_load_absent_store_is_empty() {
        let gallery = IdentityGallery::load(Box::new(MemoryStore::default())).unwrap();
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_load_or_empty_degrades_on_corruption() {
        let gallery = IdentityGallery::load_or_empty(Box::new(CorruptStore));
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_load_propagates_corruption() {
        assert!(matches!(
            IdentityGallery::load(Box::new(CorruptStore)),
            Err(GalleryError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_append_saves_full_state() {
        let store = MemoryStore::with(vec![record("alice", vec![0.0, 0.0])]);
        let mut gallery = IdentityGallery::load(Box::new(store.clone())).unwrap();

        gallery
            .append("bob", FaceEmbedding::new(vec![1.0, 1.0]))
            .unwrap();

        let saved = store.saved.lock().unwrap().clone().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved, gallery.records());
        assert_eq!(*store.save_count.lock().unwrap(), 1);
    }

    #[test]
    fn test_append_allows_duplicate_names() {
        let store = MemoryStore::default();
        let mut gallery = IdentityGallery::load(Box::new(store)).unwrap();
        gallery.append("alice", vec![0.0].into()).unwrap();
        gallery.append("alice", vec![0.1].into()).unwrap();
        assert_eq!(gallery.len(), 2);
    }

    #[test]
    fn test_failed_save_rolls_back_append() {
        let store = MemoryStore {
            fail_saves: true,
            ..MemoryStore::with(vec![record("alice", vec![0.0])])
        };
        let mut gallery = IdentityGallery::load(Box::new(store)).unwrap();
        assert!(gallery.append("bob", vec![1.0].into()).is_err());
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.records()[0].name, "alice");
    }

    #[test]
    fn test_find_match_returns_first_within_tolerance() {
        let store = MemoryStore::with(vec![
            record("far", vec![5.0, 5.0]),
            record("alice", vec![0.1, 0.0]),
            record("alice-again", vec![0.0, 0.1]),
        ]);
        let gallery = IdentityGallery::load(Box::new(store)).unwrap();
        let query = FaceEmbedding::new(vec![0.0, 0.0]);

        let found = gallery
            .find_match(&query, 0.6, DistanceMetric::Euclidean)
            .unwrap();
        assert_eq!(found.name, "alice");
        assert!(gallery.compare(&query, 0.6, DistanceMetric::Euclidean));
    }

    #[test]
    fn test_compare_false_when_nothing_close() {
        let store = MemoryStore::with(vec![record("alice", vec![1.0, 1.0])]);
        let gallery = IdentityGallery::load(Box::new(store)).unwrap();
        assert!(!gallery.compare(
            &FaceEmbedding::new(vec![0.0, 0.0]),
            0.6,
            DistanceMetric::Euclidean
        ));
    }
}
