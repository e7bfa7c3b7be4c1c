use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::recognition::domain::face_embedding::FaceEmbedding;
use crate::recognition::domain::identity_gallery::{GalleryError, GalleryStore, IdentityRecord};

/// On-disk layout: two parallel lists paired by index.
#[derive(Debug, Serialize, Deserialize)]
struct GalleryFile {
    encodings: Vec<Vec<f32>>,
    names: Vec<String>,
}

/// Persists the gallery as a single pretty-printed JSON document.
///
/// Saves go through a sibling temp file and a rename, so a crash mid-save
/// leaves the previous gallery intact.
pub struct JsonGalleryStore {
    path: PathBuf,
}

impl JsonGalleryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> GalleryError {
        GalleryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl GalleryStore for JsonGalleryStore {
    fn load(&self) -> Result<Option<Vec<IdentityRecord>>, GalleryError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let file: GalleryFile =
            serde_json::from_str(&json).map_err(|e| GalleryError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        if file.encodings.len() != file.names.len() {
            return Err(GalleryError::LengthMismatch {
                encodings: file.encodings.len(),
                names: file.names.len(),
            });
        }

        Ok(Some(
            file.names
                .into_iter()
                .zip(file.encodings)
                .map(|(name, encoding)| IdentityRecord {
                    name,
                    embedding: FaceEmbedding::new(encoding),
                })
                .collect(),
        ))
    }

    fn save(&self, records: &[IdentityRecord]) -> Result<(), GalleryError> {
        let file = GalleryFile {
            encodings: records
                .iter()
                .map(|r| r.embedding.as_slice().to_vec())
                .collect(),
            names: records.iter().map(|r| r.name.clone()).collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| GalleryError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        log::debug!("Wrote gallery to {}", self.path.display());
        Ok(())
    }
}
