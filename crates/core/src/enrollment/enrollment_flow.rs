use std::path::PathBuf;

use thiserror::Error;

use crate::recognition::domain::face_embedding::FaceEmbedding;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::domain::identity_gallery::{GalleryError, IdentityGallery};
use crate::shared::constants::ENROLLMENT_CROP_PADDING;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::video::domain::image_writer::ImageWriter;

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("enrollment is not waiting for a capture")]
    NotAwaitingCapture,
    #[error("enrollment is not waiting for a name")]
    NotAwaitingName,
    #[error("invalid name {0:?}: must be non-empty and contain no path separators")]
    InvalidName(String),
    #[error("face recognition failed: {0}")]
    Recognition(String),
    #[error("failed to write face image {path}: {reason}")]
    Archive { path: PathBuf, reason: String },
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnrollmentState {
    AwaitingCapture,
    FaceFound {
        region: Region,
        embedding: FaceEmbedding,
    },
    /// Suspended until the operator supplies a name.
    NamePrompt {
        region: Region,
        embedding: FaceEmbedding,
        crop: Frame,
    },
    Saved {
        name: String,
        image_path: PathBuf,
    },
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CaptureOutcome {
    NoFace,
    FaceCaptured(Region),
}

/// Interactive enrollment of one new authorized face.
///
/// `AwaitingCapture -> FaceFound -> NamePrompt -> Saved`, or `Cancelled`
/// from `AwaitingCapture`. The gallery and the archive directory are only
/// touched on the final transition to `Saved`.
pub struct EnrollmentFlow {
    state: EnrollmentState,
    authorized_dir: PathBuf,
}

impl EnrollmentFlow {
    pub fn new(authorized_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: EnrollmentState::AwaitingCapture,
            authorized_dir: authorized_dir.into(),
        }
    }

    pub fn state(&self) -> &EnrollmentState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            EnrollmentState::Saved { .. } | EnrollmentState::Cancelled
        )
    }

    /// `Some(true)` once saved, `Some(false)` once cancelled.
    pub fn outcome(&self) -> Option<bool> {
        match self.state {
            EnrollmentState::Saved { .. } => Some(true),
            EnrollmentState::Cancelled => Some(false),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> Result<(), EnrollmentError> {
        if self.state != EnrollmentState::AwaitingCapture {
            return Err(EnrollmentError::NotAwaitingCapture);
        }
        self.state = EnrollmentState::Cancelled;
        log::info!("Enrollment cancelled");
        Ok(())
    }

    /// Looks for a face on `frame`; with none the flow stays where it is.
    pub fn capture(
        &mut self,
        frame: &Frame,
        matcher: &mut FaceMatcher,
    ) -> Result<CaptureOutcome, EnrollmentError> {
        if self.state != EnrollmentState::AwaitingCapture {
            return Err(EnrollmentError::NotAwaitingCapture);
        }

        let captured = matcher
            .capture_face(frame)
            .map_err(|e| EnrollmentError::Recognition(e.to_string()))?;
        let Some((region, embedding)) = captured else {
            log::info!("No face detected, try again");
            return Ok(CaptureOutcome::NoFace);
        };
        self.state = EnrollmentState::FaceFound {
            region,
            embedding: embedding.clone(),
        };

        let crop = frame
            .crop(&region.padded(ENROLLMENT_CROP_PADDING))
            .ok_or_else(|| {
                self.state = EnrollmentState::AwaitingCapture;
                EnrollmentError::Recognition(format!("face region {region:?} lies outside the frame"))
            })?;
        self.state = EnrollmentState::NamePrompt {
            region,
            embedding,
            crop,
        };
        log::info!("Face captured, waiting for a name");
        Ok(CaptureOutcome::FaceCaptured(region))
    }

    /// Archives the crop as `{name}.jpg` and appends the face to the gallery.
    ///
    /// An invalid name or a failed write leaves the flow in `NamePrompt`.
    pub fn submit_name(
        &mut self,
        name: &str,
        gallery: &mut IdentityGallery,
        writer: &dyn ImageWriter,
    ) -> Result<PathBuf, EnrollmentError> {
        let EnrollmentState::NamePrompt {
            embedding, crop, ..
        } = &self.state
        else {
            return Err(EnrollmentError::NotAwaitingName);
        };
        let name = validate_name(name)?;

        let image_path = self.authorized_dir.join(format!("{name}.jpg"));
        writer
            .write(&image_path, crop)
            .map_err(|e| EnrollmentError::Archive {
                path: image_path.clone(),
                reason: e.to_string(),
            })?;
        if let Err(e) = gallery.append(name, embedding.clone()) {
            if let Err(cleanup) = writer.remove(&image_path) {
                log::warn!("Could not remove {}: {cleanup}", image_path.display());
            }
            return Err(e.into());
        }

        log::info!("Enrolled {name} ({})", image_path.display());
        self.state = EnrollmentState::Saved {
            name: name.to_string(),
            image_path: image_path.clone(),
        };
        Ok(image_path)
    }
}

fn validate_name(raw: &str) -> Result<&str, EnrollmentError> {
    let name = raw.trim();
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(EnrollmentError::InvalidName(raw.to_string()));
    }
    Ok(name)
}
