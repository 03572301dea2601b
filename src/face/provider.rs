use super::geometry::FaceGeometry;
use crate::error::Result;
use async_trait::async_trait;
use image::RgbImage;
use tracing::warn;

/// Black-box face detector consumed by the studio
#[async_trait]
pub trait FaceLandmarkProvider: Send + Sync {
    /// Detect faces in a frame, in the detector's traversal order
    async fn detect(&self, frame: &RgbImage) -> Result<Vec<FaceGeometry>>;
}

/// Pick the face used for alignment: the first detection. More than one
/// face is an ambiguity, not a failure, and is reported as a warning.
pub fn primary_face(mut faces: Vec<FaceGeometry>, source: &str) -> Option<FaceGeometry> {
    if faces.len() > 1 {
        warn!(
            "{} faces detected in {}, aligning on the first detection",
            faces.len(),
            source
        );
    }

    if faces.is_empty() {
        None
    } else {
        Some(faces.swap_remove(0))
    }
}
