use super::geometry::FaceGeometry;
use super::provider::FaceLandmarkProvider;
use crate::error::{Result, StudioError};
use async_trait::async_trait;
use image::RgbImage;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Scripted detector for tests: answers calls in order
pub struct ScriptedLandmarkProvider {
    script: Mutex<VecDeque<Option<Vec<FaceGeometry>>>>,
}

impl ScriptedLandmarkProvider {
    /// Each entry answers one `detect` call; `None` makes that call fail.
    /// Calls past the end of the script detect no faces.
    pub fn new(script: Vec<Option<Vec<FaceGeometry>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    /// Detector that finds the same faces in every frame
    pub fn repeating(faces: Vec<FaceGeometry>, calls: usize) -> Self {
        Self::new(vec![Some(faces); calls])
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl FaceLandmarkProvider for ScriptedLandmarkProvider {
    async fn detect(&self, _frame: &RgbImage) -> Result<Vec<FaceGeometry>> {
        let next = self.script.lock().pop_front();
        match next {
            Some(Some(faces)) => Ok(faces),
            Some(None) => Err(StudioError::detection("scripted detector failure")),
            None => Ok(Vec::new()),
        }
    }
}
