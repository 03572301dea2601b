mod external;
mod geometry;
mod mock;
mod provider;
#[cfg(test)]
mod tests;

pub use external::{parse_detector_output, ExternalLandmarkProvider};
pub use geometry::{FaceGeometry, FaceLandmarks, FaceRegion, Point, RelativeBox, LANDMARK_COUNT};
pub use mock::ScriptedLandmarkProvider;
pub use provider::{primary_face, FaceLandmarkProvider};
