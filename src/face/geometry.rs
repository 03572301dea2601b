use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of points produced by the 68-point landmark backend
pub const LANDMARK_COUNT: usize = 68;

/// Image-space point in pixels (or frame fractions for [`RelativeBox`] keypoints)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Named landmark groups of the 68-point layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceRegion {
    Mouth,
    RightEyebrow,
    LeftEyebrow,
    RightEye,
    LeftEye,
    Nose,
    Jaw,
}

impl FaceRegion {
    pub const ALL: [FaceRegion; 7] = [
        FaceRegion::Mouth,
        FaceRegion::RightEyebrow,
        FaceRegion::LeftEyebrow,
        FaceRegion::RightEye,
        FaceRegion::LeftEye,
        FaceRegion::Nose,
        FaceRegion::Jaw,
    ];

    /// Landmark index range of the region
    pub fn range(&self) -> Range<usize> {
        match self {
            FaceRegion::Mouth => 48..68,
            FaceRegion::RightEyebrow => 17..22,
            FaceRegion::LeftEyebrow => 22..27,
            FaceRegion::RightEye => 36..42,
            FaceRegion::LeftEye => 42..48,
            FaceRegion::Nose => 27..35,
            FaceRegion::Jaw => 0..17,
        }
    }
}

/// 68 landmark points of one face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Point>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(StudioError::detection(format!(
                "Expected {} landmarks, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn region(&self, region: FaceRegion) -> &[Point] {
        &self.points[region.range()]
    }

    /// Outer corner of the left eye (subject's left, image right)
    pub fn left_eye_outer(&self) -> Point {
        self.region(FaceRegion::LeftEye)[3]
    }

    /// Outer corner of the right eye (subject's right, image left)
    pub fn right_eye_outer(&self) -> Point {
        self.region(FaceRegion::RightEye)[0]
    }

    /// Midpoint between the two outer eye corners
    pub fn eye_midpoint(&self) -> Point {
        self.left_eye_outer().midpoint(&self.right_eye_outer())
    }

    /// Upper nose bridge point
    pub fn nose_bridge(&self) -> Point {
        self.region(FaceRegion::Nose)[2]
    }

    /// Head tilt in degrees from the right to the left outer eye corner
    pub fn tilt_degrees(&self) -> f32 {
        let (left, right) = (self.left_eye_outer(), self.right_eye_outer());
        (left.y - right.y).atan2(left.x - right.x).to_degrees()
    }

    /// Distance between the outer eye corners in pixels
    pub fn eye_distance(&self) -> f32 {
        self.left_eye_outer().distance(&self.right_eye_outer())
    }
}

/// Face box relative to the frame size, with optional sparse keypoints
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub keypoints: Vec<Point>,
}

impl RelativeBox {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One detected face, tagged by the backend that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum FaceGeometry {
    Landmarks(FaceLandmarks),
    BoundingBox(RelativeBox),
}
