use super::affine::{warp_affine, Affine2, BorderMode};
use super::overlay::{draw_center_marker, draw_face_overlay};
use crate::config::{AlignAnchor, ExportConfig, FaceConfig};
use crate::face::{FaceGeometry, FaceLandmarks, RelativeBox};
use crate::frame::grayscale_rgb;
use image::RgbImage;
use tracing::{debug, warn};

/// Options controlling one alignment pass
#[derive(Debug, Clone, PartialEq)]
pub struct AlignOptions {
    /// Desaturate after correction, keeping three channels
    pub to_grayscale: bool,
    /// Draw landmarks, eye line and center marker
    pub draw_debug_overlay: bool,
    /// Normalize face size; when false only position and tilt are corrected
    pub correct_aspect: bool,
    /// Target face width as a fraction of the frame (bounding-box faces)
    pub correction_factor: f32,
    /// Eye distance in pixels that maps to scale 1.0 (landmark faces)
    pub reference_eye_distance: f32,
    /// Landmark moved onto the frame center
    pub anchor: AlignAnchor,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            to_grayscale: false,
            draw_debug_overlay: false,
            correct_aspect: true,
            correction_factor: 0.3,
            reference_eye_distance: 150.0,
            anchor: AlignAnchor::EyeMidpoint,
        }
    }
}

impl AlignOptions {
    /// Options used for exported frames
    pub fn for_export(face: &FaceConfig, export: &ExportConfig) -> Self {
        Self {
            to_grayscale: export.grayscale,
            draw_debug_overlay: export.visuals,
            correct_aspect: face.correction,
            correction_factor: face.correction_factor,
            reference_eye_distance: face.reference_eye_distance,
            anchor: face.anchor,
        }
    }

    /// Options used for the interactive preview: always with overlay
    pub fn for_preview(face: &FaceConfig) -> Self {
        Self {
            to_grayscale: false,
            draw_debug_overlay: true,
            correct_aspect: face.correction,
            correction_factor: face.correction_factor,
            reference_eye_distance: face.reference_eye_distance,
            anchor: face.anchor,
        }
    }
}

/// Geometric correction derived from one face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub transform: Affine2,
    pub border: BorderMode,
}

/// Normalizes face position, tilt and size across frames
#[derive(Debug, Clone)]
pub struct FrameAligner {
    options: AlignOptions,
}

impl FrameAligner {
    pub fn new(options: AlignOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AlignOptions {
        &self.options
    }

    /// Align a frame on a detected face. Without a face the geometry is left
    /// untouched and only the grayscale step applies.
    pub fn align(&self, frame: &RgbImage, face: Option<&FaceGeometry>) -> RgbImage {
        let correction = face.map(|face| self.correction(face, frame.width(), frame.height()));

        let mut out = match &correction {
            Some(correction) => warp_affine(frame, &correction.transform, correction.border),
            None => frame.clone(),
        };

        if self.options.to_grayscale {
            out = grayscale_rgb(&out);
        }

        if self.options.draw_debug_overlay {
            if let (Some(face), Some(correction)) = (face, &correction) {
                draw_face_overlay(&mut out, face, &correction.transform);
                draw_center_marker(&mut out);
            }
        }

        out
    }

    /// Compute the correction for a face in a `width`x`height` frame
    pub fn correction(&self, face: &FaceGeometry, width: u32, height: u32) -> Correction {
        match face {
            FaceGeometry::Landmarks(landmarks) => Correction {
                transform: self.landmark_transform(landmarks, width, height),
                border: BorderMode::Constant,
            },
            FaceGeometry::BoundingBox(bbox) => Correction {
                transform: self.box_transform(bbox, width, height),
                border: BorderMode::Reflect,
            },
        }
    }

    /// Recenter on the anchor, then derotate and rescale about the frame center
    fn landmark_transform(&self, face: &FaceLandmarks, width: u32, height: u32) -> Affine2 {
        let center = (width as f64 / 2.0, height as f64 / 2.0);
        let anchor = match self.options.anchor {
            AlignAnchor::EyeMidpoint => face.eye_midpoint(),
            AlignAnchor::NoseBridge => face.nose_bridge(),
        };

        let dx = center.0 - anchor.x as f64;
        let dy = center.1 - anchor.y as f64;
        let angle = face.tilt_degrees() as f64;

        let scale = if self.options.correct_aspect {
            let eye_distance = face.eye_distance() as f64;
            1.0 + (1.0 - eye_distance / self.options.reference_eye_distance as f64)
        } else {
            1.0
        };

        let scale = if scale > 0.0 {
            scale
        } else {
            warn!(
                "Eye distance too large for reference {}, skipping scale correction",
                self.options.reference_eye_distance
            );
            1.0
        };

        debug!(
            "Landmark correction: shift ({:.1}, {:.1}), angle {:.2}, scale {:.3}",
            dx, dy, angle, scale
        );

        Affine2::translation(dx, dy).then(&Affine2::rotation_about(center, angle, scale))
    }

    /// Recenter on the box center, then zoom so the box width matches the target
    fn box_transform(&self, bbox: &RelativeBox, width: u32, height: u32) -> Affine2 {
        let (w, h) = (width as f64, height as f64);
        let box_center = bbox.center();

        let dx = (0.5 - box_center.x as f64) * w;
        let dy = (0.5 - box_center.y as f64) * h;
        let translate = Affine2::translation(dx, dy);

        if !self.options.correct_aspect {
            return translate;
        }

        if bbox.width <= 0.0 {
            warn!("Face box has no width, skipping zoom");
            return translate;
        }

        let zoom = self.options.correction_factor as f64 / bbox.width as f64;
        debug!(
            "Box correction: shift ({:.1}, {:.1}), zoom {:.3}",
            dx, dy, zoom
        );

        translate.then(&Affine2::scale_about((w / 2.0, h / 2.0), zoom))
    }
}
