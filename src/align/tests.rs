use super::*;
use crate::config::AlignAnchor;
use crate::face::{FaceGeometry, RelativeBox};
use crate::frame::grayscale_rgb;
use crate::test_support::{centered_face, gradient_frame, synthetic_landmarks};
use image::{Rgb, RgbImage};

fn aligner(options: AlignOptions) -> FrameAligner {
    FrameAligner::new(options)
}

#[test]
fn test_no_face_leaves_frame_untouched() {
    let frame = gradient_frame(64, 48);

    let out = aligner(AlignOptions::default()).align(&frame, None);
    assert_eq!(out, frame);

    let gray = aligner(AlignOptions {
        to_grayscale: true,
        draw_debug_overlay: true,
        ..AlignOptions::default()
    })
    .align(&frame, None);
    assert_eq!(gray, grayscale_rgb(&frame));
}

#[test]
fn test_reference_geometry_is_idempotent() {
    let frame = gradient_frame(640, 360);
    let face = centered_face(640, 360, 150.0);
    let aligner = aligner(AlignOptions::default());

    let once = aligner.align(&frame, Some(&face));
    let twice = aligner.align(&once, Some(&face));

    assert_eq!(once, frame);
    assert_eq!(twice, once);
}

#[test]
fn test_near_reference_geometry_stays_within_interpolation_error() {
    let frame = gradient_frame(320, 180);
    // Half a pixel off center, a hair of tilt
    let face = FaceGeometry::Landmarks(synthetic_landmarks(
        (85.5, 90.0),
        (235.5, 90.2),
        (160.0, 100.0),
    ));
    let aligner = aligner(AlignOptions::default());

    let once = aligner.align(&frame, Some(&face));
    let twice = aligner.align(&once, Some(&face));

    // Compare away from the borders uncovered by the shift
    for y in 10..170 {
        for x in 10..310 {
            let a = once.get_pixel(x, y);
            let b = frame.get_pixel(x, y);
            // Blue wraps at x + y = 256, so only the smooth channels are compared
            for c in 0..2 {
                assert!((a[c] as i32 - b[c] as i32).abs() <= 3, "pixel ({}, {})", x, y);
            }
        }
    }
    assert_eq!(twice.dimensions(), once.dimensions());
}

#[test]
fn test_landmark_anchor_moves_to_center() {
    let mut frame = RgbImage::new(64, 48);
    frame.put_pixel(20, 14, Rgb([255, 255, 255]));

    let face = FaceGeometry::Landmarks(synthetic_landmarks((10.0, 14.0), (30.0, 14.0), (20.0, 20.0)));
    let aligner = aligner(AlignOptions {
        reference_eye_distance: 20.0,
        ..AlignOptions::default()
    });

    let out = aligner.align(&frame, Some(&face));
    assert_eq!(*out.get_pixel(32, 24), Rgb([255, 255, 255]));
    assert_eq!(*out.get_pixel(20, 14), Rgb([0, 0, 0]));
}

#[test]
fn test_nose_bridge_anchor() {
    let face = FaceGeometry::Landmarks(synthetic_landmarks((10.0, 14.0), (30.0, 14.0), (22.0, 20.0)));
    let aligner = aligner(AlignOptions {
        reference_eye_distance: 20.0,
        anchor: AlignAnchor::NoseBridge,
        ..AlignOptions::default()
    });

    let correction = aligner.correction(&face, 64, 48);
    let (x, y) = correction.transform.apply(22.0, 20.0);
    assert!((x - 32.0).abs() < 1e-6);
    assert!((y - 24.0).abs() < 1e-6);
}

#[test]
fn test_tilted_face_is_leveled_and_centered() {
    let geometry =
        FaceGeometry::Landmarks(synthetic_landmarks((250.0, 150.0), (370.0, 200.0), (310.0, 190.0)));
    let aligner = aligner(AlignOptions::default());

    let correction = aligner.correction(&geometry, 640, 360);
    assert_eq!(correction.border, BorderMode::Constant);

    let right = correction.transform.apply(250.0, 150.0);
    let left = correction.transform.apply(370.0, 200.0);
    assert!((right.1 - left.1).abs() < 1e-3, "eyes not level: {:?} {:?}", right, left);

    let mid = ((right.0 + left.0) / 2.0, (right.1 + left.1) / 2.0);
    assert!((mid.0 - 320.0).abs() < 1e-3);
    assert!((mid.1 - 180.0).abs() < 1e-3);
}

#[test]
fn test_scale_follows_reference_eye_distance() {
    let face = centered_face(640, 360, 100.0);

    let scaled = aligner(AlignOptions::default()).correction(&face, 640, 360);
    let [a, b, ..] = scaled.transform.coefficients();
    assert!((a - (1.0 + (1.0 - 100.0 / 150.0))).abs() < 1e-6);
    assert!(b.abs() < 1e-9);

    let unscaled = aligner(AlignOptions {
        correct_aspect: false,
        ..AlignOptions::default()
    })
    .correction(&face, 640, 360);
    assert!(unscaled.transform.is_identity());
}

#[test]
fn test_bounding_box_recenter_and_zoom() {
    let bbox = FaceGeometry::BoundingBox(RelativeBox {
        x: 0.175,
        y: 0.15,
        width: 0.15,
        height: 0.2,
        keypoints: vec![],
    });
    let aligner = aligner(AlignOptions::default());

    let correction = aligner.correction(&bbox, 200, 100);
    assert_eq!(correction.border, BorderMode::Reflect);

    // Box center (0.25, 0.25) lands on the frame center
    let (x, y) = correction.transform.apply(50.0, 25.0);
    assert!((x - 100.0).abs() < 1e-3);
    assert!((y - 50.0).abs() < 1e-3);

    // Zoom = 0.3 / 0.15
    let [a, ..] = correction.transform.coefficients();
    assert!((a - 2.0).abs() < 1e-4);
}

#[test]
fn test_bounding_box_correction_has_no_black_borders() {
    let frame = RgbImage::from_pixel(80, 60, Rgb([120, 60, 30]));
    let bbox = FaceGeometry::BoundingBox(RelativeBox {
        x: 0.0,
        y: 0.0,
        width: 0.6,
        height: 0.5,
        keypoints: vec![],
    });

    let out = aligner(AlignOptions::default()).align(&frame, Some(&bbox));
    assert!(out.pixels().all(|p| *p == Rgb([120, 60, 30])));
}

#[test]
fn test_grayscale_applies_after_correction() {
    let frame = gradient_frame(64, 48);
    let face = centered_face(64, 48, 20.0);
    let aligner = aligner(AlignOptions {
        to_grayscale: true,
        reference_eye_distance: 20.0,
        ..AlignOptions::default()
    });

    let out = aligner.align(&frame, Some(&face));
    assert_eq!(out.dimensions(), (64, 48));
    assert!(out.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
}

#[test]
fn test_debug_overlay_marks_center() {
    let frame = RgbImage::new(64, 48);
    let face = centered_face(64, 48, 20.0);
    let aligner = aligner(AlignOptions {
        draw_debug_overlay: true,
        reference_eye_distance: 20.0,
        ..AlignOptions::default()
    });

    let out = aligner.align(&frame, Some(&face));
    assert_eq!(*out.get_pixel(32, 24), Rgb([255, 0, 0]));
    assert!(out.pixels().any(|p| *p == Rgb([255, 255, 255])));
}
