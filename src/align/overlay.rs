use super::affine::Affine2;
use crate::face::{FaceGeometry, FaceRegion, Point};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

const REGION_COLORS: [Rgb<u8>; 7] = [
    Rgb([109, 199, 19]),
    Rgb([240, 76, 79]),
    Rgb([23, 159, 230]),
    Rgb([168, 100, 168]),
    Rgb([32, 163, 158]),
    Rgb([32, 38, 163]),
    Rgb([220, 42, 180]),
];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

fn project(transform: &Affine2, point: &Point) -> (f32, f32) {
    let (x, y) = transform.apply(point.x as f64, point.y as f64);
    (x as f32, y as f32)
}

/// Draw the detected face, mapped through `transform` into the corrected frame
pub fn draw_face_overlay(image: &mut RgbImage, face: &FaceGeometry, transform: &Affine2) {
    let (width, height) = (image.width() as f32, image.height() as f32);

    match face {
        FaceGeometry::Landmarks(landmarks) => {
            for (region, color) in FaceRegion::ALL.iter().zip(REGION_COLORS.iter()) {
                for point in landmarks.region(*region) {
                    let (x, y) = project(transform, point);
                    draw_filled_circle_mut(image, (x.round() as i32, y.round() as i32), 2, *color);
                }
            }

            let left = project(transform, &landmarks.left_eye_outer());
            let right = project(transform, &landmarks.right_eye_outer());
            draw_line_segment_mut(image, left, right, WHITE);
        }
        FaceGeometry::BoundingBox(bbox) => {
            let top_left = project(
                transform,
                &Point::new(bbox.x * width, bbox.y * height),
            );
            let bottom_right = project(
                transform,
                &Point::new((bbox.x + bbox.width) * width, (bbox.y + bbox.height) * height),
            );

            let rect_width = (bottom_right.0 - top_left.0).round().max(1.0) as u32;
            let rect_height = (bottom_right.1 - top_left.1).round().max(1.0) as u32;
            draw_hollow_rect_mut(
                image,
                Rect::at(top_left.0.round() as i32, top_left.1.round() as i32)
                    .of_size(rect_width, rect_height),
                WHITE,
            );

            for (i, keypoint) in bbox.keypoints.iter().enumerate() {
                let (x, y) = project(
                    transform,
                    &Point::new(keypoint.x * width, keypoint.y * height),
                );
                let color = REGION_COLORS[i % REGION_COLORS.len()];
                draw_filled_circle_mut(image, (x.round() as i32, y.round() as i32), 2, color);
            }
        }
    }
}

/// Mark the frame center, where the face anchor lands after correction
pub fn draw_center_marker(image: &mut RgbImage) {
    let center = (image.width() as i32 / 2, image.height() as i32 / 2);
    draw_filled_circle_mut(image, center, 1, RED);
}
