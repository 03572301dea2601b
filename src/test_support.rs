//! Fixtures shared by the unit tests.

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Write a solid-color PNG or JPEG (by extension) and pin its modification time
pub fn write_photo(path: &Path, size: (u32, u32), shade: u8, mtime_secs: u64) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }

    let image = RgbImage::from_pixel(size.0, size.1, Rgb([shade, shade / 2, 255 - shade]));
    image.save(path).unwrap();
    set_mtime(path, mtime_secs);
    path.to_path_buf()
}

pub fn set_mtime(path: &Path, secs: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

pub fn mtime(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Frame with a horizontal gradient so geometric changes are visible
pub fn gradient_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}

/// Captures formatted `tracing` output for log assertions
#[derive(Clone, Default)]
pub struct LogCapture(Arc<parking_lot::Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Install a thread-local subscriber writing into this capture
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// 68-point face whose outer eye corners and nose bridge sit where requested;
/// the remaining points are spread around the eye midpoint.
pub fn synthetic_landmarks(
    right_eye_outer: (f32, f32),
    left_eye_outer: (f32, f32),
    nose_bridge: (f32, f32),
) -> crate::face::FaceLandmarks {
    use crate::face::{FaceLandmarks, FaceRegion, Point, LANDMARK_COUNT};

    let mid = (
        (right_eye_outer.0 + left_eye_outer.0) / 2.0,
        (right_eye_outer.1 + left_eye_outer.1) / 2.0,
    );
    let mut points: Vec<Point> = (0..LANDMARK_COUNT)
        .map(|i| {
            let angle = i as f32 / LANDMARK_COUNT as f32 * std::f32::consts::TAU;
            Point::new(mid.0 + 40.0 * angle.cos(), mid.1 + 50.0 * angle.sin())
        })
        .collect();

    points[FaceRegion::RightEye.range().start] = Point::new(right_eye_outer.0, right_eye_outer.1);
    points[FaceRegion::LeftEye.range().start + 3] = Point::new(left_eye_outer.0, left_eye_outer.1);
    points[FaceRegion::Nose.range().start + 2] = Point::new(nose_bridge.0, nose_bridge.1);

    FaceLandmarks::new(points).unwrap()
}

/// Level face centered in a `width`x`height` frame at the given eye distance
pub fn centered_face(width: u32, height: u32, eye_distance: f32) -> crate::face::FaceGeometry {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    crate::face::FaceGeometry::Landmarks(synthetic_landmarks(
        (cx - eye_distance / 2.0, cy),
        (cx + eye_distance / 2.0, cy),
        (cx, cy + 10.0),
    ))
}
