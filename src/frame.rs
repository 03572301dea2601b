use crate::error::{Result, StudioError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use std::path::Path;
use tracing::debug;

/// Decoded photo, normalized to 8-bit RGB
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Pixel data
    pub image: RgbImage,
    /// Channel count of the source file before conversion
    pub source_channels: u8,
}

impl DecodedFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Decode an image file on the blocking pool
    pub async fn decode<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let decoded = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| StudioError::system(format!("Decode task failed: {}", e)))??;

        let source_channels = decoded.color().channel_count();
        debug!(
            "Decoded {}x{} frame with {} channels",
            decoded.width(),
            decoded.height(),
            source_channels
        );

        Ok(Self {
            image: decoded.to_rgb8(),
            source_channels,
        })
    }
}

/// Resize to exactly `size`, returning the input untouched when it already matches
pub fn resize_to(image: &RgbImage, size: (u32, u32)) -> RgbImage {
    if image.dimensions() == size {
        return image.clone();
    }
    imageops::resize(image, size.0, size.1, FilterType::Triangle)
}

/// Desaturate to luma and replicate it into three channels
pub fn grayscale_rgb(image: &RgbImage) -> RgbImage {
    DynamicImage::ImageLuma8(imageops::grayscale(image)).to_rgb8()
}

/// Black placeholder shown when there is no data for an index
pub fn blank(size: (u32, u32)) -> RgbImage {
    RgbImage::new(size.0, size.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gradient_frame, write_photo};
    use image::Rgb;

    #[tokio::test]
    async fn test_decode_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_photo(&dir.path().join("a.png"), (12, 7), 100, 1);

        let frame = DecodedFrame::decode(&path).await.unwrap();
        assert_eq!((frame.width(), frame.height()), (12, 7));
        assert_eq!(frame.source_channels, 3);
        assert_eq!(*frame.image.get_pixel(0, 0), Rgb([100, 50, 155]));
    }

    #[tokio::test]
    async fn test_decode_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(DecodedFrame::decode(&path).await.is_err());
    }

    #[test]
    fn test_grayscale_keeps_three_equal_channels() {
        let gray = grayscale_rgb(&gradient_frame(16, 9));

        assert_eq!(gray.dimensions(), (16, 9));
        for pixel in gray.pixels() {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn test_resize_to() {
        let frame = gradient_frame(32, 18);

        assert_eq!(resize_to(&frame, (16, 9)).dimensions(), (16, 9));
        assert_eq!(resize_to(&frame, (32, 18)), frame);
        assert!(blank((4, 2)).pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
