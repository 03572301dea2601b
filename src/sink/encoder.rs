use crate::error::Result;
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;

/// Append-only encoder for one output file
pub trait FrameEncoder: Send {
    /// Append a frame; the caller guarantees the size given at open time
    fn append(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flush and finalize the container. May block until the encoder drains.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Opens encoders once the output size is known
pub trait EncoderFactory: Send + Sync {
    fn open(&self, path: &Path, width: u32, height: u32, fps: u32) -> Result<Box<dyn FrameEncoder>>;
}

/// Encoder backend for the current platform
pub fn default_encoder_factory() -> Result<Arc<dyn EncoderFactory>> {
    #[cfg(all(target_os = "linux", feature = "video_encoding"))]
    {
        Ok(Arc::new(super::gst::GstEncoderFactory::new()?))
    }

    #[cfg(not(all(target_os = "linux", feature = "video_encoding")))]
    {
        Err(crate::error::StudioError::component(
            "video_sink",
            "Video encoding not available on this platform",
        ))
    }
}
