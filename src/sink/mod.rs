mod core;
mod encoder;
#[cfg(all(target_os = "linux", feature = "video_encoding"))]
mod gst;
mod memory;

pub use self::core::VideoSink;
pub use encoder::{default_encoder_factory, EncoderFactory, FrameEncoder};
#[cfg(all(target_os = "linux", feature = "video_encoding"))]
pub use gst::GstEncoderFactory;
pub use memory::{MemoryEncoderFactory, RecordedVideo};
