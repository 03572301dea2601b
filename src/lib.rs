pub mod align;
pub mod app;
pub mod config;
pub mod cursor;
pub mod error;
pub mod export;
pub mod face;
pub mod frame;
pub mod media;
pub mod sink;

#[cfg(test)]
mod test_support;

pub use align::{AlignOptions, FrameAligner};
pub use app::{Studio, StudioAction};
pub use config::StudioConfig;
pub use cursor::Cursor;
pub use error::{Result, StudioError};
pub use export::{AudioOutcome, ExportPipeline, ExportProgress, ExportReport, ExportState};
pub use face::{FaceGeometry, FaceLandmarkProvider};
pub use frame::DecodedFrame;
pub use media::{Catalog, MediaFile, MediaIndex};
pub use sink::{EncoderFactory, FrameEncoder, VideoSink};
