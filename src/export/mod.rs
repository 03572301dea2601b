mod mux;
mod pipeline;
mod types;

pub use mux::AudioMuxer;
pub use pipeline::ExportPipeline;
pub use types::{AudioOutcome, ExportProgress, ExportReport, ExportState};
