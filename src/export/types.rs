use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Lifecycle of one export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    Exporting,
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportState::Idle => "idle",
            ExportState::Exporting => "exporting",
            ExportState::Completed => "completed",
            ExportState::Cancelled => "cancelled",
            ExportState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What happened to the optional audio track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioOutcome {
    /// No audio track configured
    NotConfigured,
    /// Not attempted: the export was cancelled or produced no video
    Skipped,
    /// Configured track not found; the silent video was kept
    SourceMissing,
    /// Muxed into this file; the intermediate video was removed
    Muxed(PathBuf),
    /// Mux failed; the silent video was kept
    Failed(String),
}

/// Progress after one catalog index, `current` counting from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub written: u64,
    pub skipped: u64,
}

impl ExportProgress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        self.current as f32 * 100.0 / self.total as f32
    }
}

/// Outcome of one export run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub state: ExportState,
    pub frames_total: usize,
    pub frames_written: u64,
    pub frames_skipped: u64,
    pub video_path: PathBuf,
    pub audio: AudioOutcome,
}

impl ExportReport {
    /// Final deliverable: the muxed file when audio was added, else the video
    pub fn output_path(&self) -> &Path {
        match &self.audio {
            AudioOutcome::Muxed(path) => path,
            _ => &self.video_path,
        }
    }
}
