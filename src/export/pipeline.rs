use super::mux::AudioMuxer;
use super::types::{AudioOutcome, ExportProgress, ExportReport, ExportState};
use crate::align::{AlignOptions, FrameAligner};
use crate::config::StudioConfig;
use crate::cursor::Cursor;
use crate::error::{Result, StudioError};
use crate::face::{primary_face, FaceLandmarkProvider};
use crate::frame::resize_to;
use crate::sink::{EncoderFactory, VideoSink};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

enum FrameOutcome {
    Written,
    Skipped,
}

/// Runs the cursor through detection, alignment and encoding for every
/// catalog entry, then optionally adds the audio track.
pub struct ExportPipeline {
    provider: Arc<dyn FaceLandmarkProvider>,
    encoders: Arc<dyn EncoderFactory>,
    aligner: FrameAligner,
    muxer: AudioMuxer,
    resolution: (u32, u32),
    fps: u32,
    video_path: PathBuf,
    muxed_path: PathBuf,
    audio_source: Option<PathBuf>,
    state: ExportState,
}

impl ExportPipeline {
    pub fn new(
        config: &StudioConfig,
        provider: Arc<dyn FaceLandmarkProvider>,
        encoders: Arc<dyn EncoderFactory>,
    ) -> Self {
        Self {
            provider,
            encoders,
            aligner: FrameAligner::new(AlignOptions::for_export(&config.face, &config.export)),
            muxer: AudioMuxer::from_config(config),
            resolution: config.video.resolution,
            fps: config.video.fps,
            video_path: config.video_path(),
            muxed_path: config.muxed_path(),
            audio_source: config.audio_source(),
            state: ExportState::Idle,
        }
    }

    /// Replace the mux tool, e.g. with a longer timeout
    pub fn with_muxer(mut self, muxer: AudioMuxer) -> Self {
        self.muxer = muxer;
        self
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Export the whole catalog in order.
    ///
    /// `cancel` is checked once per catalog index; on cancellation the
    /// partial video is finalized and kept. The cursor is returned to its
    /// starting index whatever the outcome. `on_progress` is called after
    /// every index.
    pub async fn run<F>(
        &mut self,
        cursor: &mut Cursor,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<ExportReport>
    where
        F: FnMut(ExportProgress),
    {
        if cursor.is_empty() {
            error!("No data to export");
            self.state = ExportState::Idle;
            return Err(StudioError::NoData);
        }

        let saved_index = cursor.index();
        let total = cursor.len();
        self.state = ExportState::Exporting;
        info!("Exporting {} photos to {}", total, self.video_path.display());

        let mut sink = VideoSink::new(self.video_path.clone(), self.fps, Arc::clone(&self.encoders));
        let mut skipped = 0u64;
        let mut cancelled = false;

        for index in 0..total {
            if cancel.is_cancelled() {
                warn!("Export cancelled at {} of {}", index, total);
                cancelled = true;
                break;
            }

            match self.export_frame(cursor, index, &mut sink).await {
                Ok(FrameOutcome::Written) => {}
                Ok(FrameOutcome::Skipped) => skipped += 1,
                Err(e) => {
                    error!("Export failed: {}", e);
                    self.state = ExportState::Failed;
                    cursor.goto_index(saved_index).await;
                    return Err(e);
                }
            }

            on_progress(ExportProgress {
                current: index + 1,
                total,
                written: sink.frames_written(),
                skipped,
            });
        }

        let finalized = sink.close().await;
        let written = sink.frames_written();

        let (state, audio) = if cancelled {
            if let Err(e) = finalized {
                error!("Failed to finalize partial video: {}", e);
            }
            if written > 0 {
                warn!(
                    "Partial video with {} frames left at {}",
                    written,
                    self.video_path.display()
                );
            }
            (ExportState::Cancelled, AudioOutcome::Skipped)
        } else {
            if let Err(e) = finalized {
                error!("Failed to finalize video: {}", e);
                self.state = ExportState::Failed;
                cursor.goto_index(saved_index).await;
                return Err(e);
            }

            let audio = if written == 0 {
                warn!("No frame had a usable face, nothing was exported");
                AudioOutcome::Skipped
            } else {
                self.add_audio().await
            };
            (ExportState::Completed, audio)
        };

        cursor.goto_index(saved_index).await;
        self.state = state;

        info!(
            "Export {}: {} written, {} skipped of {}",
            state, written, skipped, total
        );

        Ok(ExportReport {
            state,
            frames_total: total,
            frames_written: written,
            frames_skipped: skipped,
            video_path: self.video_path.clone(),
            audio,
        })
    }

    /// Export one catalog index. Per-item problems are logged and reported as
    /// `Skipped`; only an encoder that cannot be opened is an error.
    async fn export_frame(
        &self,
        cursor: &mut Cursor,
        index: usize,
        sink: &mut VideoSink,
    ) -> Result<FrameOutcome> {
        cursor.goto_index(index).await;

        let Some(file) = cursor.current_file() else {
            return Ok(FrameOutcome::Skipped);
        };
        let name = file.name();

        let Some(frame) = cursor.current_frame() else {
            info!("Skipping {}: no image data", name);
            return Ok(FrameOutcome::Skipped);
        };
        let working = resize_to(&frame.image, self.resolution);

        let faces = match self.provider.detect(&working).await {
            Ok(faces) => faces,
            Err(e) => {
                error!("Face detection failed for {}: {}", name, e);
                return Ok(FrameOutcome::Skipped);
            }
        };

        let Some(face) = primary_face(faces, &name) else {
            warn!("No face detected in {}, skipping", name);
            return Ok(FrameOutcome::Skipped);
        };

        let aligned = self.aligner.align(&working, Some(&face));

        match sink.write(&aligned).await {
            Ok(()) => {
                debug!("Exported {} ({}/{})", name, index + 1, cursor.len());
                Ok(FrameOutcome::Written)
            }
            Err(e) if sink.is_open() => {
                error!("Failed to write {}: {}", name, e);
                Ok(FrameOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    async fn add_audio(&self) -> AudioOutcome {
        let Some(source) = &self.audio_source else {
            return AudioOutcome::NotConfigured;
        };

        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            error!(
                "Audio source {} not found, keeping silent video",
                source.display()
            );
            return AudioOutcome::SourceMissing;
        }

        match self.muxer.mux(&self.video_path, source, &self.muxed_path).await {
            Ok(()) => {
                if let Err(e) = tokio::fs::remove_file(&self.video_path).await {
                    warn!(
                        "Failed to remove intermediate video {}: {}",
                        self.video_path.display(),
                        e
                    );
                }
                AudioOutcome::Muxed(self.muxed_path.clone())
            }
            Err(e) => {
                error!("Audio mux failed, keeping silent video: {}", e);
                AudioOutcome::Failed(e.to_string())
            }
        }
    }
}
