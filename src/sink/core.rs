use super::encoder::{EncoderFactory, FrameEncoder};
use crate::error::{Result, StudioError};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

enum SinkState {
    /// No frame seen yet; output size unknown
    Unbound,
    Open {
        encoder: Box<dyn FrameEncoder>,
        size: (u32, u32),
    },
    Closed,
}

/// Lazily opened, append-only video output.
///
/// The first frame binds the output size. Later frames of another size are
/// rejected with [`StudioError::DimensionMismatch`]; the caller is expected to
/// resize to the working resolution beforehand.
pub struct VideoSink {
    path: PathBuf,
    fps: u32,
    factory: Arc<dyn EncoderFactory>,
    state: SinkState,
    frames_written: u64,
}

impl VideoSink {
    pub fn new<P: Into<PathBuf>>(path: P, fps: u32, factory: Arc<dyn EncoderFactory>) -> Self {
        Self {
            path: path.into(),
            fps,
            factory,
            state: SinkState::Unbound,
            frames_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// True once the encoder has been opened and until `close`
    pub fn is_open(&self) -> bool {
        matches!(self.state, SinkState::Open { .. })
    }

    /// Size bound by the first frame, if any
    pub fn size(&self) -> Option<(u32, u32)> {
        match &self.state {
            SinkState::Open { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// Append a frame, opening the encoder on the first call
    pub async fn write(&mut self, frame: &RgbImage) -> Result<()> {
        if matches!(self.state, SinkState::Closed) {
            return Err(StudioError::encoding(format!(
                "Write to closed video {}",
                self.path.display()
            )));
        }

        if matches!(self.state, SinkState::Unbound) {
            self.bind(frame.dimensions()).await?;
        }

        if let SinkState::Open { encoder, size } = &mut self.state {
            if frame.dimensions() != *size {
                return Err(StudioError::DimensionMismatch {
                    expected: *size,
                    actual: frame.dimensions(),
                });
            }

            encoder.append(frame)?;
            self.frames_written += 1;
        }

        Ok(())
    }

    async fn bind(&mut self, size: (u32, u32)) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if !tokio::fs::try_exists(dir).await? {
                tokio::fs::create_dir_all(dir).await?;
                warn!("Created missing export directory {}", dir.display());
            }
        }

        if tokio::fs::try_exists(&self.path).await? {
            tokio::fs::remove_file(&self.path).await?;
            warn!("Removed stale output file {}", self.path.display());
        }

        let encoder = self.factory.open(&self.path, size.0, size.1, self.fps)?;
        info!(
            "Writing video {} ({}x{} @ {} fps)",
            self.path.display(),
            size.0,
            size.1,
            self.fps
        );

        self.state = SinkState::Open { encoder, size };
        Ok(())
    }

    /// Finalize the output. Safe to call before any write and more than once.
    pub async fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SinkState::Closed) {
            SinkState::Unbound => {
                debug!("Closing video sink with no frames written");
                self.state = SinkState::Unbound;
                Ok(())
            }
            SinkState::Open { encoder, .. } => {
                tokio::task::spawn_blocking(move || encoder.finish())
                    .await
                    .map_err(|e| StudioError::system(format!("Encoder task failed: {}", e)))??;

                info!(
                    "Closed video {} after {} frames",
                    self.path.display(),
                    self.frames_written
                );
                Ok(())
            }
            SinkState::Closed => Ok(()),
        }
    }
}
