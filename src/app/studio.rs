use super::actions::{help_text, StudioAction};
use crate::align::{AlignOptions, FrameAligner};
use crate::config::StudioConfig;
use crate::cursor::Cursor;
use crate::error::{Result, StudioError};
use crate::export::{ExportPipeline, ExportReport};
use crate::face::{primary_face, FaceLandmarkProvider};
use crate::frame::{blank, resize_to};
use crate::sink::EncoderFactory;
use image::{ImageFormat, RgbImage};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Whether the loop keeps going after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive browse-and-export loop driven by [`StudioAction`]s
pub struct Studio {
    cursor: Cursor,
    provider: Arc<dyn FaceLandmarkProvider>,
    preview_aligner: FrameAligner,
    pipeline: ExportPipeline,
    working_resolution: (u32, u32),
    display_resolution: (u32, u32),
    preview_path: Option<PathBuf>,
    preview_correction: bool,
    export_preview: bool,
    debug: bool,
    last_report: Option<ExportReport>,
    quit_requested: bool,
}

impl Studio {
    pub fn new(
        config: &StudioConfig,
        cursor: Cursor,
        provider: Arc<dyn FaceLandmarkProvider>,
        encoders: Arc<dyn EncoderFactory>,
    ) -> Self {
        let pipeline = ExportPipeline::new(config, Arc::clone(&provider), encoders);

        Self {
            cursor,
            provider,
            preview_aligner: FrameAligner::new(AlignOptions::for_preview(&config.face)),
            pipeline,
            working_resolution: config.video.resolution,
            display_resolution: config.display.resolution,
            preview_path: config.display.preview_path.as_ref().map(PathBuf::from),
            preview_correction: config.face.preview_correction,
            export_preview: config.export.preview,
            debug: config.display.debug,
            last_report: None,
            quit_requested: false,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn last_report(&self) -> Option<&ExportReport> {
        self.last_report.as_ref()
    }

    /// Process actions until Quit or until the action source closes
    pub async fn run(&mut self, actions: &mut mpsc::UnboundedReceiver<StudioAction>) -> Result<()> {
        info!("{}", self.cursor.catalog());
        info!("{}", help_text());
        self.render().await;

        while let Some(action) = actions.recv().await {
            if self.handle(action, actions).await == Flow::Quit {
                info!("Quit requested");
                break;
            }
            self.render().await;
        }

        Ok(())
    }

    pub async fn handle(
        &mut self,
        action: StudioAction,
        actions: &mut mpsc::UnboundedReceiver<StudioAction>,
    ) -> Flow {
        debug!("Action: {:?}", action);

        match action {
            StudioAction::Next => {
                self.cursor.next().await;
            }
            StudioAction::Previous => {
                self.cursor.previous().await;
            }
            StudioAction::Last => {
                self.cursor.goto_last().await;
            }
            StudioAction::Export => {
                self.export(actions).await;
                if self.quit_requested {
                    return Flow::Quit;
                }
            }
            StudioAction::Help => info!("{}", help_text()),
            StudioAction::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    /// Run one export. With export preview enabled, Export or Quit pressed
    /// meanwhile cancels it between frames; a Quit also ends the studio.
    pub async fn export(
        &mut self,
        actions: &mut mpsc::UnboundedReceiver<StudioAction>,
    ) -> Option<ExportReport> {
        let cancel = CancellationToken::new();
        let preview = self.export_preview;
        let mut quit = false;

        let pipeline = &mut self.pipeline;
        let cursor = &mut self.cursor;

        let run = pipeline.run(cursor, &cancel, |progress| {
            if preview {
                info!(
                    "Exporting {}/{} ({:.0}%), {} written, {} skipped",
                    progress.current,
                    progress.total,
                    progress.percent(),
                    progress.written,
                    progress.skipped
                );
            }
        });
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                result = &mut run => break result,
                Some(action) = actions.recv(), if preview => match action {
                    StudioAction::Export => {
                        warn!("Cancelling export");
                        cancel.cancel();
                    }
                    StudioAction::Quit => {
                        warn!("Cancelling export, quitting afterwards");
                        quit = true;
                        cancel.cancel();
                    }
                    other => debug!("Ignoring {:?} while exporting", other),
                },
            }
        };
        self.quit_requested = quit;

        match result {
            Ok(report) => {
                info!(
                    "Export {} -> {}",
                    report.state,
                    report.output_path().display()
                );
                self.last_report = Some(report.clone());
                Some(report)
            }
            Err(e) => {
                error!("Export failed: {}", e);
                None
            }
        }
    }

    /// Show the current index. Failures are logged and replaced by a blank frame.
    pub async fn render(&self) {
        if let Err(e) = self.try_render().await {
            error!("Failed to render index {}: {}", self.cursor.index(), e);
            if let Err(e) = self.write_preview(blank(self.display_resolution)).await {
                error!("Failed to write blank preview: {}", e);
            }
        }
    }

    async fn try_render(&self) -> Result<()> {
        self.cursor.log_position();

        let (Some(file), Some(frame)) = (self.cursor.current_file(), self.cursor.current_frame())
        else {
            return self.write_preview(blank(self.display_resolution)).await;
        };

        if self.debug {
            info!("path: {}", file.path().display());
            info!("channels: {}", frame.source_channels);
        }

        let name = file.name();
        let working = resize_to(&frame.image, self.working_resolution);
        let faces = self.provider.detect(&working).await?;

        let shown = match primary_face(faces, &name) {
            Some(face) if self.preview_correction => self.preview_aligner.align(&working, Some(&face)),
            Some(_) => working,
            None => {
                warn!("No face found in {}", name);
                working
            }
        };

        self.write_preview(resize_to(&shown, self.display_resolution)).await
    }

    async fn write_preview(&self, image: RgbImage) -> Result<()> {
        let Some(path) = self.preview_path.clone() else {
            return Ok(());
        };

        tokio::task::spawn_blocking(move || image.save_with_format(&path, ImageFormat::Jpeg))
            .await
            .map_err(|e| StudioError::system(format!("Preview task failed: {}", e)))??;
        Ok(())
    }
}
