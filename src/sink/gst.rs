use super::encoder::{EncoderFactory, FrameEncoder};
use crate::error::{Result, StudioError};
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSrc;
use gstreamer_video::{VideoFormat, VideoInfo};
use image::RgbImage;
use std::path::Path;
use tracing::{debug, info, warn};

const PIPELINE_DESC: &str = "appsrc name=src ! \
     videoconvert ! \
     jpegenc quality=95 ! \
     avimux ! \
     filesink name=sink";

/// MJPEG-in-AVI encoder backed by a GStreamer pipeline
pub struct GstEncoderFactory;

impl GstEncoderFactory {
    pub fn new() -> Result<Self> {
        gstreamer::init().map_err(|e| {
            StudioError::component("video_sink", &format!("Failed to initialize GStreamer: {}", e))
        })?;
        Ok(Self)
    }
}

impl EncoderFactory for GstEncoderFactory {
    fn open(&self, path: &Path, width: u32, height: u32, fps: u32) -> Result<Box<dyn FrameEncoder>> {
        debug!("Pipeline: {}", PIPELINE_DESC);

        let pipeline = gstreamer::parse::launch(PIPELINE_DESC)
            .map_err(|e| StudioError::encoding(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| StudioError::encoding("Failed to downcast to Pipeline"))?;

        let appsrc = pipeline
            .by_name("src")
            .ok_or_else(|| StudioError::encoding("Failed to get appsrc element"))?
            .downcast::<AppSrc>()
            .map_err(|_| StudioError::encoding("Failed to downcast to AppSrc"))?;

        let sink = pipeline
            .by_name("sink")
            .ok_or_else(|| StudioError::encoding("Failed to get filesink element"))?;
        sink.set_property("location", path.to_string_lossy().as_ref());

        let video_info = VideoInfo::builder(VideoFormat::Rgb, width, height)
            .fps(gstreamer::Fraction::new(fps as i32, 1))
            .build()
            .map_err(|e| StudioError::encoding(format!("Invalid video format: {}", e)))?;
        let caps = video_info
            .to_caps()
            .map_err(|e| StudioError::encoding(format!("Failed to build caps: {}", e)))?;

        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gstreamer::Format::Time);
        appsrc.set_property("is-live", false);

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| StudioError::encoding(format!("Failed to start pipeline: {}", e)))?;

        info!(
            "Started MJPEG encoder for {} ({}x{} @ {} fps)",
            path.display(),
            width,
            height,
            fps
        );

        Ok(Box::new(GstEncoder {
            pipeline,
            appsrc,
            video_info,
            frame_ns: 1_000_000_000 / fps.max(1) as u64,
            frames: 0,
        }))
    }
}

struct GstEncoder {
    pipeline: Pipeline,
    appsrc: AppSrc,
    video_info: VideoInfo,
    frame_ns: u64,
    frames: u64,
}

impl FrameEncoder for GstEncoder {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        let row_bytes = frame.width() as usize * 3;
        let stride = self.video_info.stride()[0] as usize;

        let mut buffer = gstreamer::Buffer::with_size(self.video_info.size())
            .map_err(|e| StudioError::encoding(format!("Failed to create buffer: {}", e)))?;

        {
            let buffer_ref = buffer
                .get_mut()
                .ok_or_else(|| StudioError::encoding("Buffer is not writable"))?;
            buffer_ref.set_pts(gstreamer::ClockTime::from_nseconds(self.frames * self.frame_ns));
            buffer_ref.set_duration(gstreamer::ClockTime::from_nseconds(self.frame_ns));

            let mut map = buffer_ref
                .map_writable()
                .map_err(|e| StudioError::encoding(format!("Failed to map buffer: {}", e)))?;

            // Rows are padded to the stride GStreamer expects
            for (y, row) in frame.as_raw().chunks_exact(row_bytes).enumerate() {
                let offset = y * stride;
                map[offset..offset + row_bytes].copy_from_slice(row);
            }
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| StudioError::encoding(format!("Failed to push buffer: {:?}", e)))?;

        self.frames += 1;
        if self.frames % 100 == 0 {
            debug!("Encoded {} frames", self.frames);
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        self.appsrc
            .end_of_stream()
            .map_err(|e| StudioError::encoding(format!("Failed to signal EOS: {:?}", e)))?;

        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| StudioError::encoding("Pipeline has no bus"))?;

        let mut drained = false;
        for msg in bus.iter_timed(gstreamer::ClockTime::from_seconds(30)) {
            match msg.view() {
                gstreamer::MessageView::Eos(..) => {
                    drained = true;
                    break;
                }
                gstreamer::MessageView::Error(err) => {
                    let message = format!(
                        "Encoder pipeline error: {} ({})",
                        err.error(),
                        err.debug().unwrap_or_default()
                    );
                    let _ = self.pipeline.set_state(gstreamer::State::Null);
                    return Err(StudioError::encoding(message));
                }
                _ => {}
            }
        }

        if !drained {
            warn!("Encoder did not drain within 30 seconds, output may be truncated");
        }

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| StudioError::encoding(format!("Failed to stop pipeline: {}", e)))?;

        info!("MJPEG encoding finished: {} frames", self.frames);
        Ok(())
    }
}

impl Drop for GstEncoder {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}
