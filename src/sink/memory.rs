use super::encoder::{EncoderFactory, FrameEncoder};
use crate::error::Result;
use image::RgbImage;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything one in-memory encoder received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVideo {
    pub path: PathBuf,
    pub size: (u32, u32),
    pub fps: u32,
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

/// Encoder factory that keeps frames in memory instead of encoding them.
/// The output file is still created so path handling behaves like a real encoder.
#[derive(Clone, Default)]
pub struct MemoryEncoderFactory {
    videos: Arc<Mutex<Vec<RecordedVideo>>>,
}

impl MemoryEncoderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every video opened so far, in open order
    pub fn videos(&self) -> Vec<RecordedVideo> {
        self.videos.lock().clone()
    }

    pub fn last(&self) -> Option<RecordedVideo> {
        self.videos.lock().last().cloned()
    }
}

impl EncoderFactory for MemoryEncoderFactory {
    fn open(&self, path: &Path, width: u32, height: u32, fps: u32) -> Result<Box<dyn FrameEncoder>> {
        std::fs::write(path, b"")?;

        let mut videos = self.videos.lock();
        videos.push(RecordedVideo {
            path: path.to_path_buf(),
            size: (width, height),
            fps,
            frames: Vec::new(),
            finished: false,
        });

        Ok(Box::new(MemoryEncoder {
            slot: videos.len() - 1,
            videos: Arc::clone(&self.videos),
        }))
    }
}

struct MemoryEncoder {
    slot: usize,
    videos: Arc<Mutex<Vec<RecordedVideo>>>,
}

impl FrameEncoder for MemoryEncoder {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        self.videos.lock()[self.slot].frames.push(frame.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let (path, summary) = {
            let mut videos = self.videos.lock();
            let video = &mut videos[self.slot];
            video.finished = true;
            let summary = format!(
                "{} frames {}x{} @ {} fps\n",
                video.frames.len(),
                video.size.0,
                video.size.1,
                video.fps
            );
            (video.path.clone(), summary)
        };

        std::fs::write(path, summary)?;
        Ok(())
    }
}
