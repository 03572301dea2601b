use super::geometry::{FaceGeometry, FaceLandmarks, Point, RelativeBox};
use super::provider::FaceLandmarkProvider;
use crate::config::{FaceBackend, FaceConfig};
use crate::error::{Result, StudioError};
use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde::Deserialize;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct DetectorOutput {
    #[serde(default)]
    faces: Vec<RawFace>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFace {
    Landmarks {
        landmarks: Vec<[f32; 2]>,
    },
    BoundingBox {
        bbox: [f32; 4],
        #[serde(default)]
        keypoints: Vec<[f32; 2]>,
    },
}

/// Parse the detector's JSON document into face geometries
pub fn parse_detector_output(json: &[u8]) -> Result<Vec<FaceGeometry>> {
    let output: DetectorOutput = serde_json::from_slice(json)?;

    output
        .faces
        .into_iter()
        .map(|face| match face {
            RawFace::Landmarks { landmarks } => {
                let points = landmarks.iter().map(|[x, y]| Point::new(*x, *y)).collect();
                Ok(FaceGeometry::Landmarks(FaceLandmarks::new(points)?))
            }
            RawFace::BoundingBox { bbox, keypoints } => {
                let [x, y, width, height] = bbox;
                Ok(FaceGeometry::BoundingBox(RelativeBox {
                    x,
                    y,
                    width,
                    height,
                    keypoints: keypoints.iter().map(|[x, y]| Point::new(*x, *y)).collect(),
                }))
            }
        })
        .collect()
}

/// Face detector running as an external process.
///
/// The frame is written to the process stdin as PNG and the detector answers
/// on stdout with `{"faces": [...]}`. The model asset is checked once here and
/// loaded by the detector itself.
pub struct ExternalLandmarkProvider {
    command: String,
    model_path: PathBuf,
    backend: FaceBackend,
    timeout: Duration,
}

impl ExternalLandmarkProvider {
    pub fn new<P: AsRef<Path>>(command: &str, model_path: P, backend: FaceBackend) -> Result<Self> {
        let model_path = model_path.as_ref().to_path_buf();
        if !model_path.is_file() {
            return Err(StudioError::detection(format!(
                "Face model asset not found: {}",
                model_path.display()
            )));
        }

        info!(
            "Using external {} detector '{}' with model {}",
            backend.as_str(),
            command,
            model_path.display()
        );

        Ok(Self {
            command: command.to_string(),
            model_path,
            backend,
            timeout: Duration::from_secs(30),
        })
    }

    /// Bound a single detector run; the process is killed when it expires
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build from the `[face]` section; both the command and model are required
    pub fn from_config(config: &FaceConfig) -> Result<Self> {
        let command = config.detector_command.as_deref().ok_or_else(|| {
            StudioError::detection("face.detector_command is not configured")
        })?;
        let model = config
            .model_path
            .as_deref()
            .ok_or_else(|| StudioError::detection("face.model_path is not configured"))?;

        Ok(Self::new(command, model, config.backend)?
            .with_timeout(Duration::from_secs(config.detector_timeout_seconds)))
    }

    async fn run(&self, png: &[u8]) -> Result<std::process::Output> {
        let mut child = Command::new(&self.command)
            .arg("--model")
            .arg(&self.model_path)
            .arg("--backend")
            .arg(self.backend.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                StudioError::detection(format!("Failed to start detector {}: {}", self.command, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StudioError::detection("Failed to open detector stdin"))?;

        // stdout/stderr are drained while the frame is still being written
        let write = async move {
            let written = stdin.write_all(png).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(StudioError::detection(format!(
                "Detector exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // A detector may answer without reading the whole frame
        if let Err(e) = written {
            debug!("Detector closed stdin early: {}", e);
        }

        Ok(output)
    }
}

#[async_trait]
impl FaceLandmarkProvider for ExternalLandmarkProvider {
    async fn detect(&self, frame: &RgbImage) -> Result<Vec<FaceGeometry>> {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(frame.clone())
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;

        let output = tokio::time::timeout(self.timeout, self.run(&png))
            .await
            .map_err(|_| {
                StudioError::detection(format!(
                    "Detector {} timed out after {:?}",
                    self.command, self.timeout
                ))
            })??;

        let faces = parse_detector_output(&output.stdout)?;
        debug!("Detector returned {} faces", faces.len());
        Ok(faces)
    }
}
