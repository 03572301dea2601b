use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Immutable studio configuration, built once at startup and shared by reference
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StudioConfig {
    pub dataset: DatasetConfig,
    pub video: VideoConfig,
    pub export: ExportConfig,
    pub face: FaceConfig,
    pub audio: AudioConfig,
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatasetConfig {
    /// Root folder; photos live one level down, one subfolder per period
    #[serde(default = "default_dataset_path")]
    pub path: String,

    /// Accepted file extensions, compared case-insensitively
    #[serde(default = "default_dataset_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VideoConfig {
    /// Working frame size every decoded photo is resized to (width, height)
    #[serde(default = "default_video_resolution")]
    pub resolution: (u32, u32),

    /// Output frame rate
    #[serde(default = "default_video_fps")]
    pub fps: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportConfig {
    /// Directory receiving the exported video
    #[serde(default = "default_export_path")]
    pub path: String,

    /// Base file name, without extension
    #[serde(default = "default_export_name")]
    pub name: String,

    /// Export frames desaturated (still three channels)
    #[serde(default = "default_export_grayscale")]
    pub grayscale: bool,

    /// Draw landmark/debug overlay into exported frames
    #[serde(default = "default_export_visuals")]
    pub visuals: bool,

    /// Report per-frame progress and listen for cancel keys while exporting
    #[serde(default = "default_export_preview")]
    pub preview: bool,

    /// Upper bound for the audio mux subprocess
    #[serde(default = "default_mux_timeout")]
    pub mux_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FaceBackend {
    /// 68-point landmark detector
    Landmarks68,
    /// Relative bounding box plus sparse keypoints
    BoundingBox,
}

impl FaceBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceBackend::Landmarks68 => "landmarks68",
            FaceBackend::BoundingBox => "bounding_box",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlignAnchor {
    /// Midpoint between the outer eye corners
    EyeMidpoint,
    /// Upper nose bridge landmark
    NoseBridge,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FaceConfig {
    /// Detector backend the external detector runs
    #[serde(default = "default_face_backend")]
    pub backend: FaceBackend,

    /// Pretrained landmark/detection model handed to the detector
    #[serde(default)]
    pub model_path: Option<String>,

    /// External detector executable
    #[serde(default)]
    pub detector_command: Option<String>,

    /// Upper bound for one detector run, a timed out frame is skipped
    #[serde(default = "default_detector_timeout")]
    pub detector_timeout_seconds: u64,

    /// Normalize face size (scale step of the correction)
    #[serde(default = "default_face_correction")]
    pub correction: bool,

    /// Target face width as a fraction of the frame (bounding-box backend)
    #[serde(default = "default_correction_factor")]
    pub correction_factor: f32,

    /// Outer-eye-corner distance in pixels that maps to scale 1.0 (68-point backend).
    /// Tuned for a 640x360 working resolution.
    #[serde(default = "default_reference_eye_distance")]
    pub reference_eye_distance: f32,

    /// Landmark recentred onto the frame center
    #[serde(default = "default_align_anchor")]
    pub anchor: AlignAnchor,

    /// Show the corrected frame while browsing
    #[serde(default = "default_preview_correction")]
    pub preview_correction: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AudioConfig {
    /// Audio file name looked up in `directory`
    #[serde(default)]
    pub track: Option<String>,

    /// Folder holding audio tracks
    #[serde(default = "default_audio_directory")]
    pub directory: String,

    /// Media tool used to mux the audio track
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    /// Preview size (width, height)
    #[serde(default = "default_display_resolution")]
    pub resolution: (u32, u32),

    /// JPEG refreshed with the current preview frame
    #[serde(default)]
    pub preview_path: Option<String>,

    /// Log extra per-frame details while browsing
    #[serde(default = "default_display_debug")]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for a daily rolling log file
    #[serde(default)]
    pub directory: Option<String>,
}

impl StudioConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("everyday.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("dataset.path", default_dataset_path())?
            .set_default("dataset.extensions", default_dataset_extensions())?
            .set_default(
                "video.resolution",
                vec![default_video_resolution().0, default_video_resolution().1],
            )?
            .set_default("video.fps", default_video_fps())?
            .set_default("export.path", default_export_path())?
            .set_default("export.name", default_export_name())?
            .set_default("export.grayscale", default_export_grayscale())?
            .set_default("export.visuals", default_export_visuals())?
            .set_default("export.preview", default_export_preview())?
            .set_default("export.mux_timeout_seconds", default_mux_timeout())?
            .set_default("face.backend", default_face_backend().as_str())?
            .set_default("face.detector_timeout_seconds", default_detector_timeout())?
            .set_default("face.correction", default_face_correction())?
            .set_default(
                "face.correction_factor",
                default_correction_factor() as f64,
            )?
            .set_default(
                "face.reference_eye_distance",
                default_reference_eye_distance() as f64,
            )?
            .set_default("face.anchor", "eye_midpoint")?
            .set_default("face.preview_correction", default_preview_correction())?
            .set_default("audio.directory", default_audio_directory())?
            .set_default("audio.ffmpeg", default_ffmpeg())?
            .set_default(
                "display.resolution",
                vec![
                    default_display_resolution().0,
                    default_display_resolution().1,
                ],
            )?
            .set_default("display.debug", default_display_debug())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables, e.g. EVERYDAY_VIDEO__FPS=24
            .add_source(
                Environment::with_prefix("EVERYDAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: StudioConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video.resolution.0 == 0 || self.video.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Video resolution must be greater than 0".to_string(),
            ));
        }

        if self.video.fps == 0 {
            return Err(ConfigError::Message(
                "Video fps must be greater than 0".to_string(),
            ));
        }

        if self.display.resolution.0 == 0 || self.display.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Display resolution must be greater than 0".to_string(),
            ));
        }

        if self.export.name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Export name must not be empty".to_string(),
            ));
        }

        if self.dataset.extensions.is_empty() {
            return Err(ConfigError::Message(
                "At least one dataset extension is required".to_string(),
            ));
        }

        if self.face.detector_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Face detector_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if !(self.face.correction_factor > 0.0) {
            return Err(ConfigError::Message(
                "Face correction_factor must be greater than 0".to_string(),
            ));
        }

        if !(self.face.reference_eye_distance > 0.0) {
            return Err(ConfigError::Message(
                "Face reference_eye_distance must be greater than 0".to_string(),
            ));
        }

        // A configured detector needs its model asset up front
        if self.face.detector_command.is_some() {
            match &self.face.model_path {
                Some(model) if Path::new(model).is_file() => {}
                Some(model) => {
                    return Err(ConfigError::Message(format!(
                        "Face model asset not found: {}",
                        model
                    )));
                }
                None => {
                    return Err(ConfigError::Message(
                        "face.model_path is required when face.detector_command is set"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Path of the intermediate video: `{export.path}/{export.name}.avi`
    pub fn video_path(&self) -> PathBuf {
        PathBuf::from(&self.export.path).join(format!("{}.avi", self.export.name))
    }

    /// Path of the muxed video: `{export.path}/{export.name}.mp4`
    pub fn muxed_path(&self) -> PathBuf {
        PathBuf::from(&self.export.path).join(format!("{}.mp4", self.export.name))
    }

    /// Configured audio source, if any
    pub fn audio_source(&self) -> Option<PathBuf> {
        self.audio
            .track
            .as_ref()
            .map(|track| PathBuf::from(&self.audio.directory).join(track))
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig {
                path: default_dataset_path(),
                extensions: default_dataset_extensions(),
            },
            video: VideoConfig {
                resolution: default_video_resolution(),
                fps: default_video_fps(),
            },
            export: ExportConfig {
                path: default_export_path(),
                name: default_export_name(),
                grayscale: default_export_grayscale(),
                visuals: default_export_visuals(),
                preview: default_export_preview(),
                mux_timeout_seconds: default_mux_timeout(),
            },
            face: FaceConfig {
                backend: default_face_backend(),
                model_path: None,
                detector_command: None,
                detector_timeout_seconds: default_detector_timeout(),
                correction: default_face_correction(),
                correction_factor: default_correction_factor(),
                reference_eye_distance: default_reference_eye_distance(),
                anchor: default_align_anchor(),
                preview_correction: default_preview_correction(),
            },
            audio: AudioConfig {
                track: None,
                directory: default_audio_directory(),
                ffmpeg: default_ffmpeg(),
            },
            display: DisplayConfig {
                resolution: default_display_resolution(),
                preview_path: None,
                debug: default_display_debug(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

// Default value functions
fn default_dataset_path() -> String {
    "./media/images".to_string()
}
fn default_dataset_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()]
}

fn default_video_resolution() -> (u32, u32) {
    (640, 360)
}
fn default_video_fps() -> u32 {
    30
}

fn default_export_path() -> String {
    "./export".to_string()
}
fn default_export_name() -> String {
    "every_day".to_string()
}
fn default_export_grayscale() -> bool {
    true
}
fn default_export_visuals() -> bool {
    false
}
fn default_export_preview() -> bool {
    true
}
fn default_mux_timeout() -> u64 {
    300
}

fn default_face_backend() -> FaceBackend {
    FaceBackend::Landmarks68
}
fn default_detector_timeout() -> u64 {
    30
}
fn default_face_correction() -> bool {
    true
}
fn default_correction_factor() -> f32 {
    0.3
}
fn default_reference_eye_distance() -> f32 {
    150.0
}
fn default_align_anchor() -> AlignAnchor {
    AlignAnchor::EyeMidpoint
}
fn default_preview_correction() -> bool {
    true
}

fn default_audio_directory() -> String {
    "./media/sound".to_string()
}
fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_display_resolution() -> (u32, u32) {
    (640, 360)
}
fn default_display_debug() -> bool {
    false
}
