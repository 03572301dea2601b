use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Combines the silent export with an audio track using an external media tool
#[derive(Debug, Clone)]
pub struct AudioMuxer {
    program: String,
    timeout: Duration,
}

impl AudioMuxer {
    pub fn new<S: Into<String>>(program: S, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(
            config.audio.ffmpeg.clone(),
            Duration::from_secs(config.export.mux_timeout_seconds),
        )
    }

    /// Pad the audio to the video length, copy the video stream, stop at the
    /// shorter stream
    pub fn args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "panic", "-y", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(video.into());
        args.push("-i".into());
        args.push(audio.into());
        args.extend(
            ["-af", "apad", "-map", "0:v", "-map", "1:a", "-c:v", "copy", "-shortest"]
                .iter()
                .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    pub async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        let args = Self::args(video, audio, output);
        debug!(program = %self.program, args = ?args, "Running audio mux");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                StudioError::component(
                    "audio_mux",
                    &format!("{} timed out after {:?}", self.program, self.timeout),
                )
            })?
            .map_err(|e| {
                StudioError::component(
                    "audio_mux",
                    &format!("Failed to start {}: {}", self.program, e),
                )
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(StudioError::component(
                "audio_mux",
                &format!(
                    "{} exited with {}: {}",
                    self.program,
                    result.status,
                    stderr.trim()
                ),
            ));
        }

        if !tokio::fs::try_exists(output).await? {
            return Err(StudioError::component(
                "audio_mux",
                &format!("{} produced no output at {}", self.program, output.display()),
            ));
        }

        info!("Muxed {} into {}", audio.display(), output.display());
        Ok(())
    }
}
