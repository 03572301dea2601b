use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

/// One discovered photo. Timestamps are read once at discovery and never refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    path: PathBuf,
    exists: bool,
    extension: Option<String>,
    created: Option<SystemTime>,
    modified: Option<SystemTime>,
}

impl MediaFile {
    /// Stat `path` and capture its timestamps
    pub async fn discover<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Self {
                extension: extension_of(&path),
                created: meta.created().ok(),
                modified: meta.modified().ok(),
                exists: true,
                path,
            },
            _ => Self::missing(path),
        }
    }

    /// A file that was not found on disk
    pub fn missing<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            exists: false,
            extension: None,
            created: None,
            modified: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Lower-cased extension without the dot
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// File stem, empty for missing files
    pub fn name(&self) -> String {
        if !self.exists {
            return String::new();
        }
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn created(&self) -> Option<SystemTime> {
        self.created
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn created_date(&self) -> Option<DateTime<Local>> {
        self.created.map(DateTime::<Local>::from)
    }

    pub fn modified_date(&self) -> Option<DateTime<Local>> {
        self.modified.map(DateTime::<Local>::from)
    }

    /// Seconds since the epoch of the creation time, 0.0 when unavailable
    pub fn created_stamp(&self) -> f64 {
        stamp(self.created)
    }

    /// Seconds since the epoch of the modification time, 0.0 when unavailable
    pub fn modified_stamp(&self) -> f64 {
        stamp(self.modified)
    }
}

impl fmt::Display for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_date = |date: Option<DateTime<Local>>| {
            date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string())
        };

        write!(
            f,
            "{} (exists: {}, ext: {}, created: {}, modified: {})",
            self.path.display(),
            self.exists,
            self.extension().unwrap_or("-"),
            fmt_date(self.created_date()),
            fmt_date(self.modified_date()),
        )
    }
}

pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn stamp(time: Option<SystemTime>) -> f64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
