use super::file::{extension_of, MediaFile};
use crate::config::DatasetConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Photo count for one dataset subfolder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub path: PathBuf,
    pub count: usize,
}

/// Ordered photo catalog, oldest modification first
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    root: Option<PathBuf>,
    loaded: bool,
    folders: Vec<FolderSummary>,
    files: Vec<MediaFile>,
}

impl Catalog {
    /// Catalog with no load attempt behind it
    pub fn unset() -> Self {
        Self::default()
    }

    /// Catalog for a root that could not be scanned
    pub fn not_found<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Build a catalog from already discovered files, applying the catalog order
    pub fn from_files<P: Into<PathBuf>>(
        root: P,
        folders: Vec<FolderSummary>,
        mut files: Vec<MediaFile>,
    ) -> Self {
        // Stable: equal timestamps keep discovery order
        files.sort_by(|a, b| a.modified_stamp().total_cmp(&b.modified_stamp()));

        Self {
            root: Some(root.into()),
            loaded: true,
            folders,
            files,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaFile> {
        self.files.get(index)
    }

    pub fn files(&self) -> &[MediaFile] {
        &self.files
    }

    pub fn folders(&self) -> &[FolderSummary] {
        &self.folders
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = match (&self.root, self.loaded) {
            (None, _) => return write!(f, "no data loaded"),
            (Some(root), false) => {
                return write!(f, "no dataset found in {}", root.display());
            }
            (Some(root), true) => root,
        };

        writeln!(f, "Data set loaded from {}", root.display())?;
        writeln!(f)?;
        for folder in &self.folders {
            let name = folder
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(f, "\t{}: {}", name, folder.count)?;
        }
        write!(f, "\n\t\ttotal: {}", self.files.len())
    }
}

/// Scans a dataset root and produces a [`Catalog`]
#[derive(Debug, Clone)]
pub struct MediaIndex {
    extensions: Vec<String>,
}

impl MediaIndex {
    /// Create an index accepting the given extensions (with or without a leading dot)
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &DatasetConfig) -> Self {
        Self::new(&config.extensions)
    }

    /// Check whether a path carries an accepted extension
    pub fn accepts(&self, path: &Path) -> bool {
        extension_of(path)
            .map(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
            .unwrap_or(false)
    }

    /// Scan the immediate subfolders of `root`. Never fails: an invalid root
    /// yields a catalog that is not loaded, unreadable entries are skipped.
    pub async fn load<P: AsRef<Path>>(&self, root: P) -> Catalog {
        let root = root.as_ref();

        let is_dir = fs::metadata(root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            warn!("Invalid dataset path {}", root.display());
            return Catalog::not_found(root);
        }

        let sub_folders = match list_entries(root, EntryKind::Dir).await {
            Ok(folders) => folders,
            Err(e) => {
                warn!("Failed to read dataset path {}: {}", root.display(), e);
                return Catalog::not_found(root);
            }
        };

        let mut folders = Vec::with_capacity(sub_folders.len());
        let mut files = Vec::new();

        for folder in sub_folders {
            let entries = match list_entries(&folder, EntryKind::File).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping unreadable folder {}: {}", folder.display(), e);
                    continue;
                }
            };

            let mut count = 0;
            for path in entries.into_iter().filter(|p| self.accepts(p)) {
                files.push(MediaFile::discover(&path).await);
                count += 1;
            }

            debug!("Discovered {} files in {}", count, folder.display());
            folders.push(FolderSummary {
                path: folder,
                count,
            });
        }

        let catalog = Catalog::from_files(root, folders, files);
        info!(
            "Loaded {} files from {} folders in {}",
            catalog.len(),
            catalog.folders().len(),
            root.display()
        );

        catalog
    }
}

#[derive(Clone, Copy, PartialEq)]
enum EntryKind {
    Dir,
    File,
}

/// Entries of one kind in `dir`, sorted by name
async fn list_entries(dir: &Path, kind: EntryKind) -> std::io::Result<Vec<PathBuf>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let matches = match kind {
            EntryKind::Dir => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        };
        if matches {
            entries.push(entry.path());
        }
    }

    entries.sort();
    Ok(entries)
}
