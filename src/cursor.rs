use crate::frame::DecodedFrame;
use crate::media::{Catalog, MediaFile};
use tracing::{debug, error, info, warn};

/// Navigator over a [`Catalog`] that decodes the current photo on demand.
///
/// The index is clamped, never wrapped. A photo that fails to decode leaves
/// the current frame empty; callers treat that as "no data for this index".
pub struct Cursor {
    catalog: Catalog,
    index: usize,
    frame: Option<DecodedFrame>,
}

impl Cursor {
    /// Cursor over a catalog, positioned at the most recent photo
    pub async fn open(catalog: Catalog) -> Self {
        let mut cursor = Self {
            catalog,
            index: 0,
            frame: None,
        };

        if !cursor.catalog.is_empty() {
            let last = cursor.catalog.len() - 1;
            cursor.load(last).await;
        }

        cursor
    }

    /// Cursor without any dataset
    pub fn empty() -> Self {
        Self {
            catalog: Catalog::unset(),
            index: 0,
            frame: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn current_file(&self) -> Option<&MediaFile> {
        self.catalog.get(self.index)
    }

    pub fn current_frame(&self) -> Option<&DecodedFrame> {
        self.frame.as_ref()
    }

    /// Move to the next photo. Returns false at the upper bound.
    pub async fn next(&mut self) -> bool {
        if !self.has_data() {
            return false;
        }

        if self.index + 1 < self.catalog.len() {
            self.load(self.index + 1).await;
            true
        } else {
            warn!("Index exceeds limit ({} of {})", self.index, self.catalog.len());
            false
        }
    }

    /// Move to the previous photo. Returns false at the lower bound.
    pub async fn previous(&mut self) -> bool {
        if !self.has_data() {
            return false;
        }

        if self.index > 0 {
            self.load(self.index - 1).await;
            true
        } else {
            warn!("Minimum index limit reached");
            false
        }
    }

    /// Jump to the most recent photo
    pub async fn goto_last(&mut self) -> bool {
        if !self.has_data() {
            return false;
        }

        let last = self.catalog.len() - 1;
        self.load(last).await;
        true
    }

    /// Jump to `index`. Out-of-range requests are rejected without side effects.
    pub async fn goto_index(&mut self, index: usize) -> bool {
        if !self.has_data() {
            return false;
        }

        if index >= self.catalog.len() {
            warn!(
                "Rejected jump to index {} (catalog holds {} files)",
                index,
                self.catalog.len()
            );
            return false;
        }

        self.load(index).await;
        true
    }

    fn has_data(&self) -> bool {
        if self.catalog.is_empty() {
            warn!("No dataset loaded");
            return false;
        }
        true
    }

    async fn load(&mut self, index: usize) {
        self.index = index;
        self.frame = None;

        let Some(file) = self.catalog.get(index) else {
            return;
        };

        if !file.exists() {
            warn!("File {} no longer exists", file.path().display());
            return;
        }

        match DecodedFrame::decode(file.path()).await {
            Ok(frame) => {
                debug!(
                    "Loaded index {}: {} ({}x{}x{})",
                    index,
                    file.path().display(),
                    frame.width(),
                    frame.height(),
                    frame.source_channels
                );
                self.frame = Some(frame);
            }
            Err(e) => {
                error!("Failed to decode {}: {}", file.path().display(), e);
            }
        }
    }

    /// Log the current position the way the studio overlay shows it
    pub fn log_position(&self) {
        let Some(file) = self.current_file() else {
            info!("No dataset loaded");
            return;
        };

        let size = self
            .frame
            .as_ref()
            .map(|f| format!("{}x{}x{}", f.width(), f.height(), f.source_channels))
            .unwrap_or_else(|| "no data".to_string());

        info!("idx: {}/{}", self.index, self.catalog.len());
        info!("file: {}", file);
        info!("size: {}", size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaIndex;
    use crate::test_support::write_photo;

    async fn cursor_with(count: usize) -> (tempfile::TempDir, Cursor) {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..count {
            write_photo(
                &dir.path().join(format!("set/IMG_{:03}.png", i)),
                (6, 4),
                (i * 10) as u8,
                1_000 + i as u64,
            );
        }
        let catalog = MediaIndex::new(["png"]).load(dir.path()).await;
        (dir, Cursor::open(catalog).await)
    }

    #[tokio::test]
    async fn test_opens_at_last_entry() {
        let (_dir, cursor) = cursor_with(4).await;

        assert_eq!(cursor.index(), 3);
        assert_eq!(cursor.current_file().unwrap().name(), "IMG_003");
        assert!(cursor.current_frame().is_some());
    }

    #[tokio::test]
    async fn test_bounds_are_clamped() {
        let (_dir, mut cursor) = cursor_with(3).await;

        assert!(!cursor.next().await);
        assert_eq!(cursor.index(), 2);

        assert!(cursor.previous().await);
        assert!(cursor.previous().await);
        assert!(!cursor.previous().await);
        assert_eq!(cursor.index(), 0);
    }

    #[tokio::test]
    async fn test_walk_down_and_back_returns_to_start() {
        let (_dir, mut cursor) = cursor_with(5).await;
        let start = cursor.index();

        // At the last entry next() is a bounded no-op
        cursor.next().await;
        for _ in 0..cursor.len() - 1 {
            cursor.previous().await;
        }
        assert_eq!(cursor.index(), 0);

        for _ in 0..cursor.len() - 1 {
            cursor.next().await;
        }
        assert_eq!(cursor.index(), start);

        cursor.goto_index(1).await;
        cursor.next().await;
        cursor.previous().await;
        assert_eq!(cursor.index(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_jump_has_no_side_effects() {
        let (_dir, mut cursor) = cursor_with(3).await;
        cursor.goto_index(1).await;
        let name = cursor.current_file().unwrap().name();

        assert!(!cursor.goto_index(3).await);
        assert!(!cursor.goto_index(usize::MAX).await);
        assert_eq!(cursor.index(), 1);
        assert_eq!(cursor.current_file().unwrap().name(), name);
        assert!(cursor.current_frame().is_some());
    }

    #[tokio::test]
    async fn test_goto_last() {
        let (_dir, mut cursor) = cursor_with(3).await;
        cursor.goto_index(0).await;

        assert!(cursor.goto_last().await);
        assert_eq!(cursor.index(), 2);
    }

    #[tokio::test]
    async fn test_navigation_without_dataset_is_noop() {
        let mut cursor = Cursor::empty();

        assert!(!cursor.next().await);
        assert!(!cursor.previous().await);
        assert!(!cursor.goto_last().await);
        assert!(!cursor.goto_index(0).await);
        assert_eq!(cursor.index(), 0);
        assert!(cursor.current_frame().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_file_leaves_frame_empty() {
        let (dir, _) = cursor_with(0).await;
        write_photo(&dir.path().join("set/good.png"), (4, 4), 1, 10);
        let broken = dir.path().join("set/broken.png");
        std::fs::write(&broken, b"garbage").unwrap();
        crate::test_support::set_mtime(&broken, 20);

        let catalog = MediaIndex::new(["png"]).load(dir.path()).await;
        let mut cursor = Cursor::open(catalog).await;

        assert_eq!(cursor.current_file().unwrap().name(), "broken");
        assert!(cursor.current_frame().is_none());

        assert!(cursor.previous().await);
        assert!(cursor.current_frame().is_some());
    }
}
