mod file;
mod index;

pub use file::MediaFile;
pub use index::{Catalog, FolderSummary, MediaIndex};
