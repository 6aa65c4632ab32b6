mod error;
mod hash;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FsArchiveStore;
pub use hash::ContentHash;
pub use traits::{ArchiveStore, BoxReader};
