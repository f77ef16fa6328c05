pub mod storage;

pub use storage::{ImageStore, StorageConfig, StorageError, StoredImage};
