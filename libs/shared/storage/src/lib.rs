pub mod snapshot;

pub use snapshot::{SnapshotStore, StorageError, StorageMode};
