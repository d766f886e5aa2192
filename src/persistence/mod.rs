mod manager;
mod snapshot;

pub use manager::{SaveTrigger, SnapshotConfig, SnapshotManager};
pub use snapshot::SessionSnapshot;
