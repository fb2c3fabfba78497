pub mod file;
pub mod json;
pub mod memory;
pub mod s3;

pub use file::FileHabitStore;
pub use memory::MemoryHabitStore;
pub use s3::S3HabitStore;

use std::sync::Arc;

use habit_tracker_core::{HabitRepository, StoreRepository};
use tracing::info;

use crate::config::StorageConfig;

/// Builds the repository for the configured storage backend.
pub async fn build_repository(storage: &StorageConfig) -> Arc<dyn HabitRepository> {
    match storage {
        StorageConfig::Memory => {
            info!("Using in-memory habit storage.");
            Arc::new(StoreRepository::new(MemoryHabitStore::new()))
        }
        StorageConfig::File { path } => {
            info!("Using file habit storage at {}.", path.display());
            Arc::new(StoreRepository::new(FileHabitStore::new(path.clone())))
        }
        StorageConfig::S3 {
            bucket,
            key,
            region,
            endpoint,
        } => {
            info!("Using S3 habit storage at s3://{}/{}.", bucket, key);
            let store = S3HabitStore::connect(bucket, key, region, endpoint.as_deref()).await;
            Arc::new(StoreRepository::new(store))
        }
    }
}
