//! services/api/src/adapters/file.rs
//!
//! Stores the whole habit collection as a JSON array in a single local file.
//! The file is read and rewritten in full on every call.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use habit_tracker_core::domain::Habit;
use habit_tracker_core::ports::{HabitStore, PortError, PortResult};
use tokio::fs;
use tracing::warn;

use crate::adapters::json::{decode_collection, encode_collection};

/// A `HabitStore` backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileHabitStore {
    path: PathBuf,
}

impl FileHabitStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn write_raw(&self, contents: &str) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, contents)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, e: std::io::Error) -> PortError {
        PortError::Persistence(format!("{}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl HabitStore for FileHabitStore {
    async fn load(&self) -> PortResult<Vec<Habit>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.write_raw("[]").await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        match decode_collection(&raw) {
            Ok(habits) => Ok(habits),
            Err(e) => {
                warn!(
                    "Error reading {}, starting with an empty collection: {}",
                    self.path.display(),
                    e
                );
                self.write_raw("[]").await?;
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, habits: &[Habit]) -> PortResult<()> {
        let contents = encode_collection(habits)?;
        self.write_raw(&contents).await
    }
}
