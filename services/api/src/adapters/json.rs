//! services/api/src/adapters/json.rs
//!
//! The on-disk / in-bucket representation shared by every persistent backend:
//! one JSON array holding the full habit collection.

use habit_tracker_core::domain::Habit;
use habit_tracker_core::ports::{PortError, PortResult};

/// Parses a stored collection. Blank content is an empty collection.
pub fn decode_collection(raw: &str) -> Result<Vec<Habit>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}

/// Serializes a collection as pretty-printed JSON with two-space indentation.
pub fn encode_collection(habits: &[Habit]) -> PortResult<String> {
    serde_json::to_string_pretty(habits).map_err(|e| PortError::Persistence(e.to_string()))
}
