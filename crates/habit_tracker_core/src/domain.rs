//! crates/habit_tracker_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! A `Habit` is persisted as one element of a JSON array, so the serialized
//! field names are part of the storage format shared by every backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of a habit. Assigned on create as max existing id + 1.
pub type HabitId = u64;

/// A tracked habit together with its streak counters.
///
/// `is_completed_today` and the liveness of `current_streak` are caches: they are
/// recomputed from `last_completed_at` whenever a habit is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub last_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub is_completed_today: bool,
    #[serde(default)]
    pub total_completions: u32,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    // Soft-delete marker. Deletes are hard deletes, so this stays `None`.
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by_id: Option<String>,
    #[serde(default)]
    pub updated_by_id: Option<String>,
}

/// Older collections may hold `"description": null`; read it as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Habit {
    /// Builds a brand-new habit with every counter zeroed.
    pub fn new(id: HabitId, data: NewHabit, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: data.name,
            description: data.description.unwrap_or_default(),
            last_completed_at: None,
            current_streak: 0,
            longest_streak: 0,
            is_completed_today: false,
            total_completions: 0,
            created_date: now,
            updated_date: now,
            deleted_date: None,
            created_by_id: None,
            updated_by_id: None,
        }
    }

    /// Case-insensitive name comparison used by the uniqueness constraint.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// The caller-supplied fields for a new habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
}

/// A partial update. Only the fields that are `Some` are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Aggregate statistics computed over all habits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub total_habits: usize,
    pub completed_today: usize,
    pub total_completions: u64,
    pub average_streak: f64,
}
