//! crates/habit_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of where habits are actually stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Habit, HabitId, HabitPatch, NewHabit};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (filesystem, S3).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Name conflict: {0}")]
    NameConflict(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The habit repository contract. Every backend implements it with the same semantics.
///
/// Lookups by id report absence as `None`/`false` rather than as an error;
/// `HabitService` is responsible for turning that into `PortError::NotFound`.
#[async_trait]
pub trait HabitRepository: Send + Sync {
    async fn get_all(&self) -> PortResult<Vec<Habit>>;

    async fn get_by_id(&self, id: HabitId) -> PortResult<Option<Habit>>;

    /// Fails with `PortError::NameConflict` if the name is already taken (case-insensitive).
    async fn create(&self, data: NewHabit) -> PortResult<Habit>;

    /// Fails with `PortError::NameConflict` if the new name belongs to another habit.
    async fn update(&self, id: HabitId, patch: HabitPatch) -> PortResult<Option<Habit>>;

    async fn delete(&self, id: HabitId) -> PortResult<bool>;

    async fn toggle_complete_for_today(
        &self,
        id: HabitId,
        completed: bool,
    ) -> PortResult<Option<Habit>>;

    async fn get_habits_with_streaks(&self) -> PortResult<Vec<Habit>>;
}

/// Whole-collection persistence. A backend only has to load and save the full list.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Loads the complete collection. A missing collection is an empty one.
    async fn load(&self) -> PortResult<Vec<Habit>>;

    /// Replaces the complete collection.
    async fn save(&self, habits: &[Habit]) -> PortResult<()>;
}

/// Source of the current instant, so day boundaries can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
