//! crates/habit_tracker_core/src/service.rs
//!
//! Orchestrates repository calls for the outer layers.

use std::sync::Arc;

use tracing::info;

use crate::domain::{Habit, HabitId, HabitPatch, HabitStats, NewHabit};
use crate::ports::{HabitRepository, PortError, PortResult};

/// Habit use-cases. The repository is chosen by the caller at startup.
#[derive(Clone)]
pub struct HabitService {
    repository: Arc<dyn HabitRepository>,
}

fn not_found(id: HabitId) -> PortError {
    PortError::NotFound(format!("Habit with ID {} not found", id))
}

impl HabitService {
    pub fn new(repository: Arc<dyn HabitRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_all(&self) -> PortResult<Vec<Habit>> {
        let habits = self.repository.get_all().await?;
        info!("Found {} habits.", habits.len());
        Ok(habits)
    }

    pub async fn find_one(&self, id: HabitId) -> PortResult<Habit> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, data: NewHabit) -> PortResult<Habit> {
        self.repository.create(data).await
    }

    pub async fn update(&self, id: HabitId, patch: HabitPatch) -> PortResult<Habit> {
        self.repository
            .update(id, patch)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn remove(&self, id: HabitId) -> PortResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    pub async fn toggle_complete_for_today(
        &self,
        id: HabitId,
        completed: bool,
    ) -> PortResult<Habit> {
        self.repository
            .toggle_complete_for_today(id, completed)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn habits_with_streaks(&self) -> PortResult<Vec<Habit>> {
        self.repository.get_habits_with_streaks().await
    }

    /// Aggregates over the recalculated view of every habit.
    pub async fn stats(&self) -> PortResult<HabitStats> {
        let habits = self.repository.get_all().await?;
        Ok(compute_stats(&habits))
    }
}

/// `average_streak` is rounded to two decimals and is `0` for an empty list.
pub fn compute_stats(habits: &[Habit]) -> HabitStats {
    let total_habits = habits.len();
    let completed_today = habits.iter().filter(|h| h.is_completed_today).count();
    let total_completions = habits.iter().map(|h| u64::from(h.total_completions)).sum();
    let average_streak = if total_habits == 0 {
        0.0
    } else {
        let sum: u64 = habits.iter().map(|h| u64::from(h.current_streak)).sum();
        sum as f64 / total_habits as f64
    };

    HabitStats {
        total_habits,
        completed_today,
        total_completions,
        average_streak: (average_streak * 100.0).round() / 100.0,
    }
}
