//! services/api/src/adapters/memory.rs
//!
//! Process-local storage. Everything is lost on restart.

use async_trait::async_trait;
use habit_tracker_core::domain::Habit;
use habit_tracker_core::ports::{HabitStore, PortResult};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryHabitStore {
    habits: RwLock<Vec<Habit>>,
}

impl MemoryHabitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HabitStore for MemoryHabitStore {
    async fn load(&self) -> PortResult<Vec<Habit>> {
        Ok(self.habits.read().await.clone())
    }

    async fn save(&self, habits: &[Habit]) -> PortResult<()> {
        *self.habits.write().await = habits.to_vec();
        Ok(())
    }
}
