//! crates/habit_tracker_core/src/repository.rs
//!
//! The one implementation of `HabitRepository`. It loads the whole collection
//! from a `HabitStore`, applies the streak logic in memory and saves the whole
//! collection back. There is no locking: two concurrent writers each work on
//! their own snapshot and the last save wins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::{Habit, HabitId, HabitPatch, NewHabit};
use crate::ports::{Clock, HabitRepository, HabitStore, PortError, PortResult, SystemClock};
use crate::streak::{apply_toggle, recalculate};

/// A `HabitRepository` over any whole-collection store.
pub struct StoreRepository<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: HabitStore> StoreRepository<S> {
    /// Creates a repository that reads the wall clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

fn name_conflict(name: &str) -> PortError {
    PortError::NameConflict(format!("A habit with the name \"{}\" already exists.", name))
}

fn next_id(habits: &[Habit]) -> HabitId {
    habits.iter().map(|h| h.id).max().map_or(1, |max| max + 1)
}

#[async_trait]
impl<S: HabitStore> HabitRepository for StoreRepository<S> {
    async fn get_all(&self) -> PortResult<Vec<Habit>> {
        let now = self.clock.now();
        let habits = self.store.load().await?;
        debug!("Loaded {} habits from store.", habits.len());
        Ok(habits.into_iter().map(|h| recalculate(h, now)).collect())
    }

    async fn get_by_id(&self, id: HabitId) -> PortResult<Option<Habit>> {
        let now = self.clock.now();
        let habits = self.store.load().await?;
        Ok(habits
            .into_iter()
            .find(|h| h.id == id)
            .map(|h| recalculate(h, now)))
    }

    async fn create(&self, data: NewHabit) -> PortResult<Habit> {
        let mut habits = self.store.load().await?;
        if habits.iter().any(|h| h.has_name(&data.name)) {
            return Err(name_conflict(&data.name));
        }

        let habit = Habit::new(next_id(&habits), data, self.clock.now());
        habits.push(habit.clone());
        self.store.save(&habits).await?;

        info!("Created habit {} ({}).", habit.id, habit.name);
        Ok(habit)
    }

    async fn update(&self, id: HabitId, patch: HabitPatch) -> PortResult<Option<Habit>> {
        let mut habits = self.store.load().await?;
        let Some(index) = habits.iter().position(|h| h.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name.as_deref() {
            if habits.iter().any(|h| h.id != id && h.has_name(name)) {
                return Err(name_conflict(name));
            }
        }

        let habit = &mut habits[index];
        if let Some(name) = patch.name {
            habit.name = name;
        }
        if let Some(description) = patch.description {
            habit.description = description;
        }
        habit.updated_date = self.clock.now();
        let updated = habit.clone();

        self.store.save(&habits).await?;
        info!("Updated habit {}.", id);
        Ok(Some(updated))
    }

    async fn delete(&self, id: HabitId) -> PortResult<bool> {
        let mut habits = self.store.load().await?;
        let Some(index) = habits.iter().position(|h| h.id == id) else {
            return Ok(false);
        };

        habits.remove(index);
        self.store.save(&habits).await?;
        info!("Deleted habit {}.", id);
        Ok(true)
    }

    async fn toggle_complete_for_today(
        &self,
        id: HabitId,
        completed: bool,
    ) -> PortResult<Option<Habit>> {
        let now = self.clock.now();
        let mut habits = self.store.load().await?;
        let Some(habit) = habits.iter_mut().find(|h| h.id == id) else {
            return Ok(None);
        };

        apply_toggle(habit, completed, now);
        let toggled = habit.clone();

        self.store.save(&habits).await?;
        info!(
            "Toggled habit {} (completed = {}): streak {}, total {}.",
            id, completed, toggled.current_streak, toggled.total_completions
        );
        Ok(Some(recalculate(toggled, now)))
    }

    async fn get_habits_with_streaks(&self) -> PortResult<Vec<Habit>> {
        self.get_all().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Mutex;

    /// A bare in-process store for exercising the repository logic.
    #[derive(Default)]
    pub(crate) struct VecStore {
        pub(crate) habits: Mutex<Vec<Habit>>,
    }

    #[async_trait]
    impl HabitStore for VecStore {
        async fn load(&self) -> PortResult<Vec<Habit>> {
            Ok(self.habits.lock().unwrap().clone())
        }

        async fn save(&self, habits: &[Habit]) -> PortResult<()> {
            *self.habits.lock().unwrap() = habits.to_vec();
            Ok(())
        }
    }

    /// A store whose writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl HabitStore for BrokenStore {
        async fn load(&self) -> PortResult<Vec<Habit>> {
            Ok(Vec::new())
        }

        async fn save(&self, _habits: &[Habit]) -> PortResult<()> {
            Err(PortError::Persistence("disk full".to_string()))
        }
    }

    /// Holds every `load` until two callers have read the same snapshot.
    struct LockstepStore {
        inner: VecStore,
        gate: tokio::sync::Barrier,
    }

    impl LockstepStore {
        fn seeded(habits: Vec<Habit>) -> Self {
            Self {
                inner: VecStore {
                    habits: Mutex::new(habits),
                },
                gate: tokio::sync::Barrier::new(2),
            }
        }
    }

    #[async_trait]
    impl HabitStore for LockstepStore {
        async fn load(&self) -> PortResult<Vec<Habit>> {
            let habits = self.inner.load().await?;
            self.gate.wait().await;
            Ok(habits)
        }

        async fn save(&self, habits: &[Habit]) -> PortResult<()> {
            self.inner.save(habits).await
        }
    }

    pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 21, 10, 0, 0).unwrap()
    }

    fn repo() -> StoreRepository<VecStore> {
        StoreRepository::with_clock(VecStore::default(), Arc::new(FixedClock(now())))
    }

    fn new_habit(name: &str) -> NewHabit {
        NewHabit {
            name: name.to_string(),
            description: None,
        }
    }

    /// Rewrites a stored record, bypassing the repository.
    fn edit_stored(repo: &StoreRepository<VecStore>, id: HabitId, f: impl FnOnce(&mut Habit)) {
        let mut habits = repo.store().habits.lock().unwrap();
        let habit = habits.iter_mut().find(|h| h.id == id).unwrap();
        f(habit);
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_zeroed_counters() {
        let repo = repo();
        let first = repo.create(new_habit("Exercise")).await.unwrap();
        let second = repo
            .create(NewHabit {
                name: "Read".to_string(),
                description: Some("20 pages".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.description, "");
        assert_eq!(second.description, "20 pages");
        assert_eq!(first.current_streak, 0);
        assert_eq!(first.total_completions, 0);
        assert_eq!(first.last_completed_at, None);
        assert_eq!(first.created_date, now());
        assert_eq!(first.updated_date, now());
    }

    #[tokio::test]
    async fn next_id_follows_the_highest_remaining_id() {
        let repo = repo();
        repo.create(new_habit("A")).await.unwrap();
        repo.create(new_habit("B")).await.unwrap();
        repo.create(new_habit("C")).await.unwrap();

        assert!(repo.delete(3).await.unwrap());
        let d = repo.create(new_habit("D")).await.unwrap();
        assert_eq!(d.id, 3);

        assert!(repo.delete(1).await.unwrap());
        let e = repo.create(new_habit("E")).await.unwrap();
        assert_eq!(e.id, 4);
    }

    #[tokio::test]
    async fn create_rejects_case_insensitive_duplicate() {
        let repo = repo();
        repo.create(new_habit("Read")).await.unwrap();

        let err = repo.create(new_habit("READ")).await.unwrap_err();
        assert!(matches!(err, PortError::NameConflict(_)));
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_checks_names_of_other_habits_only() {
        let repo = repo();
        repo.create(new_habit("Read")).await.unwrap();
        repo.create(new_habit("Walk")).await.unwrap();

        let renamed = repo
            .update(
                1,
                HabitPatch {
                    name: Some("READ".to_string()),
                    description: Some("books".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "READ");
        assert_eq!(renamed.description, "books");

        let err = repo
            .update(
                1,
                HabitPatch {
                    name: Some("walk".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NameConflict(_)));
    }

    #[tokio::test]
    async fn update_merges_only_provided_fields() {
        let repo = repo();
        repo.create(NewHabit {
            name: "Read".to_string(),
            description: Some("books".to_string()),
        })
        .await
        .unwrap();

        let updated = repo
            .update(
                1,
                HabitPatch {
                    name: None,
                    description: Some("papers".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Read");
        assert_eq!(updated.description, "papers");
    }

    #[tokio::test]
    async fn missing_ids_are_reported_as_absent() {
        let repo = repo();
        assert!(repo.get_by_id(9).await.unwrap().is_none());
        assert!(repo.update(9, HabitPatch::default()).await.unwrap().is_none());
        assert!(!repo.delete(9).await.unwrap());
        assert!(repo.toggle_complete_for_today(9, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exercise_scenario() {
        let repo = repo();
        let habit = repo.create(new_habit("Exercise")).await.unwrap();
        assert_eq!(habit.current_streak, 0);
        assert_eq!(habit.total_completions, 0);

        let habit = repo.toggle_complete_for_today(1, true).await.unwrap().unwrap();
        assert_eq!(habit.current_streak, 1);
        assert_eq!(habit.longest_streak, 1);
        assert_eq!(habit.total_completions, 1);
        assert!(habit.is_completed_today);

        edit_stored(&repo, 1, |h| h.last_completed_at = Some(now() - Duration::days(1)));
        let habit = repo.toggle_complete_for_today(1, true).await.unwrap().unwrap();
        assert_eq!(habit.current_streak, 2);
        assert_eq!(habit.longest_streak, 2);
        assert_eq!(habit.total_completions, 2);

        edit_stored(&repo, 1, |h| {
            h.last_completed_at = Some(now() - Duration::days(2));
            h.current_streak = 5;
        });
        let habit = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(habit.current_streak, 0);
        assert!(!habit.is_completed_today);
    }

    #[tokio::test]
    async fn read_time_correction_is_not_written_back() {
        let repo = repo();
        repo.create(new_habit("Exercise")).await.unwrap();
        edit_stored(&repo, 1, |h| {
            h.last_completed_at = Some(now() - Duration::days(4));
            h.current_streak = 5;
            h.longest_streak = 5;
        });

        assert_eq!(repo.get_all().await.unwrap()[0].current_streak, 0);
        assert_eq!(repo.store().habits.lock().unwrap()[0].current_streak, 5);
    }

    #[tokio::test]
    async fn toggling_twice_is_idempotent() {
        let repo = repo();
        repo.create(new_habit("Exercise")).await.unwrap();

        let first = repo.toggle_complete_for_today(1, true).await.unwrap().unwrap();
        let second = repo.toggle_complete_for_today(1, true).await.unwrap().unwrap();
        assert_eq!(first.current_streak, second.current_streak);
        assert_eq!(first.longest_streak, second.longest_streak);
        assert_eq!(first.total_completions, second.total_completions);
    }

    #[tokio::test]
    async fn uncomplete_scenario() {
        let repo = repo();
        repo.create(new_habit("Exercise")).await.unwrap();
        edit_stored(&repo, 1, |h| {
            h.last_completed_at = Some(now() - Duration::hours(1));
            h.current_streak = 3;
            h.longest_streak = 3;
            h.total_completions = 3;
        });

        let habit = repo.toggle_complete_for_today(1, false).await.unwrap().unwrap();
        assert!(!habit.is_completed_today);
        assert_eq!(habit.total_completions, 2);
        assert_eq!(habit.longest_streak, 3);
        assert_eq!(habit.last_completed_at, None);
        assert_eq!(repo.store().habits.lock().unwrap()[0].current_streak, 2);

        let habit = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(habit.current_streak, 0);
    }

    #[tokio::test]
    async fn delete_is_a_hard_delete() {
        let repo = repo();
        repo.create(new_habit("Exercise")).await.unwrap();

        assert!(repo.delete(1).await.unwrap());
        assert!(repo.store().habits.lock().unwrap().is_empty());
        assert!(!repo.delete(1).await.unwrap());
    }

    #[tokio::test]
    async fn persistence_failures_propagate() {
        let repo = StoreRepository::new(BrokenStore);
        let err = repo.create(new_habit("Exercise")).await.unwrap_err();
        assert!(matches!(err, PortError::Persistence(_)));
    }

    #[tokio::test]
    async fn concurrent_creates_keep_only_the_last_write() {
        let repo =
            StoreRepository::with_clock(LockstepStore::seeded(Vec::new()), Arc::new(FixedClock(now())));

        let (a, b) = tokio::join!(repo.create(new_habit("Read")), repo.create(new_habit("Walk")));
        let (a, b) = (a.unwrap(), b.unwrap());

        // Both writers saw an empty collection.
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 1);

        let stored = repo.store().inner.habits.lock().unwrap().clone();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].name == "Read" || stored[0].name == "Walk");
    }

    #[tokio::test]
    async fn concurrent_toggles_on_different_habits_lose_one_update() {
        let seed = vec![
            Habit::new(1, new_habit("Read"), now() - Duration::days(3)),
            Habit::new(2, new_habit("Walk"), now() - Duration::days(3)),
        ];
        let repo = StoreRepository::with_clock(LockstepStore::seeded(seed), Arc::new(FixedClock(now())));

        let (a, b) = tokio::join!(
            repo.toggle_complete_for_today(1, true),
            repo.toggle_complete_for_today(2, true)
        );
        assert_eq!(a.unwrap().unwrap().total_completions, 1);
        assert_eq!(b.unwrap().unwrap().total_completions, 1);

        let stored = repo.store().inner.habits.lock().unwrap().clone();
        assert_eq!(stored.len(), 2);
        let persisted: u32 = stored.iter().map(|h| h.total_completions).sum();
        assert_eq!(persisted, 1);
    }
}
