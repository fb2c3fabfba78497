pub mod domain;
pub mod ports;
pub mod repository;
pub mod service;
pub mod streak;

pub use domain::{Habit, HabitId, HabitPatch, HabitStats, NewHabit};
pub use ports::{Clock, HabitRepository, HabitStore, PortError, PortResult, SystemClock};
pub use repository::StoreRepository;
pub use service::HabitService;
