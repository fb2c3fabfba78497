//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::auth::Authenticator;
use habit_tracker_core::HabitService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub habits: HabitService,
    pub config: Arc<Config>,
    pub auth: Arc<Authenticator>,
}
