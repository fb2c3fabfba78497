pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod version;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds the application router: public auth/version routes plus the
/// token-protected habit routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/version/api", get(version::api_version_handler))
        .route("/version/web", get(version::web_version_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth", get(auth::me_handler))
        .route(
            "/habits",
            get(rest::list_habits_handler).post(rest::create_habit_handler),
        )
        .route("/habits/stats", get(rest::habit_stats_handler))
        .route("/habits/streaks", get(rest::habits_with_streaks_handler))
        .route(
            "/habits/{id}",
            get(rest::get_habit_handler)
                .patch(rest::update_habit_handler)
                .delete(rest::delete_habit_handler),
        )
        .route("/habits/{id}/toggle", patch(rest::toggle_habit_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
