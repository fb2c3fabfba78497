//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the habit REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{auth, state::AppState, version};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use habit_tracker_core::domain::{Habit, HabitId, HabitPatch, HabitStats, NewHabit};
use habit_tracker_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::me_handler,
        version::api_version_handler,
        version::web_version_handler,
        list_habits_handler,
        habits_with_streaks_handler,
        habit_stats_handler,
        get_habit_handler,
        create_habit_handler,
        update_habit_handler,
        toggle_habit_handler,
        delete_habit_handler,
    ),
    components(
        schemas(
            HabitResponse,
            HabitStatsResponse,
            CreateHabitRequest,
            UpdateHabitRequest,
            ToggleHabitRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::AuthenticatedUser,
            version::VersionResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "habits", description = "Habit tracking with daily streaks."),
        (name = "auth", description = "Token-based authentication."),
        (name = "version", description = "Deployment version information.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A habit as returned to clients.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HabitResponse {
    id: u64,
    name: String,
    description: String,
    last_completed_at: Option<DateTime<Utc>>,
    current_streak: u32,
    longest_streak: u32,
    is_completed_today: bool,
    total_completions: u32,
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
    deleted_date: Option<DateTime<Utc>>,
    created_by_id: Option<String>,
    updated_by_id: Option<String>,
}

impl From<Habit> for HabitResponse {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name,
            description: habit.description,
            last_completed_at: habit.last_completed_at,
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            is_completed_today: habit.is_completed_today,
            total_completions: habit.total_completions,
            created_date: habit.created_date,
            updated_date: habit.updated_date,
            deleted_date: habit.deleted_date,
            created_by_id: habit.created_by_id,
            updated_by_id: habit.updated_by_id,
        }
    }
}

/// Aggregate statistics across all habits.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HabitStatsResponse {
    total_habits: usize,
    completed_today: usize,
    total_completions: u64,
    average_streak: f64,
}

impl From<HabitStats> for HabitStatsResponse {
    fn from(stats: HabitStats) -> Self {
        Self {
            total_habits: stats.total_habits,
            completed_today: stats.completed_today,
            total_completions: stats.total_completions,
            average_streak: stats.average_streak,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateHabitRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ToggleHabitRequest {
    pub completed: bool,
}

//=========================================================================================
// Validation and Error Mapping
//=========================================================================================

type HandlerError = (StatusCode, String);

fn bad_request(message: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, message.into())
}

fn read_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HandlerError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| bad_request(e.body_text()))
}

fn validate_name(name: &str) -> Result<(), HandlerError> {
    if name.trim().is_empty() {
        return Err(bad_request("name should not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(bad_request(format!(
            "name must be shorter than or equal to {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), HandlerError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(bad_request(format!(
            "description must be shorter than or equal to {} characters",
            MAX_DESCRIPTION_LEN
        ))),
        _ => Ok(()),
    }
}

/// Maps core errors onto HTTP statuses.
fn port_error(e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::NameConflict(message) => (StatusCode::CONFLICT, message),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Persistence(message) => {
            error!("Habit storage failure: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to access habit storage".to_string(),
            )
        }
    }
}

fn habit_list(habits: Vec<Habit>) -> Json<Vec<HabitResponse>> {
    Json(habits.into_iter().map(HabitResponse::from).collect())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every habit with its streak recalculated for today.
#[utoipa::path(
    get,
    path = "/habits",
    responses(
        (status = 200, description = "All habits", body = [HabitResponse]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn list_habits_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    info!("Received request to GET /habits");
    let habits = state.habits.find_all().await.map_err(port_error)?;
    Ok(habit_list(habits))
}

/// List every habit with its streak information.
#[utoipa::path(
    get,
    path = "/habits/streaks",
    responses(
        (status = 200, description = "All habits", body = [HabitResponse]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn habits_with_streaks_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let habits = state.habits.habits_with_streaks().await.map_err(port_error)?;
    Ok(habit_list(habits))
}

/// Aggregate statistics over all habits.
#[utoipa::path(
    get,
    path = "/habits/stats",
    responses(
        (status = 200, description = "Habit statistics", body = HabitStatsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn habit_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let stats = state.habits.stats().await.map_err(port_error)?;
    Ok(Json(HabitStatsResponse::from(stats)))
}

/// Fetch a single habit.
#[utoipa::path(
    get,
    path = "/habits/{id}",
    params(("id" = u64, Path, description = "Habit id")),
    responses(
        (status = 200, description = "The habit", body = HabitResponse),
        (status = 404, description = "No habit with this id")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn get_habit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<HabitId>,
) -> Result<impl IntoResponse, HandlerError> {
    let habit = state.habits.find_one(id).await.map_err(port_error)?;
    Ok(Json(HabitResponse::from(habit)))
}

/// Create a habit. Names are unique, ignoring case.
#[utoipa::path(
    post,
    path = "/habits",
    request_body = CreateHabitRequest,
    responses(
        (status = 201, description = "Habit created", body = HabitResponse),
        (status = 400, description = "Invalid request body"),
        (status = 409, description = "A habit with this name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn create_habit_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateHabitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let req = read_json(payload)?;
    validate_name(&req.name)?;
    validate_description(req.description.as_deref())?;

    let habit = state
        .habits
        .create(NewHabit {
            name: req.name,
            description: req.description,
        })
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(HabitResponse::from(habit))))
}

/// Rename a habit or change its description.
#[utoipa::path(
    patch,
    path = "/habits/{id}",
    params(("id" = u64, Path, description = "Habit id")),
    request_body = UpdateHabitRequest,
    responses(
        (status = 200, description = "Habit updated", body = HabitResponse),
        (status = 400, description = "Invalid request body"),
        (status = 404, description = "No habit with this id"),
        (status = 409, description = "Another habit already has this name")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn update_habit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<HabitId>,
    payload: Result<Json<UpdateHabitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let req = read_json(payload)?;
    if let Some(name) = req.name.as_deref() {
        validate_name(name)?;
    }
    validate_description(req.description.as_deref())?;

    let habit = state
        .habits
        .update(
            id,
            HabitPatch {
                name: req.name,
                description: req.description,
            },
        )
        .await
        .map_err(port_error)?;
    Ok(Json(HabitResponse::from(habit)))
}

/// Mark a habit as done (or not done) for the current UTC day.
#[utoipa::path(
    patch,
    path = "/habits/{id}/toggle",
    params(("id" = u64, Path, description = "Habit id")),
    request_body = ToggleHabitRequest,
    responses(
        (status = 200, description = "Habit after the toggle", body = HabitResponse),
        (status = 400, description = "Invalid request body"),
        (status = 404, description = "No habit with this id")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn toggle_habit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<HabitId>,
    payload: Result<Json<ToggleHabitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let req = read_json(payload)?;
    let habit = state
        .habits
        .toggle_complete_for_today(id, req.completed)
        .await
        .map_err(port_error)?;
    Ok(Json(HabitResponse::from(habit)))
}

/// Permanently delete a habit.
#[utoipa::path(
    delete,
    path = "/habits/{id}",
    params(("id" = u64, Path, description = "Habit id")),
    responses(
        (status = 204, description = "Habit deleted"),
        (status = 404, description = "No habit with this id")
    ),
    security(("bearer_auth" = [])),
    tag = "habits"
)]
pub async fn delete_habit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<HabitId>,
) -> Result<impl IntoResponse, HandlerError> {
    state.habits.remove(id).await.map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}
