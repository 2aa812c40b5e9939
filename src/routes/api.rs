// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.
//!
//! Every mutation answers with the updated list view, so the client never
//! needs a second round trip.

use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentSession;
use crate::models::{AuthUser, HabitListView};
use crate::time_utils::parse_check_in;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::AppState;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/habits", get(list_habits).post(create_habit))
        .route("/api/habits/{id}", delete(delete_habit))
        .route(
            "/api/habits/{id}/check-ins",
            post(check_in).delete(delete_check_in),
        )
        .route("/api/notice", delete(dismiss_notice))
}

// ─── User Profile ────────────────────────────────────────────

async fn get_me(Extension(session): Extension<CurrentSession>) -> Result<Json<AuthUser>> {
    let user = session
        .handle
        .state()
        .await
        .user()
        .cloned()
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user))
}

// ─── Habits ──────────────────────────────────────────────────

/// Current list view, re-fetched from the store on every call.
async fn list_habits(Extension(session): Extension<CurrentSession>) -> Json<HabitListView> {
    let session_state = session.handle.state().await;
    let mut habits = session.handle.habits.lock().await;
    if let Err(e) = habits.list(&session_state).await {
        tracing::warn!(error = %e, "Habit fetch failed, serving cached list");
    }
    Json(habits.view())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHabitRequest {
    #[validate(length(min = 1, message = "Habit name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Habit description is required"))]
    pub description: String,
}

async fn create_habit(
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<HabitListView>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session_state = session.handle.state().await;
    let mut habits = session.handle.habits.lock().await;
    habits
        .create(&session_state, &request.name, &request.description)
        .await?;

    Ok((StatusCode::CREATED, Json(habits.view())))
}

async fn delete_habit(
    Extension(session): Extension<CurrentSession>,
    Path(habit_id): Path<String>,
) -> Result<Json<HabitListView>> {
    let session_state = session.handle.state().await;
    let mut habits = session.handle.habits.lock().await;
    habits.delete_habit(&session_state, &habit_id).await?;
    Ok(Json(habits.view()))
}

// ─── Check-ins ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CheckInQuery {
    /// Check-in time (RFC3339); defaults to now
    at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteCheckInQuery {
    /// Exact stored check-in string
    at: String,
}

async fn check_in(
    Extension(session): Extension<CurrentSession>,
    Path(habit_id): Path<String>,
    Query(query): Query<CheckInQuery>,
) -> Result<Json<HabitListView>> {
    let timestamp = query
        .at
        .as_deref()
        .map(|raw| {
            parse_check_in(raw).ok_or_else(|| {
                AppError::BadRequest("Invalid 'at' parameter: must be RFC3339 datetime".to_string())
            })
        })
        .transpose()?;

    let session_state = session.handle.state().await;
    let mut habits = session.handle.habits.lock().await;
    habits
        .check_in(&session_state, &habit_id, timestamp)
        .await?;
    Ok(Json(habits.view()))
}

async fn delete_check_in(
    Extension(session): Extension<CurrentSession>,
    Path(habit_id): Path<String>,
    Query(query): Query<DeleteCheckInQuery>,
) -> Result<Json<HabitListView>> {
    let session_state = session.handle.state().await;
    let mut habits = session.handle.habits.lock().await;
    habits
        .delete_check_in(&session_state, &habit_id, &query.at)
        .await?;
    Ok(Json(habits.view()))
}

// ─── Notices ─────────────────────────────────────────────────

async fn dismiss_notice(Extension(session): Extension<CurrentSession>) -> Json<HabitListView> {
    let mut habits = session.handle.habits.lock().await;
    habits.dismiss_notice();
    Json(habits.view())
}
