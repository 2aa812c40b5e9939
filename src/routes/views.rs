// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Top-level views: `/` (habit list) and `/signin`.
//!
//! Each request is routed against the session state; a view for the wrong
//! state redirects to the right one.

use crate::middleware::auth::resolve_session;
use crate::models::{AuthUser, HabitListView};
use crate::services::signin::{PasswordMode, SignInStatus};
use crate::session::{Route, RouteDecision, SessionState};
use crate::AppState;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/signin", get(sign_in))
}

/// Body of a rendered view.
#[derive(Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewResponse {
    Loading,
    SignIn {
        #[serde(flatten)]
        status: SignInStatus,
        mode: PasswordMode,
    },
    Home {
        user: AuthUser,
        #[serde(flatten)]
        list: HabitListView,
    },
}

async fn home(State(state): State<Arc<AppState>>, headers: HeaderMap, jar: CookieJar) -> Response {
    render(&state, &headers, &jar, Route::Home).await
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    render(&state, &headers, &jar, Route::SignIn).await
}

async fn render(state: &AppState, headers: &HeaderMap, jar: &CookieJar, requested: Route) -> Response {
    let session = resolve_session(state, jar, headers);
    let session_state = match &session {
        Some(current) => current.handle.state().await,
        None => SessionState::SignedOut,
    };

    match session_state.route(requested) {
        RouteDecision::Loading => Json(ViewResponse::Loading).into_response(),
        RouteDecision::Redirect(target) => Redirect::to(target.path()).into_response(),
        RouteDecision::Render(Route::SignIn) => Json(ViewResponse::SignIn {
            status: SignInStatus::SignedOut,
            mode: PasswordMode::SignIn,
        })
        .into_response(),
        RouteDecision::Render(Route::Home) => {
            let (Some(current), Some(user)) = (session, session_state.user()) else {
                return Redirect::to(Route::SignIn.path()).into_response();
            };

            let mut habits = current.handle.habits.lock().await;
            // A failed fetch keeps the cached list and shows up as its notice.
            if let Err(e) = habits.list(&session_state).await {
                tracing::warn!(error = %e, "Habit fetch failed, serving cached list");
            }

            Json(ViewResponse::Home {
                user: user.clone(),
                list: habits.view(),
            })
            .into_response()
        }
    }
}
