// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, sign-out and account linking routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_jwt, decode_session, encode_session, removal_cookie, session_claims, session_cookie,
    session_token, CurrentSession,
};
use crate::models::AuthUser;
use crate::services::signin::{self, FederatedSignIn, LinkPassword, PasswordSignIn};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/password", post(password_sign_in))
        .route("/auth/federated", post(federated_sign_in))
        .route("/auth/anonymous", post(anonymous_sign_in))
        .route("/auth/logout", post(logout))
}

/// Routes that need an existing session (auth middleware applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/link", post(link_password))
}

/// Successful sign-in response.
#[derive(Serialize)]
pub struct SignInResponse {
    pub user: AuthUser,
    /// Outcome of an opt-in account link, if one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked: Option<bool>,
}

/// Start a fresh session for `user` and attach its cookie.
///
/// Any session the browser already had is closed first.
fn start_session(
    state: &AppState,
    jar: CookieJar,
    headers: &HeaderMap,
    user: &AuthUser,
) -> Result<CookieJar> {
    if let Some(previous) = session_token(&jar, headers)
        .and_then(|token| decode_session(&token, &state.config.jwt_signing_key))
    {
        state.sessions.close(&previous.sid);
    }

    let session_id = state.sessions.new_session_id()?;
    let claims = session_claims(&session_id, user)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    state
        .sessions
        .open(&session_id, user.clone(), claims.exp as u64);

    let jwt = encode_session(&claims, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(uid = %user.uid, anonymous = user.is_anonymous, "Session started");
    Ok(jar.add(session_cookie(jwt, &state.config)))
}

/// Email/password sign-in or registration.
async fn password_sign_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(form): Json<PasswordSignIn>,
) -> Result<(CookieJar, Json<SignInResponse>)> {
    let user = signin::sign_in_with_password(state.identity.as_ref(), &form).await?;
    let jar = start_session(&state, jar, &headers, &user)?;
    Ok((jar, Json(SignInResponse { user, linked: None })))
}

/// Google sign-in with an ID token from the front-end popup.
async fn federated_sign_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(form): Json<FederatedSignIn>,
) -> Result<(CookieJar, Json<SignInResponse>)> {
    let outcome = signin::sign_in_with_federated(state.identity.as_ref(), &form).await?;
    let jar = start_session(&state, jar, &headers, &outcome.user)?;
    Ok((
        jar,
        Json(SignInResponse {
            user: outcome.user,
            linked: outcome.linked,
        }),
    ))
}

async fn anonymous_sign_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SignInResponse>)> {
    let user = signin::sign_in_anonymously(state.identity.as_ref()).await?;
    let jar = start_session(&state, jar, &headers, &user)?;
    Ok((jar, Json(SignInResponse { user, linked: None })))
}

/// Link an email/password credential to the signed-in account.
///
/// The session cookie is reissued since email and anonymity change.
async fn link_password(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    jar: CookieJar,
    Json(form): Json<LinkPassword>,
) -> Result<(CookieJar, Json<SignInResponse>)> {
    let current = session.handle.auth.current().ok_or(AppError::Unauthorized)?;

    let linked = signin::link_password(state.identity.as_ref(), &current, &form).await?;
    session.handle.auth.publish(Some(linked.clone()));

    let jwt = create_jwt(&session.claims.sid, &linked, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(uid = %linked.uid, "Password credential linked");
    Ok((
        jar.add(session_cookie(jwt, &state.config)),
        Json(SignInResponse {
            user: linked,
            linked: Some(true),
        }),
    ))
}

/// Sign out: close the session and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (StatusCode, CookieJar) {
    let claims = session_token(&jar, &headers)
        .and_then(|token| decode_session(&token, &state.config.jwt_signing_key));

    if let Some(claims) = claims {
        state.sessions.close(&claims.sid);
        let user = claims.user();

        if let Err(e) = state.identity.sign_out(&user).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
        tracing::info!(uid = %user.uid, "Signed out");
    }

    (StatusCode::NO_CONTENT, jar.add(removal_cookie(&state.config)))
}
