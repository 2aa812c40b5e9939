// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie (JWT) handling and the authentication middleware.

use crate::config::Config;
use crate::models::AuthUser;
use crate::session::SessionHandle;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "habit_session";
const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (provider uid)
    pub sub: String,
    /// Server-side session id
    pub sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Anonymous account
    #[serde(default)]
    pub anon: bool,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn user(&self) -> AuthUser {
        AuthUser::from_claims(self.sub.clone(), self.email.clone(), self.anon)
    }
}

/// The authenticated session attached to a request.
#[derive(Clone)]
pub struct CurrentSession {
    pub handle: Arc<SessionHandle>,
    pub claims: Claims,
}

/// Session token from the cookie, or from a bearer header.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Decode and validate a session JWT.
pub fn decode_session(token: &str, signing_key: &[u8]) -> Option<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .ok()
}

/// Resolve the request's session, restoring it from the claims if needed.
pub fn resolve_session(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Option<CurrentSession> {
    let token = session_token(jar, headers)?;
    let claims = decode_session(&token, &state.config.jwt_signing_key)?;
    let handle = state
        .sessions
        .get_or_restore(&claims.sid, claims.user(), claims.exp as u64);
    Some(CurrentSession { handle, claims })
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session =
        resolve_session(&state, &jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    // A restored session may belong to someone else only if the sid leaked
    // across users; refuse rather than mix lists.
    match session.handle.state().await.user() {
        Some(user) if user.uid == session.claims.sub => {}
        _ => return Err(StatusCode::UNAUTHORIZED),
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Claims for a new session token, valid for the cookie lifetime.
pub fn session_claims(session_id: &str, user: &AuthUser) -> anyhow::Result<Claims> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    Ok(Claims {
        sub: user.uid.clone(),
        sid: session_id.to_string(),
        email: user.email.clone(),
        anon: user.is_anonymous,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    })
}

/// Sign `claims` into a JWT.
pub fn encode_session(claims: &Claims, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Create a JWT for a user session.
pub fn create_jwt(session_id: &str, user: &AuthUser, signing_key: &[u8]) -> anyhow::Result<String> {
    encode_session(&session_claims(session_id, user)?, signing_key)
}

/// Session cookie carrying `token`.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Cookie that clears the session cookie (same attributes, Max-Age=0).
pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::ZERO)
        .build()
}
