// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in flow tests.
//!
//! Covers password sign-in and registration, Google sign-in with opt-in
//! linking, anonymous sign-in, the error messages shown on the form, and
//! routing between the sign-in and home views.

use axum::http::{header, StatusCode};
use common::{body_json, empty_request, json_request, session_cookie, FakeIdentity};
use habit_tracker::config::Config;
use tower::ServiceExt;

mod common;

async fn post_json(
    app: &common::TestApp,
    uri: &str,
    cookie: Option<&str>,
    body: &str,
) -> axum::response::Response {
    app.router
        .clone()
        .oneshot(json_request("POST", uri, cookie, body))
        .await
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// PASSWORD
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_register_then_sign_in() {
    let app = common::create_test_app();

    let response = post_json(
        &app,
        "/auth/password",
        None,
        r#"{"email":"new@example.com","password":"secret1","mode":"register"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let _ = session_cookie(&response);
    let registered = body_json(response).await;
    assert_eq!(registered["user"]["email"], "new@example.com");
    assert_eq!(registered["user"]["is_anonymous"], false);
    assert!(registered.get("linked").is_none());

    let response = post_json(
        &app,
        "/auth/password",
        None,
        r#"{"email":"new@example.com","password":"secret1"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let signed_in = body_json(response).await;
    assert_eq!(signed_in["user"]["uid"], registered["user"]["uid"]);
}

#[tokio::test]
async fn test_password_errors_map_to_form_messages() {
    let identity = FakeIdentity::default().with_account("a@example.com", "right", "uid-a");
    let app = common::create_test_app_with(Config::test_default(), identity);

    let cases = [
        (
            r#"{"email":"a@example.com","password":"wrong"}"#,
            StatusCode::UNAUTHORIZED,
            "Incorrect password.",
        ),
        (
            r#"{"email":"nobody@example.com","password":"x"}"#,
            StatusCode::UNAUTHORIZED,
            "No user found with this email.",
        ),
        (
            r#"{"email":"not-an-email","password":"x"}"#,
            StatusCode::BAD_REQUEST,
            "The email address is not valid.",
        ),
        (
            r#"{"email":"a@example.com","password":"x","mode":"register"}"#,
            StatusCode::CONFLICT,
            "This email is already in use.",
        ),
    ];

    for (body, status, message) in cases {
        let response = post_json(&app, "/auth/password", None, body).await;
        assert_eq!(response.status(), status, "body: {}", body);
        assert!(common::set_cookie_headers(&response).is_empty());
        let json = body_json(response).await;
        assert_eq!(json["error"], "auth_error");
        assert_eq!(json["details"], message);
    }

    // No session was ever opened.
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn test_empty_password_rejected_before_provider() {
    let app = common::create_test_app();

    let response = post_json(
        &app,
        "/auth/password",
        None,
        r#"{"email":"a@example.com","password":""}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

// ═══════════════════════════════════════════════════════════════════════════
// GOOGLE AND ANONYMOUS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_federated_failure_uses_fixed_message() {
    let app = common::create_test_app();

    let response = post_json(&app, "/auth/federated", None, r#"{"id_token":"forged"}"#).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["details"],
        "Error signing in with Google."
    );
}

#[tokio::test]
async fn test_federated_sign_in_does_not_link_by_default() {
    let app = common::create_test_app();

    let response = post_json(
        &app,
        "/auth/federated",
        None,
        r#"{"id_token":"valid-google-token"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["uid"], "google-uid");
    assert!(json.get("linked").is_none());
}

#[tokio::test]
async fn test_federated_link_failure_keeps_sign_in() {
    let app = common::create_test_app();
    let body = r#"{"id_token":"valid-google-token","link_password":"pw123456"}"#;

    let first = post_json(&app, "/auth/federated", None, body).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_json(first).await["linked"], true);

    // The email already carries a password credential now; linking again fails.
    let second = post_json(&app, "/auth/federated", None, body).await;
    assert_eq!(second.status(), StatusCode::OK);
    let json = body_json(second).await;
    assert_eq!(json["linked"], false);
    assert_eq!(json["user"]["uid"], "google-uid");
}

#[tokio::test]
async fn test_anonymous_sign_in() {
    let app = common::create_test_app();

    let response = post_json(&app, "/auth/anonymous", None, "").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["is_anonymous"], true);
    assert!(json["user"]["email"].is_null());
}

#[tokio::test]
async fn test_anonymous_failure_uses_fixed_message() {
    let identity = FakeIdentity::default().without_anonymous();
    let app = common::create_test_app_with(Config::test_default(), identity);

    let response = post_json(&app, "/auth/anonymous", None, "").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["details"],
        "Error signing in Anonymously."
    );
}

#[tokio::test]
async fn test_link_password_upgrades_anonymous_account() {
    let app = common::create_test_app();

    let response = post_json(&app, "/auth/anonymous", None, "").await;
    let cookie = session_cookie(&response);
    let uid = body_json(response).await["user"]["uid"].clone();

    let response = post_json(
        &app,
        "/auth/link",
        Some(&cookie),
        r#"{"email":"keep@example.com","password":"pw123456"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = session_cookie(&response);
    let json = body_json(response).await;
    assert_eq!(json["linked"], true);
    assert_eq!(json["user"]["uid"], uid);
    assert_eq!(json["user"]["is_anonymous"], false);

    let me = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/me", Some(&refreshed)))
        .await
        .unwrap();
    assert_eq!(body_json(me).await["email"], "keep@example.com");

    // The linked credential signs into the same account.
    let response = post_json(
        &app,
        "/auth/password",
        None,
        r#"{"email":"keep@example.com","password":"pw123456"}"#,
    )
    .await;
    assert_eq!(body_json(response).await["user"]["uid"], uid);
}

#[tokio::test]
async fn test_link_requires_session() {
    let app = common::create_test_app();

    let response = post_json(
        &app,
        "/auth/link",
        None,
        r#"{"email":"keep@example.com","password":"pw123456"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSIONS AND ROUTING
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_sign_in_replaces_previous_session() {
    let app = common::create_test_app();

    let first = post_json(&app, "/auth/anonymous", None, "").await;
    let cookie = session_cookie(&first);
    assert_eq!(app.state.sessions.len(), 1);

    let second = post_json(&app, "/auth/anonymous", Some(&cookie), "").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_ne!(session_cookie(&second), cookie);
    assert_eq!(app.state.sessions.len(), 1);
}

#[tokio::test]
async fn test_views_follow_session_state() {
    let app = common::create_test_app();

    // Signed out: home redirects to sign-in, sign-in renders the form.
    let home = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/", None))
        .await
        .unwrap();
    assert_eq!(home.status(), StatusCode::SEE_OTHER);
    assert_eq!(home.headers().get(header::LOCATION).unwrap(), "/signin");

    let signin = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/signin", None))
        .await
        .unwrap();
    assert_eq!(signin.status(), StatusCode::OK);
    let json = body_json(signin).await;
    assert_eq!(json["view"], "sign_in");
    assert_eq!(json["status"], "signed_out");
    assert_eq!(json["mode"], "sign_in");

    // Signed in: the other way around.
    let response = post_json(&app, "/auth/anonymous", None, "").await;
    let cookie = session_cookie(&response);

    let signin = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/signin", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(signin.status(), StatusCode::SEE_OTHER);
    assert_eq!(signin.headers().get(header::LOCATION).unwrap(), "/");

    let home = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(home.status(), StatusCode::OK);
    let json = body_json(home).await;
    assert_eq!(json["view"], "home");
    assert_eq!(json["user"]["is_anonymous"], true);
    assert_eq!(json["show_list"], false);
    assert_eq!(json["habits"].as_array().unwrap().len(), 0);

    // Rendering home fetched the list.
    assert_eq!(app.store.call_count(), 1);
}

#[tokio::test]
async fn test_logout_closes_session() {
    let app = common::create_test_app();

    let response = post_json(&app, "/auth/anonymous", None, "").await;
    let cookie = session_cookie(&response);
    assert_eq!(app.state.sessions.len(), 1);

    let response = app
        .router
        .clone()
        .oneshot(empty_request("POST", "/auth/logout", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.state.sessions.is_empty());
    let removal = common::set_cookie_headers(&response);
    assert!(removal.iter().any(|c| c.starts_with("habit_session=;")));
}

#[tokio::test]
async fn test_expired_sessions_do_not_accumulate() {
    let app = common::create_test_app();

    let mut cookies = Vec::new();
    for _ in 0..50 {
        let response = post_json(&app, "/auth/anonymous", None, "").await;
        assert_eq!(response.status(), StatusCode::OK);
        cookies.push(session_cookie(&response));
    }
    assert_eq!(app.state.sessions.len(), 50);

    // Past the cookie lifetime every session is gone.
    let later = chrono::Utc::now().timestamp() as u64 + 31 * 24 * 60 * 60;
    assert_eq!(app.state.sessions.evict_stale_at(later), 50);
    assert!(app.state.sessions.is_empty());

    // An evicted session with a still-valid cookie comes back on demand.
    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/me", Some(&cookies[0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.state.sessions.len(), 1);
}
