// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use habit_tracker::config::Config;
use habit_tracker::db::{FirestoreDb, MemoryStore};
use habit_tracker::models::AuthUser;
use habit_tracker::routes::create_router;
use habit_tracker::services::identity::PasswordCredential;
use habit_tracker::services::{AuthError, AuthErrorCode, IdentityProvider};
use habit_tracker::session::SessionStore;
use habit_tracker::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// In-process identity provider.
///
/// Accounts are keyed by email. The ID token `"valid-google-token"` signs in
/// a federated user `google-uid` with email `g@example.com`; any other token
/// is rejected. Anonymous sign-in fails after `without_anonymous`.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, (String, String)>>,
    next_uid: AtomicU64,
    anonymous_disabled: bool,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn with_account(self, email: &str, password: &str, uid: &str) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), uid.to_string()));
        self
    }

    pub fn without_anonymous(mut self) -> Self {
        self.anonymous_disabled = true;
        self
    }

    fn next_uid(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_uid.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError> {
        if !credential.email.contains('@') {
            return Err(AuthError::new(AuthErrorCode::InvalidEmail, "bad email"));
        }
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(&credential.email) {
            None => Err(AuthError::new(AuthErrorCode::UserNotFound, "no such user")),
            Some((password, _)) if *password != credential.password => {
                Err(AuthError::new(AuthErrorCode::WrongPassword, "wrong password"))
            }
            Some((_, uid)) => Ok(AuthUser::from_claims(
                uid.clone(),
                Some(credential.email.clone()),
                false,
            )),
        }
    }

    async fn register_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError> {
        if !credential.email.contains('@') {
            return Err(AuthError::new(AuthErrorCode::InvalidEmail, "bad email"));
        }
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&credential.email) {
            return Err(AuthError::new(AuthErrorCode::EmailAlreadyInUse, "taken"));
        }
        let uid = self.next_uid("user");
        accounts.insert(
            credential.email.clone(),
            (credential.password.clone(), uid.clone()),
        );
        Ok(AuthUser::from_claims(uid, Some(credential.email.clone()), false))
    }

    async fn sign_in_with_federated(&self, id_token: &str) -> Result<AuthUser, AuthError> {
        if id_token != "valid-google-token" {
            return Err(AuthError::new(AuthErrorCode::InvalidCredential, "bad token"));
        }
        Ok(AuthUser::from_claims(
            "google-uid".to_string(),
            Some("g@example.com".to_string()),
            false,
        ))
    }

    async fn sign_in_anonymously(&self) -> Result<AuthUser, AuthError> {
        if self.anonymous_disabled {
            return Err(AuthError::new(
                AuthErrorCode::Other("ADMIN_ONLY_OPERATION".to_string()),
                "anonymous sign-in disabled",
            ));
        }
        Ok(AuthUser::from_claims(self.next_uid("anon"), None, true))
    }

    async fn link_credential(
        &self,
        user: &AuthUser,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&credential.email) {
            return Err(AuthError::new(AuthErrorCode::EmailAlreadyInUse, "taken"));
        }
        accounts.insert(
            credential.email.clone(),
            (credential.password.clone(), user.uid.clone()),
        );
        Ok(AuthUser::from_claims(
            user.uid.clone(),
            Some(credential.email.clone()),
            false,
        ))
    }
}

/// Handles a test needs next to the router.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

/// Create a test app with an in-memory store and a fake identity provider.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default(), FakeIdentity::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> TestApp {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with(config, FakeIdentity::default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config, identity: FakeIdentity) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState {
        config,
        store: store.clone(),
        identity: Arc::new(identity),
        sessions: Arc::new(SessionStore::new(store.clone())),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
    }
}

/// Raw values of every Set-Cookie header.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The session cookie from a response, as a `Cookie` request header value.
#[allow(dead_code)]
pub fn session_cookie(response: &Response) -> String {
    let headers = set_cookie_headers(response);
    let cookie = headers
        .iter()
        .find(|value| value.starts_with("habit_session="))
        .unwrap_or_else(|| panic!("missing session cookie: {headers:?}"));
    cookie.split(';').next().unwrap().to_string()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}
