// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Identity Toolkit REST client.
//!
//! Handles:
//! - Email/password sign-in and registration
//! - Google ID token exchange (`signInWithIdp`)
//! - Anonymous accounts
//! - Linking an email/password credential to a signed-in account

use crate::config::Config;
use crate::models::AuthUser;
use crate::services::identity::{
    AuthError, AuthErrorCode, IdentityProvider, PasswordCredential,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity Toolkit client bound to one Firebase project.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// `requestUri` sent with federated sign-in
    request_uri: String,
}

/// Successful account response (shared by all endpoints used here).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnonymousRequest {
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkRequest<'a> {
    id_token: &'a str,
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

impl FirebaseAuthClient {
    /// Create a client from configuration.
    ///
    /// Uses the Auth emulator when FIREBASE_AUTH_EMULATOR_HOST is configured.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = match &config.auth_emulator_host {
            Some(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            None => IDENTITY_TOOLKIT_URL.to_string(),
        };

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.firebase_api_key.clone(),
            request_uri: config.frontend_url.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.base_url, method)
    }

    /// POST a JSON body to an `accounts:*` method and parse the account.
    async fn call<B: Serialize>(&self, method: &str, body: &B) -> Result<AccountResponse, AuthError> {
        let response = self
            .http
            .post(self.endpoint(method))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<AccountResponse>()
                .await
                .map_err(|e| AuthError::transport(format!("Invalid {} response: {}", method, e)));
        }

        let body = response.text().await.unwrap_or_default();
        Err(parse_error_body(status, &body))
    }
}

/// Turn an Identity Toolkit error body into an [`AuthError`].
fn parse_error_body(status: reqwest::StatusCode, body: &str) -> AuthError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => AuthError::new(
            AuthErrorCode::parse(&envelope.error.message),
            envelope.error.message,
        ),
        Err(_) => AuthError::transport(format!("HTTP {}: {}", status, body)),
    }
}

fn into_user(account: AccountResponse, is_anonymous: bool) -> AuthUser {
    AuthUser {
        uid: account.local_id,
        email: account.email.filter(|e| !e.is_empty()),
        is_anonymous,
        id_token: account.id_token,
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_in_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError> {
        let request = PasswordRequest {
            email: &credential.email,
            password: &credential.password,
            return_secure_token: true,
        };
        let account = self.call("signInWithPassword", &request).await?;
        tracing::info!(uid = %account.local_id, "Signed in with email and password");
        Ok(into_user(account, false))
    }

    async fn register_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError> {
        let request = PasswordRequest {
            email: &credential.email,
            password: &credential.password,
            return_secure_token: true,
        };
        let account = self.call("signUp", &request).await?;
        tracing::info!(uid = %account.local_id, "Account created with email and password");
        Ok(into_user(account, false))
    }

    async fn sign_in_with_federated(&self, id_token: &str) -> Result<AuthUser, AuthError> {
        let request = IdpRequest {
            post_body: format!(
                "id_token={}&providerId=google.com",
                urlencoding::encode(id_token)
            ),
            request_uri: &self.request_uri,
            return_idp_credential: true,
            return_secure_token: true,
        };
        let account = self.call("signInWithIdp", &request).await?;
        tracing::info!(uid = %account.local_id, "Signed in with Google");
        Ok(into_user(account, false))
    }

    async fn sign_in_anonymously(&self) -> Result<AuthUser, AuthError> {
        let request = AnonymousRequest {
            return_secure_token: true,
        };
        let account = self.call("signUp", &request).await?;
        tracing::info!(uid = %account.local_id, "Signed in anonymously");
        Ok(into_user(account, true))
    }

    async fn link_credential(
        &self,
        user: &AuthUser,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError> {
        let id_token = user.id_token.as_deref().ok_or_else(|| {
            AuthError::new(
                AuthErrorCode::InvalidCredential,
                "session has no provider token; sign in again to link",
            )
        })?;

        let request = LinkRequest {
            id_token,
            email: &credential.email,
            password: &credential.password,
            return_secure_token: true,
        };
        let account = self.call("update", &request).await?;
        tracing::info!(uid = %account.local_id, "Accounts linked successfully");
        Ok(into_user(account, false))
    }
}
