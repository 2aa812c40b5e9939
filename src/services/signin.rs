// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in flows on top of an [`IdentityProvider`].
//!
//! Handles:
//! - Password sign-in or registration, chosen by [`PasswordMode`]
//! - Federated sign-in with opt-in password linking
//! - Anonymous sign-in
//! - Explicit linking of an email/password credential

use crate::error::AppError;
use crate::models::AuthUser;
use crate::services::identity::{IdentityProvider, PasswordCredential};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const FEDERATED_FAILURE: &str = "Error signing in with Google.";
pub const ANONYMOUS_FAILURE: &str = "Error signing in Anonymously.";

/// Sign-in form status as shown to the user.
///
/// `Submitting` is held by the client while a request is in flight; the
/// service answers with `SignedOut` (form shown) or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SignInStatus {
    SignedOut,
    Submitting,
    Error { message: String },
}

/// Whether the password form signs in or registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PasswordMode {
    #[default]
    SignIn,
    Register,
}

impl PasswordMode {
    pub fn toggled(self) -> Self {
        match self {
            PasswordMode::SignIn => PasswordMode::Register,
            PasswordMode::Register => PasswordMode::SignIn,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordSignIn {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    pub mode: PasswordMode,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FederatedSignIn {
    /// Google ID token from the front-end popup
    #[validate(length(min = 1, message = "ID token is required"))]
    pub id_token: String,
    /// Opt-in: also link an email/password credential using this password
    #[serde(default)]
    pub link_password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LinkPassword {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Result of a federated sign-in.
#[derive(Debug, Clone)]
pub struct FederatedOutcome {
    pub user: AuthUser,
    /// `None` if no link was requested
    pub linked: Option<bool>,
}

fn validate(form: &impl Validate) -> Result<(), AppError> {
    form.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Sign in or register with email and password.
pub async fn sign_in_with_password(
    identity: &dyn IdentityProvider,
    form: &PasswordSignIn,
) -> Result<AuthUser, AppError> {
    validate(form)?;

    let credential = PasswordCredential {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };

    let user = match form.mode {
        PasswordMode::SignIn => identity.sign_in_with_password(&credential).await?,
        PasswordMode::Register => identity.register_with_password(&credential).await?,
    };
    Ok(user)
}

/// Exchange a Google ID token; optionally link a password credential.
///
/// Link failures are logged and reported through `linked`, never as a
/// sign-in failure.
pub async fn sign_in_with_federated(
    identity: &dyn IdentityProvider,
    form: &FederatedSignIn,
) -> Result<FederatedOutcome, AppError> {
    validate(form)?;

    let user = identity
        .sign_in_with_federated(&form.id_token)
        .await
        .map_err(|e| {
            tracing::error!(code = %e.code, error = %e.message, "Error signing in with Google");
            AppError::SignInFailed(FEDERATED_FAILURE)
        })?;

    let Some(password) = form.link_password.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(FederatedOutcome { user, linked: None });
    };

    let Some(email) = user.email.clone() else {
        tracing::warn!(uid = %user.uid, "Federated account has no email, cannot link password");
        return Ok(FederatedOutcome {
            user,
            linked: Some(false),
        });
    };

    let credential = PasswordCredential {
        email,
        password: password.to_string(),
    };
    match identity.link_credential(&user, &credential).await {
        Ok(linked_user) => Ok(FederatedOutcome {
            user: linked_user,
            linked: Some(true),
        }),
        Err(e) => {
            tracing::error!(code = %e.code, error = %e.message, "Error linking accounts");
            Ok(FederatedOutcome {
                user,
                linked: Some(false),
            })
        }
    }
}

pub async fn sign_in_anonymously(identity: &dyn IdentityProvider) -> Result<AuthUser, AppError> {
    identity.sign_in_anonymously().await.map_err(|e| {
        tracing::error!(code = %e.code, error = %e.message, "Error signing in anonymously");
        AppError::SignInFailed(ANONYMOUS_FAILURE)
    })
}

/// Link an email/password credential to the signed-in user.
pub async fn link_password(
    identity: &dyn IdentityProvider,
    user: &AuthUser,
    form: &LinkPassword,
) -> Result<AuthUser, AppError> {
    validate(form)?;

    let credential = PasswordCredential {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };
    Ok(identity.link_credential(user, &credential).await?)
}
