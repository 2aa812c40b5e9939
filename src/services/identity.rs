// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider seam and the auth-change stream of a session.

use crate::models::AuthUser;
use std::fmt;
use tokio::sync::watch;

/// Provider error codes the sign-in form distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    WrongPassword,
    UserNotFound,
    InvalidCredential,
    /// Provider could not be reached or answered garbage
    Transport,
    /// Any code without a dedicated message
    Other(String),
}

impl AuthErrorCode {
    /// Parse a provider code.
    ///
    /// Accepts both the web SDK vocabulary (`auth/wrong-password`) and the
    /// Identity Toolkit REST vocabulary (`INVALID_PASSWORD`). REST messages may
    /// carry a suffix after ` : ` which is ignored.
    pub fn parse(raw: &str) -> Self {
        let code = raw.split(" : ").next().unwrap_or(raw).trim();
        match code {
            "auth/email-already-in-use" | "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "auth/invalid-email" | "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "auth/wrong-password" | "INVALID_PASSWORD" => Self::WrongPassword,
            "auth/user-not-found" | "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "auth/invalid-credential" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => {
                Self::InvalidCredential
            }
            other => Self::Other(other.to_string()),
        }
    }

    /// Fixed user-facing text for this code.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "This email is already in use.",
            Self::InvalidEmail => "The email address is not valid.",
            Self::WrongPassword => "Incorrect password.",
            Self::UserNotFound => "No user found with this email.",
            Self::InvalidCredential => "The credentials provided are invalid.",
            Self::Transport | Self::Other(_) => "An error occurred. Please try again.",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailAlreadyInUse => f.write_str("email-already-in-use"),
            Self::InvalidEmail => f.write_str("invalid-email"),
            Self::WrongPassword => f.write_str("wrong-password"),
            Self::UserNotFound => f.write_str("user-not-found"),
            Self::InvalidCredential => f.write_str("invalid-credential"),
            Self::Transport => f.write_str("transport"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

/// `{code, message}` pair reported by the identity provider.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Transport, message)
    }
}

/// Email/password credential used for sign-in and account linking.
#[derive(Debug, Clone)]
pub struct PasswordCredential {
    pub email: String,
    pub password: String,
}

/// Operations the identity provider supplies.
///
/// Sign-in operations are stateless: they return the signed-in user and the
/// caller publishes it on the session's [`AuthStateNotifier`].
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, credential: &PasswordCredential)
        -> Result<AuthUser, AuthError>;

    async fn register_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError>;

    /// Exchange a federated (Google) ID token obtained by the front-end popup.
    async fn sign_in_with_federated(&self, id_token: &str) -> Result<AuthUser, AuthError>;

    async fn sign_in_anonymously(&self) -> Result<AuthUser, AuthError>;

    /// Attach an email/password credential to an already signed-in user.
    async fn link_credential(
        &self,
        user: &AuthUser,
        credential: &PasswordCredential,
    ) -> Result<AuthUser, AuthError>;

    /// Provider-side sign-out. Token-based providers have nothing to revoke.
    async fn sign_out(&self, _user: &AuthUser) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Current-user change stream of one browser session.
///
/// Every sign-in or sign-out is published here; subscribers see the latest
/// value and every later change.
pub struct AuthStateNotifier {
    sender: watch::Sender<Option<AuthUser>>,
}

impl AuthStateNotifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Subscribe to changes. The first `changed()` resolves right away with
    /// the current value, like an initial auth notification.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        let mut receiver = self.sender.subscribe();
        receiver.mark_changed();
        receiver
    }

    /// Publish a new current user (or `None` for signed out).
    pub fn publish(&self, user: Option<AuthUser>) {
        self.sender.send_replace(user);
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.sender.borrow().clone()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthStateNotifier {
    fn default() -> Self {
        Self::new()
    }
}
