//! Signed-in user as reported by the identity provider.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The current user of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthUser {
    /// Provider user id; owner key for habits
    pub uid: String,
    /// Email address (absent for anonymous users)
    pub email: Option<String>,
    /// Whether the account was created by anonymous sign-in
    pub is_anonymous: bool,
    /// Provider ID token, needed to link credentials. Never sent to clients.
    #[serde(skip)]
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    pub id_token: Option<String>,
}

impl AuthUser {
    /// User restored from a session cookie (no provider token available).
    pub fn from_claims(uid: String, email: Option<String>, is_anonymous: bool) -> Self {
        Self {
            uid,
            email,
            is_anonymous,
            id_token: None,
        }
    }
}
