// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod firebase_auth;
pub mod habits;
pub mod identity;
pub mod signin;

pub use firebase_auth::FirebaseAuthClient;
pub use habits::HabitRepository;
pub use identity::{AuthError, AuthErrorCode, AuthStateNotifier, IdentityProvider};
