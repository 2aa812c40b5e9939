// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit Tracker API Server
//!
//! Signs users in through Firebase Auth and keeps their habits and
//! check-ins in Firestore.

use habit_tracker::{
    config::{Config, StoreBackend},
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::FirebaseAuthClient,
    session::{spawn_eviction_task, SessionStore},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Habit Tracker API");

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory habit store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let identity = Arc::new(FirebaseAuthClient::new(&config)?);
    tracing::info!(
        emulator = config.auth_emulator_host.is_some(),
        "Identity provider initialized"
    );

    // Sessions expire with their cookie or after sitting idle
    let sessions = Arc::new(SessionStore::new(store.clone()));
    spawn_eviction_task(sessions.clone(), SESSION_SWEEP_INTERVAL);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        sessions,
        store,
        identity,
    });

    // Build router
    let app = habit_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,habit_tracker=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
