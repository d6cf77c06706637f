/**
 * Server Initialization
 *
 * Builds the application: database pool, mailer, shared state, background
 * tasks and the router.
 *
 * # Initialization Steps
 *
 * 1. Connect to the database and run migrations
 * 2. Build the mailer from environment configuration
 * 3. Create the shared state (presence tracker, room registry, sweep guard)
 * 4. Spawn the daily overdue sweep and the room-channel cleanup task
 * 5. Assemble the router
 */
use std::time::Duration;

use axum::Router;

use crate::borrowing::sweeper::start_daily_sweep;
use crate::notify::Mailer;
use crate::routes::router::create_router;
use crate::server::config::load_database;
use crate::server::state::AppState;

/// Create and configure the Axum application.
///
/// # Errors
///
/// Fails when the database is unavailable (see `config::load_database`).
pub async fn create_app() -> Result<Router, Box<dyn std::error::Error>> {
    tracing::info!("Initializing library server");

    let pool = load_database().await?;
    let mailer = Mailer::from_env();

    let state = AppState::new(pool.clone(), mailer);

    // Daily overdue sweep; shares the single-flight guard with the admin
    // endpoint so the two can never interleave.
    start_daily_sweep(pool, state.sweep_guard.clone());

    // Periodically prune room channels nobody is subscribed to.
    let rooms = state.rooms.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rooms.cleanup_inactive_channels();
            tracing::debug!("Pruned inactive chat room channels");
        }
    });

    tracing::info!("Background tasks started");

    Ok(create_router(state))
}
