/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * necessary `FromRef` traits for Axum state extraction.
 *
 * # Thread Safety
 *
 * Every field is designed for concurrent access: the pool and mailer are
 * internally shared, the presence tracker and room registry are
 * mutex-guarded maps, and the sweep guard is the single-flight lock shared
 * by the timer and the admin endpoint.
 */
use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::chat::presence::PresenceTracker;
use crate::chat::rooms::RoomRegistry;
use crate::notify::Mailer;

/// Central state container shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool; the durable shared state lives here.
    pub pool: PgPool,
    /// Outbound email notifier (may be disabled).
    pub mailer: Mailer,
    /// Process-local room membership. Rebuilt empty on restart.
    pub presence: PresenceTracker,
    /// Per-book broadcast channels for chat fan-out.
    pub rooms: RoomRegistry,
    /// Single-flight guard for the overdue sweeper.
    pub sweep_guard: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pool: PgPool, mailer: Mailer) -> Self {
        Self {
            pool,
            mailer,
            presence: PresenceTracker::new(),
            rooms: RoomRegistry::new(),
            sweep_guard: Arc::new(Mutex::new(())),
        }
    }
}

/// Lets handlers that only need the database take `State(pool)` directly.
impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for Mailer {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for PresenceTracker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rooms.clone()
    }
}
