/**
 * Overdue Sweeper
 *
 * A daily background job that flips elapsed open loans to overdue and
 * recomputes the owning members' return rates over their whole history.
 * Runs are single-flight: a second invocation while one is in progress is
 * rejected instead of interleaving updates.
 */
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::borrowing::db::{count_borrows, find_overdue_candidates, mark_overdue};
use crate::borrowing::return_rate::return_rate;
use crate::error::{AppError, AppResult};
use crate::members::db::update_return_rate;

/// Single-flight guard shared between the timer task and the admin
/// endpoint. Holding the lock for the duration of a run keeps two sweeps
/// from ever touching the same records.
pub type SweepGuard = Arc<Mutex<()>>;

/// What a sweep run did; returned to the admin endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub flagged: usize,
    pub members_updated: usize,
    pub failures: usize,
}

/// Run one overdue sweep.
///
/// Errors on a single record are logged and skipped; the sweep continues
/// with the rest. The whole run is idempotent: with no newly elapsed due
/// dates a second run flags nothing and recomputes nothing.
pub async fn run_overdue_sweep(pool: &PgPool, guard: &SweepGuard) -> AppResult<SweepSummary> {
    let Ok(_running) = guard.try_lock() else {
        return Err(AppError::SweepAlreadyRunning);
    };

    let now = Utc::now();
    let candidates = find_overdue_candidates(pool, now).await?;
    tracing::info!(count = candidates.len(), "Overdue sweep started");

    let mut summary = SweepSummary {
        flagged: 0,
        members_updated: 0,
        failures: 0,
    };

    for borrow in candidates {
        if let Err(e) = mark_overdue(pool, borrow.id).await {
            tracing::warn!(borrow_id = %borrow.id, "Failed to flag overdue loan: {e:?}");
            summary.failures += 1;
            continue;
        }
        summary.flagged += 1;

        // Recompute over the member's entire history, not just the loan we
        // flagged, so repeated sweeps converge on the same rate.
        match recompute_member_rate(pool, borrow.member_id).await {
            Ok(()) => summary.members_updated += 1,
            Err(e) => {
                tracing::warn!(
                    member_id = %borrow.member_id,
                    "Failed to recompute return rate: {e:?}"
                );
                summary.failures += 1;
            }
        }
    }

    tracing::info!(
        flagged = summary.flagged,
        members_updated = summary.members_updated,
        failures = summary.failures,
        "Overdue sweep completed"
    );

    Ok(summary)
}

async fn recompute_member_rate(pool: &PgPool, member_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    let (total, overdue) = count_borrows(pool, member_id).await?;
    let rate = return_rate(total, overdue);
    update_return_rate(pool, member_id, rate).await
}

/// Spawn the daily sweep timer.
///
/// The interval ticks once per day; each tick goes through the same
/// single-flight guard as the admin endpoint, so a long manual run simply
/// makes the timer skip.
pub fn start_daily_sweep(pool: PgPool, guard: SweepGuard) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
        // The first tick fires immediately; skip it so startup does not
        // race the migrations-then-serve sequence.
        interval.tick().await;
        loop {
            interval.tick().await;
            match run_overdue_sweep(&pool, &guard).await {
                Ok(summary) => {
                    tracing::info!(?summary, "Daily overdue sweep finished");
                }
                Err(AppError::SweepAlreadyRunning) => {
                    tracing::warn!("Daily overdue sweep skipped: a sweep is already running");
                }
                Err(e) => {
                    tracing::error!("Daily overdue sweep failed: {e:?}");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_guard_rejects_overlapping_runs() {
        let guard: SweepGuard = Arc::new(Mutex::new(()));

        let held = guard.clone().try_lock_owned().unwrap();

        // While a run holds the guard, try_lock fails the way
        // run_overdue_sweep would.
        assert!(guard.try_lock().is_err());

        drop(held);
        assert!(guard.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_sweep_reports_already_running() {
        // A pool that never connects is fine here: the guard check happens
        // before any database access.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let guard: SweepGuard = Arc::new(Mutex::new(()));
        let _held = guard.lock().await;

        assert_matches!(
            run_overdue_sweep(&pool, &guard).await,
            Err(AppError::SweepAlreadyRunning)
        );
    }
}
