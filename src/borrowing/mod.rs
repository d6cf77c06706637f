//! The borrow/return/overdue subsystem.
//!
//! This is the stateful heart of the service: the engine orchestrates
//! eligibility checks, the inventory ledger's atomic copy accounting and
//! borrow record lifecycle, the sweeper flips elapsed loans to overdue and
//! recomputes member return rates, and the calculator holds the rate
//! formula both of them share.

pub mod db;
pub mod engine;
pub mod handlers;
pub mod return_rate;
pub mod sweeper;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A single loan. Created open by the engine; closed exactly once by
/// `return_book`; `is_overdue` may additionally be flipped by the sweeper
/// while the loan is still open. Terminal once `returned_at` is set.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: Uuid,
    pub member_id: Uuid,
    pub book_id: Uuid,
    pub branch_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub return_by: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub feedback: Option<String>,
}

/// Branch inventory row joined with its book and the book's author.
///
/// The join is inner on both sides: an inventory row pointing at a missing
/// book or author does not resolve, matching the lookup-and-unwind the
/// borrow path has always used.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InventoryWithBook {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub book_id: Uuid,
    pub total_copies: i32,
    pub available_copies: i32,
    pub borrowable_days: i32,
    pub book_title: String,
    pub min_age: i32,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_email: String,
}
