//! Catalog: authors, branches, books and per-branch inventory.
//!
//! Plain CRUD from the core's perspective; the borrow engine only reads
//! these tables (via its own join) and mutates `available_copies` through
//! the inventory ledger.

pub mod db;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub biography: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    pub branch_name: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub isbn: String,
    pub genre: String,
    pub min_age: i32,
    pub author_id: Uuid,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BranchInventory {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub book_id: Uuid,
    pub total_copies: i32,
    pub available_copies: i32,
    pub borrowable_days: i32,
}
