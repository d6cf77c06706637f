//! Member accounts: the model, database operations and HTTP handlers.
//!
//! Members own the two fields the borrow lifecycle mutates: `return_rate`
//! (written by the overdue sweeper) and `borrow_history` (appended by the
//! borrow engine).

pub mod db;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Member role stored as text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            _ => Role::Member,
        }
    }
}

/// Member row as stored in the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
    pub role: String,
    /// 0-100; new members start fully trusted at 100.
    pub return_rate: f64,
    /// Ordered borrow record ids, appended on every borrow.
    pub borrow_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// Member shape returned to clients (no password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub role: Role,
    pub return_rate: f64,
    pub borrow_history: Vec<Uuid>,
}

impl From<Member> for MemberView {
    fn from(member: Member) -> Self {
        let role = member.role();
        Self {
            id: member.id,
            name: member.name,
            email: member.email,
            age: member.age,
            role,
            return_rate: member.return_rate,
            borrow_history: member.borrow_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("member"), Role::Member);
        assert_eq!(Role::parse(Role::Admin.as_str()), Role::Admin);
    }

    #[test]
    fn test_unknown_role_defaults_to_member() {
        assert_eq!(Role::parse("librarian"), Role::Member);
    }
}
