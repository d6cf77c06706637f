//! Author book submissions and the editorial approval workflow.
//!
//! An author's proposed book enters as a pending request; an editor either
//! accepts it (which publishes the book and updates the author's average
//! approval time) or rejects it. Decisions are one-shot: a processed
//! request cannot be decided again.

pub mod db;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission lifecycle, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> RequestStatus {
        match value {
            "accepted" => RequestStatus::Accepted,
            "rejected" => RequestStatus::Rejected,
            _ => RequestStatus::Pending,
        }
    }
}

/// A submitted book awaiting (or past) an editorial decision.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub isbn: String,
    pub genre: String,
    pub min_age: i32,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    /// Seconds between submission and acceptance; only set on accept.
    pub approval_seconds: Option<f64>,
}

impl BookRequest {
    pub fn status(&self) -> RequestStatus {
        RequestStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_status_reads_as_pending() {
        assert_eq!(RequestStatus::parse("archived"), RequestStatus::Pending);
    }

    #[test]
    fn test_request_wire_format_is_camel_case() {
        let request = BookRequest {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "The Shelf".into(),
            isbn: "978-0000000000".into(),
            genre: "fiction".into(),
            min_age: 12,
            status: "pending".into(),
            requested_at: Utc::now(),
            responded_at: None,
            approval_seconds: None,
        };
        assert_eq!(request.status(), RequestStatus::Pending);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json["authorId"].is_string());
        assert!(json["minAge"].is_number());
        assert!(json["respondedAt"].is_null());
    }
}
