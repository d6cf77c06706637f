/**
 * Borrow/Return Engine
 *
 * The central state machine over members, branch inventory and borrow
 * records. `borrow_book` checks eligibility in a fixed order and commits
 * the record, the copy decrement and the member's history append as one
 * transaction; `return_book` closes a record exactly once and puts the
 * copy back on the shelf it came from.
 */
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::borrowing::db::{
    close_borrow, decrement_available, find_borrow, find_inventory_with_book, increment_available,
    insert_borrow,
};
use crate::borrowing::return_rate::MIN_BORROW_RATE;
use crate::borrowing::{BorrowRecord, InventoryWithBook};
use crate::error::{AppError, AppResult};
use crate::members::db::{find_member_by_id, push_borrow_history};
use crate::members::Member;
use crate::notify::Mailer;

/// Borrow one copy from a branch inventory row.
///
/// Preconditions, checked in order — the first violated one wins:
/// 1. the member exists;
/// 2. their return rate is at least 30;
/// 3. the inventory row resolves to a book and its author;
/// 4. a copy is available;
/// 5. the member meets the book's minimum age.
///
/// On success the copy decrement, the new record and the member's history
/// append commit together; if any of them fails nothing is persisted. The
/// author notification happens after commit and never rolls back a borrow.
pub async fn borrow_book(
    pool: &PgPool,
    mailer: &Mailer,
    inventory_id: Uuid,
    member_id: Uuid,
) -> AppResult<BorrowRecord> {
    let member = find_member_by_id(pool, member_id)
        .await?
        .ok_or(AppError::MemberNotFound)?;

    let inventory = find_inventory_with_book(pool, inventory_id).await?;
    let inventory = check_eligibility(&member, inventory)?;

    let borrowed_at = Utc::now();
    let return_by = due_date(borrowed_at, inventory.borrowable_days);

    let mut tx = pool.begin().await?;

    // Guarded decrement first: under concurrent borrowers of the last copy
    // exactly one of these statements affects a row.
    let debited = decrement_available(&mut *tx, inventory_id).await?;
    if debited == 0 {
        tx.rollback().await?;
        return Err(AppError::NoAvailableCopies);
    }

    let record = insert_borrow(
        &mut *tx,
        member.id,
        inventory.book_id,
        inventory.branch_id,
        borrowed_at,
        return_by,
    )
    .await?;

    push_borrow_history(&mut *tx, member.id, record.id).await?;

    tx.commit().await?;

    tracing::info!(
        borrow_id = %record.id,
        member_id = %member.id,
        book_id = %inventory.book_id,
        "Book borrowed"
    );

    // Best effort: a notifier failure is logged inside the mailer and must
    // not surface as a borrow failure.
    let mailer = mailer.clone();
    let author_email = inventory.author_email.clone();
    let author_name = inventory.author_name.clone();
    let book_title = inventory.book_title.clone();
    let member_name = member.name.clone();
    tokio::spawn(async move {
        mailer
            .send_email(
                &author_email,
                "Your book was borrowed",
                &format!("Dear {author_name}, \"{book_title}\" was just borrowed by {member_name}."),
                Some(&format!(
                    "<p>Dear {author_name}, <strong>{book_title}</strong> was just borrowed by {member_name}.</p>"
                )),
            )
            .await;
    });

    Ok(record)
}

/// Eligibility checks 2-5, in their fixed order over an already-loaded
/// member. The inventory row is passed as the raw lookup result so the
/// return-rate gate fires before a missing row is reported.
fn check_eligibility(
    member: &Member,
    inventory: Option<InventoryWithBook>,
) -> AppResult<InventoryWithBook> {
    if member.return_rate < MIN_BORROW_RATE {
        return Err(AppError::ReturnRateTooLow);
    }

    let inventory = inventory.ok_or(AppError::InventoryNotFound)?;

    if inventory.available_copies <= 0 {
        return Err(AppError::NoAvailableCopies);
    }

    if member.age < inventory.min_age {
        return Err(AppError::BelowMinimumAge {
            min_age: inventory.min_age,
        });
    }

    Ok(inventory)
}

/// Due date of a loan started now: the branch's borrowable window in whole
/// days from the moment of borrowing.
fn due_date(borrowed_at: DateTime<Utc>, borrowable_days: i32) -> DateTime<Utc> {
    borrowed_at + Duration::days(i64::from(borrowable_days))
}

/// Return a borrowed book.
///
/// A record can be returned exactly once; a second return is an
/// `AlreadyReturned` error with no state change. A loan handed back after
/// its due date is marked overdue here even if the sweeper never saw it.
pub async fn return_book(
    pool: &PgPool,
    borrow_id: Uuid,
    feedback: &str,
) -> AppResult<BorrowRecord> {
    let borrow = find_borrow(pool, borrow_id)
        .await?
        .ok_or(AppError::BorrowNotFound)?;

    if borrow.returned_at.is_some() {
        return Err(AppError::AlreadyReturned);
    }

    let returned_at = Utc::now();
    let late = returned_at > borrow.return_by;

    let mut tx = pool.begin().await?;

    // The close carries its own open-record guard; if a concurrent return
    // got there first this observes it as already returned.
    let record = close_borrow(&mut *tx, borrow_id, returned_at, late, feedback)
        .await?
        .ok_or(AppError::AlreadyReturned)?;

    let credited = increment_available(&mut *tx, borrow.branch_id, borrow.book_id).await?;
    if credited == 0 {
        tracing::warn!(
            borrow_id = %borrow_id,
            branch_id = %borrow.branch_id,
            book_id = %borrow.book_id,
            "Return credited no inventory row; shelf count left unchanged"
        );
    }

    tx.commit().await?;

    tracing::info!(
        borrow_id = %record.id,
        member_id = %record.member_id,
        late,
        "Book returned"
    );

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn member(age: i32, return_rate: f64) -> Member {
        Member {
            id: Uuid::new_v4(),
            name: "Reader".into(),
            email: "reader@example.com".into(),
            password_hash: "hash".into(),
            age,
            role: "member".into(),
            return_rate,
            borrow_history: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn inventory(available_copies: i32, min_age: i32) -> InventoryWithBook {
        InventoryWithBook {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            total_copies: 5,
            available_copies,
            borrowable_days: 7,
            book_title: "The Shelf".into(),
            min_age,
            author_id: Uuid::new_v4(),
            author_name: "Author".into(),
            author_email: "author@example.com".into(),
        }
    }

    #[test]
    fn test_eligible_member_passes() {
        let result = check_eligibility(&member(30, 100.0), Some(inventory(3, 18)));
        assert!(result.is_ok());
    }

    #[test]
    fn test_low_return_rate_blocks_borrowing() {
        assert_matches!(
            check_eligibility(&member(30, 29.9), Some(inventory(3, 0))),
            Err(AppError::ReturnRateTooLow)
        );
    }

    #[test]
    fn test_rate_at_threshold_is_allowed() {
        assert!(check_eligibility(&member(30, 30.0), Some(inventory(3, 0))).is_ok());
    }

    #[test]
    fn test_missing_inventory_reported_after_rate_gate() {
        // A blocked member is told about their rate, not about the shelf.
        assert_matches!(
            check_eligibility(&member(30, 10.0), None),
            Err(AppError::ReturnRateTooLow)
        );
        assert_matches!(
            check_eligibility(&member(30, 100.0), None),
            Err(AppError::InventoryNotFound)
        );
    }

    #[test]
    fn test_no_copies_blocks_before_age() {
        // Availability outranks the age gate for an underage member.
        assert_matches!(
            check_eligibility(&member(10, 100.0), Some(inventory(0, 18))),
            Err(AppError::NoAvailableCopies)
        );
    }

    #[test]
    fn test_underage_member_gets_the_minimum_named() {
        assert_matches!(
            check_eligibility(&member(12, 100.0), Some(inventory(3, 16))),
            Err(AppError::BelowMinimumAge { min_age: 16 })
        );
    }

    #[test]
    fn test_due_date_adds_whole_days() {
        let borrowed_at = Utc.with_ymd_and_hms(2026, 3, 10, 14, 30, 0).unwrap();
        let due = due_date(borrowed_at, 7);
        assert_eq!(due, Utc.with_ymd_and_hms(2026, 3, 17, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_due_date_zero_window_is_due_immediately() {
        let borrowed_at = Utc.with_ymd_and_hms(2026, 3, 10, 14, 30, 0).unwrap();
        assert_eq!(due_date(borrowed_at, 0), borrowed_at);
    }
}
