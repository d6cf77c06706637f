/**
 * Borrow Record Store and Inventory Ledger
 *
 * Database operations for borrow records and per-branch copy accounting.
 * All inventory mutation goes through `decrement_available` and
 * `increment_available`; each is a single atomic update so two concurrent
 * borrowers of the last copy cannot both succeed.
 */
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::borrowing::{BorrowRecord, InventoryWithBook};

const BORROW_COLUMNS: &str =
    "id, member_id, book_id, branch_id, borrowed_at, return_by, returned_at, is_overdue, feedback";

/// Resolve an inventory row to its book and the book's author.
///
/// Inner joins: a row whose book or author has been deleted does not
/// resolve and the caller reports the inventory as not found.
pub async fn find_inventory_with_book(
    pool: &PgPool,
    inventory_id: Uuid,
) -> Result<Option<InventoryWithBook>, sqlx::Error> {
    sqlx::query_as::<_, InventoryWithBook>(
        r#"
        SELECT
            i.id, i.branch_id, i.book_id, i.total_copies, i.available_copies,
            i.borrowable_days,
            b.title AS book_title, b.min_age,
            a.id AS author_id, a.name AS author_name, a.email AS author_email
        FROM branch_inventory i
        INNER JOIN books b ON b.id = i.book_id
        INNER JOIN authors a ON a.id = b.author_id
        WHERE i.id = $1
        "#,
    )
    .bind(inventory_id)
    .fetch_optional(pool)
    .await
}

/// Take one copy off the shelf.
///
/// The availability guard lives in the statement itself; zero rows affected
/// means another borrower took the last copy between the engine's read and
/// this write.
pub async fn decrement_available<'e>(
    executor: impl PgExecutor<'e>,
    inventory_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE branch_inventory
        SET available_copies = available_copies - 1
        WHERE id = $1 AND available_copies > 0
        "#,
    )
    .bind(inventory_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Put one copy back.
///
/// Keyed by the `(branch_id, book_id)` pair stored on the borrow record;
/// the pair is unique on branch_inventory, so this is the row that was
/// debited at borrow time.
pub async fn increment_available<'e>(
    executor: impl PgExecutor<'e>,
    branch_id: Uuid,
    book_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE branch_inventory
        SET available_copies = available_copies + 1
        WHERE branch_id = $1 AND book_id = $2 AND available_copies < total_copies
        "#,
    )
    .bind(branch_id)
    .bind(book_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Create an open borrow record.
pub async fn insert_borrow<'e>(
    executor: impl PgExecutor<'e>,
    member_id: Uuid,
    book_id: Uuid,
    branch_id: Uuid,
    borrowed_at: DateTime<Utc>,
    return_by: DateTime<Utc>,
) -> Result<BorrowRecord, sqlx::Error> {
    sqlx::query_as::<_, BorrowRecord>(&format!(
        r#"
        INSERT INTO borrows (member_id, book_id, branch_id, borrowed_at, return_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {BORROW_COLUMNS}
        "#
    ))
    .bind(member_id)
    .bind(book_id)
    .bind(branch_id)
    .bind(borrowed_at)
    .bind(return_by)
    .fetch_one(executor)
    .await
}

/// Fetch a borrow record by id.
pub async fn find_borrow<'e>(
    executor: impl PgExecutor<'e>,
    borrow_id: Uuid,
) -> Result<Option<BorrowRecord>, sqlx::Error> {
    sqlx::query_as::<_, BorrowRecord>(&format!(
        "SELECT {BORROW_COLUMNS} FROM borrows WHERE id = $1"
    ))
    .bind(borrow_id)
    .fetch_optional(executor)
    .await
}

/// Close an open borrow record.
///
/// The `returned_at IS NULL` guard makes the close one-shot even under a
/// concurrent duplicate return: the loser gets no row back.
pub async fn close_borrow<'e>(
    executor: impl PgExecutor<'e>,
    borrow_id: Uuid,
    returned_at: DateTime<Utc>,
    is_overdue: bool,
    feedback: &str,
) -> Result<Option<BorrowRecord>, sqlx::Error> {
    sqlx::query_as::<_, BorrowRecord>(&format!(
        r#"
        UPDATE borrows
        SET returned_at = $1,
            is_overdue = is_overdue OR $2,
            feedback = $3
        WHERE id = $4 AND returned_at IS NULL
        RETURNING {BORROW_COLUMNS}
        "#
    ))
    .bind(returned_at)
    .bind(is_overdue)
    .bind(feedback)
    .bind(borrow_id)
    .fetch_optional(executor)
    .await
}

/// All open loans past their due date that are not yet flagged.
pub async fn find_overdue_candidates(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<BorrowRecord>, sqlx::Error> {
    sqlx::query_as::<_, BorrowRecord>(&format!(
        r#"
        SELECT {BORROW_COLUMNS}
        FROM borrows
        WHERE is_overdue = FALSE AND returned_at IS NULL AND return_by < $1
        ORDER BY return_by ASC
        "#
    ))
    .bind(now)
    .fetch_all(pool)
    .await
}

/// Mark a single open loan overdue.
pub async fn mark_overdue(pool: &PgPool, borrow_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE borrows SET is_overdue = TRUE WHERE id = $1")
        .bind(borrow_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Total and overdue borrow counts for one member, over their whole history.
pub async fn count_borrows(
    pool: &PgPool,
    member_id: Uuid,
) -> Result<(i64, i64), sqlx::Error> {
    let (total, overdue): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE is_overdue)
        FROM borrows
        WHERE member_id = $1
        "#,
    )
    .bind(member_id)
    .fetch_one(pool)
    .await?;

    Ok((total, overdue))
}
