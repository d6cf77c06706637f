/**
 * Member Database Operations
 *
 * Plain query functions over the members table. The borrow engine and the
 * overdue sweeper go through `push_borrow_history` and `update_return_rate`;
 * nothing else writes those columns.
 */
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::members::Member;

const MEMBER_COLUMNS: &str = "id, name, email, password_hash, age, role, return_rate, \
     borrow_history, created_at, updated_at";

/// Create a new member
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `name` - Display name
/// * `email` - Email address (unique)
/// * `password_hash` - Hashed password
/// * `age` - Age in years, checked against each book's minimum age
///
/// # Returns
/// Created member or error
pub async fn create_member(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    age: i32,
) -> Result<Member, sqlx::Error> {
    let member = sqlx::query_as::<_, Member>(&format!(
        r#"
        INSERT INTO members (name, email, password_hash, age)
        VALUES ($1, $2, $3, $4)
        RETURNING {MEMBER_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(age)
    .fetch_one(pool)
    .await?;

    Ok(member)
}

/// Get member by id
pub async fn find_member_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Get member by email
pub async fn find_member_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Append a borrow record id to the member's ordered history.
///
/// Runs inside the borrow transaction so a failed borrow leaves no trace.
pub async fn push_borrow_history<'e>(
    executor: impl PgExecutor<'e>,
    member_id: Uuid,
    borrow_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE members
        SET borrow_history = array_append(borrow_history, $1), updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(borrow_id)
    .bind(member_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Persist a recomputed return rate for a member.
pub async fn update_return_rate(
    pool: &PgPool,
    member_id: Uuid,
    return_rate: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE members
        SET return_rate = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(return_rate)
    .bind(member_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Average return rate over all members (100 when there are none).
pub async fn average_return_rate(pool: &PgPool) -> Result<f64, sqlx::Error> {
    let avg: Option<f64> =
        sqlx::query_scalar("SELECT AVG(return_rate) FROM members WHERE role = 'member'")
            .fetch_one(pool)
            .await?;

    Ok(avg.unwrap_or(100.0))
}

/// List members with pagination and an optional name/email search.
pub async fn list_members(
    pool: &PgPool,
    page: i64,
    limit: i64,
    search: &str,
) -> Result<(Vec<Member>, i64), sqlx::Error> {
    let page = page.max(1);
    let limit = limit.max(1);
    let offset = (page - 1) * limit;
    let pattern = format!("%{search}%");

    let members = sqlx::query_as::<_, Member>(&format!(
        r#"
        SELECT {MEMBER_COLUMNS}
        FROM members
        WHERE role = 'member' AND (name ILIKE $1 OR email ILIKE $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM members WHERE role = 'member' AND (name ILIKE $1 OR email ILIKE $1)",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    Ok((members, total))
}
