/**
 * Catalog Database Operations
 *
 * Query functions for authors, branches, books and branch inventory.
 * Deletions cascade as an explicit ordered sequence inside one
 * transaction instead of relying on the database to fan out.
 */
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::catalog::{Author, Book, Branch, BranchInventory};

// -- authors ----------------------------------------------------------------

pub async fn create_author(
    pool: &PgPool,
    name: &str,
    email: &str,
    biography: &str,
) -> Result<Author, sqlx::Error> {
    sqlx::query_as::<_, Author>(
        r#"
        INSERT INTO authors (name, email, biography)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, biography
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(biography)
    .fetch_one(pool)
    .await
}

pub async fn find_author_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Author>, sqlx::Error> {
    sqlx::query_as::<_, Author>("SELECT id, name, email, biography FROM authors WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_author_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Author>, sqlx::Error> {
    sqlx::query_as::<_, Author>(
        "SELECT id, name, email, biography FROM authors WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Delete an author and everything hanging off them.
///
/// Ordered fan-out in one transaction: chat messages and borrows of the
/// author's books, then the inventory rows, the books, and finally the
/// author. Returns false when the author did not exist.
pub async fn delete_author_cascade(pool: &PgPool, author_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM chat_messages WHERE book_id IN (SELECT id FROM books WHERE author_id = $1)",
    )
    .bind(author_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM borrows WHERE book_id IN (SELECT id FROM books WHERE author_id = $1)",
    )
    .bind(author_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM branch_inventory WHERE book_id IN (SELECT id FROM books WHERE author_id = $1)",
    )
    .bind(author_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM books WHERE author_id = $1")
        .bind(author_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM authors WHERE id = $1")
        .bind(author_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}

// -- branches ---------------------------------------------------------------

pub async fn create_branch(
    pool: &PgPool,
    branch_name: &str,
    location: &str,
) -> Result<Branch, sqlx::Error> {
    sqlx::query_as::<_, Branch>(
        r#"
        INSERT INTO branches (branch_name, location)
        VALUES ($1, $2)
        RETURNING id, branch_name, location
        "#,
    )
    .bind(branch_name)
    .bind(location)
    .fetch_one(pool)
    .await
}

pub async fn list_branches(pool: &PgPool) -> Result<Vec<Branch>, sqlx::Error> {
    sqlx::query_as::<_, Branch>(
        "SELECT id, branch_name, location FROM branches ORDER BY branch_name",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_branch_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Branch>, sqlx::Error> {
    sqlx::query_as::<_, Branch>("SELECT id, branch_name, location FROM branches WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_branch_by_name(
    pool: &PgPool,
    branch_name: &str,
) -> Result<Option<Branch>, sqlx::Error> {
    sqlx::query_as::<_, Branch>(
        "SELECT id, branch_name, location FROM branches WHERE branch_name = $1",
    )
    .bind(branch_name)
    .fetch_optional(pool)
    .await
}

// -- books ------------------------------------------------------------------

const BOOK_COLUMNS: &str = "id, title, isbn, genre, min_age, author_id, is_published, created_at";

/// Takes any executor so the approval workflow can create the book inside
/// its decision transaction.
pub async fn create_book<'e>(
    executor: impl PgExecutor<'e>,
    title: &str,
    isbn: &str,
    genre: &str,
    min_age: i32,
    author_id: Uuid,
) -> Result<Book, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!(
        r#"
        INSERT INTO books (title, isbn, genre, min_age, author_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {BOOK_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(isbn)
    .bind(genre)
    .bind(min_age)
    .bind(author_id)
    .fetch_one(executor)
    .await
}

pub async fn find_book_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_book_by_isbn(pool: &PgPool, isbn: &str) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = $1"))
        .bind(isbn)
        .fetch_optional(pool)
        .await
}

pub async fn list_books(pool: &PgPool) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE is_published ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn update_book(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    genre: &str,
    min_age: i32,
    is_published: bool,
) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!(
        r#"
        UPDATE books
        SET title = $1, genre = $2, min_age = $3, is_published = $4
        WHERE id = $5
        RETURNING {BOOK_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(genre)
    .bind(min_age)
    .bind(is_published)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Delete a book with the same explicit fan-out as the author cascade.
pub async fn delete_book_cascade(pool: &PgPool, book_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM chat_messages WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM borrows WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM branch_inventory WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}

// -- inventory --------------------------------------------------------------

/// Create or restock the `(branch, book)` inventory row.
///
/// Restocking adds copies to both counters so outstanding loans keep the
/// 0 ≤ available ≤ total invariant intact.
pub async fn upsert_inventory(
    pool: &PgPool,
    branch_id: Uuid,
    book_id: Uuid,
    copies: i32,
    borrowable_days: i32,
) -> Result<BranchInventory, sqlx::Error> {
    sqlx::query_as::<_, BranchInventory>(
        r#"
        INSERT INTO branch_inventory
            (branch_id, book_id, total_copies, available_copies, borrowable_days)
        VALUES ($1, $2, $3, $3, $4)
        ON CONFLICT (branch_id, book_id) DO UPDATE SET
            total_copies = branch_inventory.total_copies + EXCLUDED.total_copies,
            available_copies = branch_inventory.available_copies + EXCLUDED.total_copies,
            borrowable_days = EXCLUDED.borrowable_days
        RETURNING id, branch_id, book_id, total_copies, available_copies, borrowable_days
        "#,
    )
    .bind(branch_id)
    .bind(book_id)
    .bind(copies)
    .bind(borrowable_days)
    .fetch_one(pool)
    .await
}

pub async fn list_inventory_for_branch(
    pool: &PgPool,
    branch_id: Uuid,
) -> Result<Vec<BranchInventory>, sqlx::Error> {
    sqlx::query_as::<_, BranchInventory>(
        r#"
        SELECT id, branch_id, book_id, total_copies, available_copies, borrowable_days
        FROM branch_inventory
        WHERE branch_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(branch_id)
    .fetch_all(pool)
    .await
}
