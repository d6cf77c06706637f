/**
 * Server Configuration
 *
 * Loads the PostgreSQL pool from DATABASE_URL and runs migrations at
 * startup. Unlike optional services (the mailer), the database is
 * mandatory: the borrow ledger cannot run without durable state, so a
 * missing or unreachable database is a startup error.
 */
use sqlx::PgPool;

/// Connect to the database and bring the schema up to date.
///
/// # Errors
///
/// Fails when DATABASE_URL is unset, the connection cannot be
/// established, or migrations fail.
pub async fn load_database() -> Result<PgPool, Box<dyn std::error::Error>> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL is not set; the server requires a PostgreSQL database")?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations completed");

    Ok(pool)
}

/// Port to bind, from SERVER_PORT (default 3000).
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        // SERVER_PORT is unset in the test environment.
        if std::env::var("SERVER_PORT").is_err() {
            assert_eq!(server_port(), 3000);
        }
    }
}
