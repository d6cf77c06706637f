/**
 * Library Server Entry Point
 *
 * Binary entry point for the library backend. Initializes tracing,
 * builds the Axum application and serves it.
 */
use std::net::SocketAddr;

use libris::server::config::server_port;
use libris::server::init::create_app;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let app = create_app().await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port()));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
