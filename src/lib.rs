//! Libris - Library Management Backend
//!
//! Libris is a library-management backend built with Rust, covering the
//! full borrow/return lifecycle plus a real-time chat layer for book
//! discussion rooms.
//!
//! # Module Structure
//!
//! - **`auth`** - signup, login and JWT session tokens
//! - **`members`** - member accounts, roles and return-rate tracking
//! - **`catalog`** - authors, branches, books and branch inventory
//! - **`submissions`** - author book requests and editorial approval
//! - **`reviews`** - member book reviews
//! - **`borrowing`** - the borrow/return engine and the overdue sweeper
//! - **`chat`** - WebSocket book rooms, presence and message history
//! - **`notify`** - outbound email notifications
//! - **`dashboard`** - aggregate statistics for administrators
//! - **`server`** - application state, configuration and initialization
//! - **`routes`** - HTTP route table
//! - **`middleware`** - request authentication
//! - **`error`** - the application error type and response mapping
//!
//! # Usage
//!
//! ```rust,no_run
//! use libris::server::init::create_app;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app().await?;
//! // Serve `app` with Axum
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod borrowing;
pub mod catalog;
pub mod chat;
pub mod dashboard;
pub mod error;
pub mod members;
pub mod middleware;
pub mod notify;
pub mod reviews;
pub mod routes;
pub mod server;
pub mod submissions;
