//! Request processing middleware.

pub mod auth;
