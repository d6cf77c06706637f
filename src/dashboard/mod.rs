//! Dashboard analytics endpoint.

pub mod handlers;
