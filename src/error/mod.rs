//! Application error types.
//!
//! Every user-visible failure maps to exactly one `AppError` variant so
//! callers (and tests) can distinguish which precondition failed. The
//! `conversion` module turns errors into JSON HTTP responses.

mod conversion;
mod types;

pub use types::{AppError, AppResult};
