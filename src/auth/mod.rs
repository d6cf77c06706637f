//! Authentication: JWT session tokens and the signup/login/me handlers.

pub mod handlers;
pub mod sessions;
