//! Outbound email notifications.

mod mailer;

pub use mailer::Mailer;
