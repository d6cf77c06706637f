/**
 * Email Notifier
 *
 * Fire-and-forget SMTP delivery via lettre. Configuration comes from the
 * EMAIL_HOST / EMAIL_PORT / EMAIL_USER / EMAIL_PASS environment variables;
 * when they are absent the mailer is disabled and sends become logged
 * no-ops, the same way the rest of the server treats optional services.
 *
 * Delivery failures are logged and swallowed: no business operation is
 * ever rolled back because an email did not go out.
 */
use lettre::message::{header::ContentType, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl Mailer {
    /// Build the mailer from environment configuration.
    ///
    /// Returns a disabled mailer when EMAIL_HOST is unset or the transport
    /// cannot be built; the server keeps running without notifications.
    pub fn from_env() -> Self {
        let Ok(host) = std::env::var("EMAIL_HOST") else {
            tracing::warn!("EMAIL_HOST not set. Email notifications will be disabled.");
            return Self::disabled();
        };

        let port = std::env::var("EMAIL_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(587);

        let mut builder =
            match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host) {
                Ok(builder) => builder.port(port),
                Err(e) => {
                    tracing::error!("Failed to build SMTP transport: {e:?}");
                    return Self::disabled();
                }
            };

        let user = std::env::var("EMAIL_USER").ok();
        if let (Some(user), Ok(pass)) = (user.clone(), std::env::var("EMAIL_PASS")) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        let from = user
            .as_deref()
            .and_then(|u| format!("Library Service <{u}>").parse::<Mailbox>().ok());
        let Some(from) = from else {
            tracing::warn!("EMAIL_USER missing or invalid. Email notifications will be disabled.");
            return Self::disabled();
        };

        tracing::info!("Email notifications enabled via {host}:{port}");
        Self {
            transport: Some(builder.build()),
            from: Some(from),
        }
    }

    /// A mailer that logs instead of sending. Also used by tests.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send an email, best effort.
    ///
    /// Every failure path logs and returns; callers never see an error.
    pub async fn send_email(&self, to: &str, subject: &str, text: &str, html: Option<&str>) {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::debug!("Mailer disabled; dropping email to {to} ({subject})");
            return;
        };

        let Ok(to_mailbox) = to.parse::<Mailbox>() else {
            tracing::warn!("Invalid recipient address {to}; dropping email");
            return;
        };

        let builder = Message::builder()
            .from(from.clone())
            .to(to_mailbox)
            .subject(subject);

        let message = match html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.to_string()),
        };

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to build email to {to}: {e:?}");
                return;
            }
        };

        match transport.send(message).await {
            Ok(_) => tracing::info!("Email sent to {to} with subject: {subject}"),
            Err(e) => tracing::warn!("Failed to send email to {to}: {e:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_swallows_sends() {
        let mailer = Mailer::disabled();
        assert!(!mailer.is_enabled());
        // Must not panic or error.
        mailer
            .send_email("author@example.com", "subject", "text", None)
            .await;
    }
}
