//! Outgoing mail. `SmtpMailer` talks to a relay through lettre; `LogMailer`
//! only writes the message to the log and is meant for local runs.

use async_trait::async_trait;
use domains::{Mailer, Result};
use tracing::{debug, info};

#[cfg(feature = "mail-smtp")]
pub use smtp::SmtpMailer;

#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!(to = %to, subject = %subject, "mail not sent (log mailer)");
        debug!(body = %body, "log mailer message body");
        Ok(())
    }
}

#[cfg(feature = "mail-smtp")]
mod smtp {
    use async_trait::async_trait;
    use domains::{DomainError, Mailer, Result};
    use lettre::message::header::ContentType;
    use lettre::message::Mailbox;
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
    use secrecy::{ExposeSecret, SecretString};
    use tracing::{debug, error};

    pub struct SmtpMailer {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    }

    impl SmtpMailer {
        /// Plain SMTP relay; credentials are only sent when `username` is set.
        pub fn new(
            host: &str,
            port: u16,
            username: Option<String>,
            password: &SecretString,
            from: &str,
        ) -> Result<Self> {
            let from: Mailbox = from
                .parse()
                .map_err(|e| DomainError::Validation(format!("bad sender address {from:?}: {e}")))?;

            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            if let Some(username) = username.filter(|u| !u.is_empty()) {
                builder = builder.credentials(Credentials::new(
                    username,
                    password.expose_secret().to_string(),
                ));
            }
            Ok(Self { transport: builder.build(), from })
        }
    }

    #[async_trait]
    impl Mailer for SmtpMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
            let to: Mailbox = to
                .parse()
                .map_err(|e| DomainError::Validation(format!("bad recipient address {to:?}: {e}")))?;
            let message = Message::builder()
                .from(self.from.clone())
                .to(to.clone())
                .subject(subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(DomainError::internal)?;

            self.transport.send(message).await.map_err(|e| {
                error!(to = %to, error = %e, "smtp delivery failed");
                DomainError::internal(e)
            })?;
            debug!(to = %to, "mail delivered");
            Ok(())
        }
    }

}
