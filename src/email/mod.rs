pub mod templates;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Outbound mail for account notifications, sent through the configured relay.
pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| format!("Invalid CATALOG_SMTP_FROM '{}': {e}", config.from))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP relay {}: {e}", config.host))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        Ok(Self { transport, from })
    }

    /// Mail the recovery link to the account owner.
    pub async fn send_password_recover(
        &self,
        to_email: &str,
        recover_url: &str,
        minutes: i64,
    ) -> Result<(), String> {
        let body = MultiPart::alternative_plain_html(
            templates::render_password_recover_text(recover_url, minutes),
            templates::render_password_recover(recover_url, minutes),
        );
        self.deliver(to_email, "Password recovery", body).await
    }

    async fn deliver(&self, to_email: &str, subject: &str, body: MultiPart) -> Result<(), String> {
        let to: Mailbox = to_email
            .parse()
            .map_err(|e| format!("Invalid recipient '{to_email}': {e}"))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(body)
            .map_err(|e| format!("Could not build message: {e}"))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| format!("SMTP delivery to {to_email} failed: {e}"))
    }
}
