use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::info;

use super::message::build_verification_email;
use super::Mailer;
use crate::config::MailConfig;
use crate::error::Result;

/// Mailer sending through a STARTTLS SMTP relay with the bot's credentials
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let credentials = Credentials::new(config.from_address.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_code(&self, to: &str, pin: &str) -> Result<()> {
        let message = build_verification_email(&self.from_address, to, pin)?;
        self.transport.send(message).await?;
        info!("Sent verification code to {}", to);
        Ok(())
    }
}
