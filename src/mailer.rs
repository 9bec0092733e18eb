use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::AppConfig;

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Sends a single mail with every recipient on the blind-carbon-copy
    /// list. The visible recipient is the sending account itself.
    async fn send_bulk(&self, subject: &str, body: &str, bcc: &[String]) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .context("invalid SMTP relay host")?
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();
        let from: Mailbox = config
            .mail_from
            .parse()
            .context("MAIL_FROM is not a valid mailbox")?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_bulk(&self, subject: &str, body: &str, bcc: &[String]) -> Result<()> {
        if bcc.is_empty() {
            return Ok(());
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.from.clone())
            .subject(subject);
        for address in bcc {
            let mailbox: Mailbox = address
                .parse()
                .with_context(|| format!("invalid recipient address: {address}"))?;
            builder = builder.bcc(mailbox);
        }

        let email = builder
            .body(body.to_string())
            .context("failed to build mail")?;

        self.transport
            .send(email)
            .await
            .context("failed to send mail")?;
        Ok(())
    }
}
