//! SMTP notifier mailing the full report as JSON

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use crate::{
    config::EmailConfig,
    errors::{BotError, BotResult},
    notify::Notifier,
    types::TradeReport,
};

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Implicit TLS relay. Addresses are checked here so a typo disables the
    /// notifier at startup instead of failing every report.
    pub fn new(config: EmailConfig) -> BotResult<Self> {
        let from = parse_mailbox("EMAIL_ADDR", &config.address)?;
        let to = parse_mailbox("RECIPIENT", &config.recipient)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| BotError::Config(format!("SMTP relay {}: {}", config.smtp_host, e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.address.clone(), config.password.clone()))
            .timeout(Some(Duration::from_secs(20)))
            .build();

        Ok(Self { mailer, from, to })
    }

    pub fn subject(report: &TradeReport) -> String {
        format!("Trade Report: {}", report.timestamp.format("%d/%m/%Y, %H:%M:%S"))
    }

    pub fn body(report: &TradeReport) -> BotResult<String> {
        serde_json::to_string_pretty(report).map_err(|e| BotError::DataParsing {
            context: "trade report".to_string(),
            source: Some(e.into()),
        })
    }

    pub fn build_message(&self, report: &TradeReport) -> BotResult<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(Self::subject(report))
            .header(ContentType::TEXT_PLAIN)
            .body(Self::body(report)?)
            .map_err(|e| BotError::DataParsing {
                context: "report email".to_string(),
                source: Some(e.into()),
            })
    }
}

fn parse_mailbox(key: &str, raw: &str) -> BotResult<Mailbox> {
    raw.trim()
        .parse()
        .map_err(|e| BotError::Config(format!("{} is not a valid email address: {}", key, e)))
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, report: &TradeReport) -> BotResult<()> {
        let message = self.build_message(report)?;
        self.mailer.send(message).await.map_err(|e| BotError::Network {
            message: "SMTP delivery failed".to_string(),
            source: Some(e.into()),
        })?;
        Ok(())
    }
}
