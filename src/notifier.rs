// src/notifier.rs
use crate::config::EmailSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::BTreeSet;
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Discovery report dispatch.
///
/// Delivery is best-effort: the orchestrator logs a failure and still merges
/// the discovered names into the baseline, since re-notifying the same names
/// every cycle is worse than losing one report.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, domain: &str, new_subdomains: &BTreeSet<String>) -> Result<()>;
}

/// E-mail notifier over an authenticated STARTTLS SMTP session
pub struct EmailNotifier {
    settings: EmailSettings,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings) -> Result<Self> {
        let creds = Credentials::new(
            settings.sender_email.clone(),
            settings.sender_password.clone(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)
            .context("Failed to create SMTP transport")?
            .port(settings.smtp_port)
            .credentials(creds)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { settings, mailer })
    }
}

#[async_trait]
impl Notify for EmailNotifier {
    async fn notify(&self, domain: &str, new_subdomains: &BTreeSet<String>) -> Result<()> {
        let (subject, body) = render_report(domain, new_subdomains);

        let email = Message::builder()
            .from(
                format!("Subdomain Monitor <{}>", self.settings.sender_email)
                    .parse()
                    .context("Failed to parse sender address")?,
            )
            .to(self
                .settings
                .receiver_email
                .parse()
                .context("Failed to parse receiver address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("Failed to build email")?;

        self.mailer
            .send(email)
            .await
            .context("Failed to send email")?;

        Ok(())
    }
}

/// Build the report subject and plain-text body.
///
/// The body leads with a summary count and lists the names sorted
/// lexicographically, one per line.
pub fn render_report(domain: &str, new_subdomains: &BTreeSet<String>) -> (String, String) {
    let subject = format!("New subdomains for {}", domain);

    let mut body = format!(
        "Monitoring detected {} new subdomain(s) for {}:\n\n",
        new_subdomains.len(),
        domain
    );
    // BTreeSet iterates in lexicographic order
    for name in new_subdomains {
        body.push_str(name);
        body.push('\n');
    }

    (subject, body)
}
