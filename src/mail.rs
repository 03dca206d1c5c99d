use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::data_models::{Applicant, Internship, SiteSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

/// Build the transport the configuration asks for.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if config.enabled {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        tracing::warn!("MAIL_ENABLED is off, outgoing mail will only be logged");
        Ok(Arc::new(LogMailer))
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .with_context(|| format!("Invalid SMTP relay {}", config.server))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            sender: config.default_sender.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let message = Message::builder()
            .from(
                self.sender
                    .parse::<Mailbox>()
                    .context("Invalid sender address")?,
            )
            .to(email
                .to
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient address {}", email.to))?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .context("Failed to build email")?;

        self.transport
            .send(message)
            .await
            .with_context(|| format!("SMTP delivery to {} failed", email.to))?;
        tracing::info!(to = %email.to, "Email sent");
        Ok(())
    }
}

/// Logs instead of delivering. Used when SMTP is switched off.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Mail delivery disabled, not sending"
        );
        Ok(())
    }
}

/// Keeps every message in memory. Handy for tests.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mail outbox poisoned"))?
            .push(email);
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn application_confirmation(
    applicant: &Applicant,
    internship: &Internship,
    settings: &SiteSettings,
) -> OutgoingEmail {
    let html = format!(
        "<h2>Thank you for applying, {name}!</h2>\
         <p>We have received your application for <strong>{title}</strong> ({location} &bull; {location_type}).</p>\
         <p>Our team will review it and get back to you soon.</p>\
         <p>Regards,<br>{company}</p>",
        name = escape_html(&applicant.full_name),
        title = escape_html(&internship.title),
        location = escape_html(&internship.location),
        location_type = escape_html(&internship.location_type),
        company = escape_html(&settings.company_name),
    );
    OutgoingEmail {
        to: applicant.email.clone(),
        subject: format!("Application Received - {}", internship.title),
        html,
    }
}

pub fn custom_email(
    recipient: &Applicant,
    subject: &str,
    message_body: &str,
    settings: &SiteSettings,
) -> OutgoingEmail {
    let paragraphs: String = message_body
        .lines()
        .map(|line| format!("{}<br>", escape_html(line)))
        .collect();
    let html = format!(
        "<p>Dear {name},</p><p>{paragraphs}</p><p>Regards,<br>{company}</p>",
        name = escape_html(&recipient.full_name),
        company = escape_html(&settings.company_name),
    );
    OutgoingEmail {
        to: recipient.email.clone(),
        subject: subject.to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixtures() -> (Applicant, Internship, SiteSettings) {
        let internship = Internship::new(
            "Data <Analyst>".to_string(),
            "data-analyst".to_string(),
            "desc".to_string(),
            "sql".to_string(),
            "Remote".to_string(),
            "remote".to_string(),
            NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
        );
        let applicant = Applicant::new(
            internship.id,
            "Asha Rao".to_string(),
            "asha@example.com".to_string(),
            "555-0100".to_string(),
            "cv.pdf".to_string(),
        );
        (applicant, internship, SiteSettings::default())
    }

    #[test]
    fn test_confirmation_escapes_and_addresses() {
        let (applicant, internship, settings) = fixtures();
        let email = application_confirmation(&applicant, &internship, &settings);
        assert_eq!(email.to, "asha@example.com");
        assert_eq!(email.subject, "Application Received - Data <Analyst>");
        assert!(email.html.contains("Data &lt;Analyst&gt;"));
        assert!(email.html.contains("Asha Rao"));
    }

    #[test]
    fn test_custom_email_keeps_line_breaks() {
        let (applicant, _, settings) = fixtures();
        let email = custom_email(&applicant, "Interview", "Hi\nSee you <soon>", &settings);
        assert!(email.html.contains("Hi<br>See you &lt;soon&gt;<br>"));
        assert_eq!(email.subject, "Interview");
    }

    #[tokio::test]
    async fn test_memory_mailer_records() -> Result<()> {
        let mailer = MemoryMailer::default();
        mailer
            .send(OutgoingEmail {
                to: "a@b.c".to_string(),
                subject: "s".to_string(),
                html: "h".to_string(),
            })
            .await?;
        assert_eq!(mailer.sent().len(), 1);
        Ok(())
    }
}
