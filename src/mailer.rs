use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::{config::SmtpConfig, error::MailError, models::Student};

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

/// Builds the certificate email for `student` around the rendered PDF.
pub fn certificate_mail(student: &Student, pdf: Vec<u8>) -> OutgoingMail {
    OutgoingMail {
        to: student.email.clone(),
        subject: format!("Your Certificate - {}", student.specialization),
        body: format!(
            "Dear {},\n\nPlease find attached your certificate for {}.\n\nBest regards,\n{}\n",
            student.full_name, student.specialization, student.institution
        ),
        attachment_name: format!("certificate_{}.pdf", student.certificate_id),
        attachment: pdf,
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = config
            .from_email
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", config.from_email, e)))?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        info!("SMTP relay {}:{} configured", config.host, config.port);
        Ok(Self { transport: builder.build(), from })
    }

    fn build(&self, mail: OutgoingMail) -> Result<Message, MailError> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", mail.to, e)))?;
        let pdf = ContentType::parse("application/pdf").map_err(|e| MailError::Build(e.to_string()))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(mail.body))
                    .singlepart(Attachment::new(mail.attachment_name).body(mail.attachment, pdf)),
            )
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = self.build(mail)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}

/// Used when no SMTP relay is configured: logs the message and reports success.
pub struct DemoMailer;

#[async_trait]
impl Mailer for DemoMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        warn!(
            "📭 Demo mode - not sending '{}' to {} ({} bytes attached as {})",
            mail.subject,
            mail.to,
            mail.attachment.len(),
            mail.attachment_name
        );
        Ok(())
    }
}
