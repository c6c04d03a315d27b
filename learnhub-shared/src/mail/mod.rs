/// Outbound mail
///
/// Handlers send mail through the [`Mailer`] trait so the transport can be
/// swapped without touching them. The only transport shipped is
/// [`LogMailer`], which writes each message to the log instead of delivering
/// it; no mail credentials are read or stored. Reset tokens are masked before
/// a body reaches the log.
///
/// # Example
///
/// ```no_run
/// use learnhub_shared::mail::{password_reset_email, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = LogMailer::new("no-reply@learnhub.local");
/// let email = password_reset_email("asha@example.com", "Asha", "rst_abc", 60);
/// mailer.send(email).await?;
/// # Ok(())
/// # }
/// ```

use crate::auth::reset_token::TOKEN_PREFIX;
use async_trait::async_trait;
use std::sync::Mutex;

/// Mail delivery errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),
}

/// A message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Logs messages instead of delivering them
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        validate_recipient(&email.to)?;

        tracing::info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            "Outgoing email (not delivered)"
        );
        tracing::debug!(body = %redact_body(&email.body), "Outgoing email body");
        Ok(())
    }
}

/// Keeps every message in memory; used by tests to read back reset tokens
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        validate_recipient(&email.to)?;

        self.sent
            .lock()
            .map_err(|_| MailError::Transport("mailbox lock poisoned".to_string()))?
            .push(email);
        Ok(())
    }
}

/// Replaces every reset token in `body` with a masked placeholder
pub fn redact_body(body: &str) -> String {
    body.split_inclusive(char::is_whitespace)
        .map(|word| {
            let trimmed = word.trim_end();
            if trimmed.starts_with(TOKEN_PREFIX) {
                format!("{}[redacted]{}", TOKEN_PREFIX, &word[trimmed.len()..])
            } else {
                word.to_string()
            }
        })
        .collect()
}

fn validate_recipient(to: &str) -> Result<(), MailError> {
    let valid = matches!(
        to.split_once('@'),
        Some((local, domain)) if !local.is_empty() && domain.contains('.')
    );

    if valid {
        Ok(())
    } else {
        Err(MailError::InvalidRecipient(to.to_string()))
    }
}

/// Builds the password reset message carrying the raw token
pub fn password_reset_email(to: &str, name: &str, token: &str, ttl_minutes: i64) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your LearnHub password".to_string(),
        body: format!(
            "Hello {},\n\n\
             We received a request to reset your password. Use the token below \
             within {} minutes:\n\n{}\n\n\
             If you did not ask for this, you can ignore this message.\n",
            name, ttl_minutes, token
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_valid_recipient() {
        let mailer = LogMailer::new("no-reply@learnhub.local");
        let email = password_reset_email("asha@example.com", "Asha", "rst_token", 60);
        assert!(mailer.send(email).await.is_ok());
        assert_eq!(mailer.from_address(), "no-reply@learnhub.local");
    }

    #[tokio::test]
    async fn test_rejects_invalid_recipient() {
        let mailer = LogMailer::new("no-reply@learnhub.local");
        for to in ["", "asha", "@example.com", "asha@localhost"] {
            let email = password_reset_email(to, "Asha", "rst_token", 60);
            assert!(matches!(
                mailer.send(email).await,
                Err(MailError::InvalidRecipient(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        mailer
            .send(password_reset_email("asha@example.com", "Asha", "rst_one", 60))
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "asha@example.com");
        assert!(sent[0].body.contains("rst_one"));
    }

    #[test]
    fn test_redact_body_masks_reset_token() {
        let email = password_reset_email("asha@example.com", "Asha", "rst_SecretValue123", 60);
        let redacted = redact_body(&email.body);

        assert!(!redacted.contains("SecretValue123"));
        assert!(redacted.contains("rst_[redacted]\n"));
        assert!(redacted.starts_with("Hello Asha,"));
        assert_eq!(redact_body("no tokens here"), "no tokens here");
    }

    #[test]
    fn test_password_reset_email_content() {
        let email = password_reset_email("asha@example.com", "Asha", "rst_abc", 30);
        assert!(email.body.starts_with("Hello Asha,"));
        assert!(email.body.contains("within 30 minutes"));
        assert!(email.body.contains("rst_abc"));
    }
}
