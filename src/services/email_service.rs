use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;
use crate::error::AppError;

fn build_message(smtp: &SmtpConfig, to: &str, code: &str) -> Result<Message, AppError> {
    let from = smtp
        .from
        .parse()
        .map_err(|e| AppError::Config(format!("EMAIL_FROM is not a mailbox: {e}")))?;
    let to = to
        .parse()
        .map_err(|e| AppError::bad_request(format!("Invalid email address: {e}")))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject("Verify your ConnectO email")
        .body(format!("Your ConnectO verification code is: {code}"))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Mails the verification code. With no SMTP configured the code is only
/// logged, which is what local development relies on.
pub async fn send_verification_email(
    smtp: Option<SmtpConfig>,
    to: String,
    code: String,
) -> Result<(), AppError> {
    let smtp = match smtp {
        Some(smtp) => smtp,
        None => {
            log::info!("SMTP not configured; verification code for {} is {}", to, code);
            return Ok(());
        }
    };

    let message = build_message(&smtp, &to, &code)?;

    // lettre's SmtpTransport is blocking.
    tokio::task::spawn_blocking(move || {
        let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
        let mailer = SmtpTransport::starttls_relay(&smtp.server)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .port(smtp.port)
            .credentials(creds)
            .build();

        mailer
            .send(&message)
            .map(|_| log::info!("verification email sent to {}", to))
            .map_err(|e| AppError::Internal(format!("failed to send email to {to}: {e}")))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            server: "smtp.example.com".into(),
            port: 587,
            username: "user".into(),
            password: "pass".into(),
            from: "ConnectO <no-reply@example.com>".into(),
        }
    }

    #[test]
    fn message_carries_the_code() {
        let message = build_message(&smtp(), "asha@example.com", "ABC123").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("ABC123"));
    }

    #[test]
    fn bad_recipient_is_a_client_error() {
        assert!(matches!(
            build_message(&smtp(), "not an address", "ABC123"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn unconfigured_smtp_is_not_an_error() {
        assert!(send_verification_email(None, "a@b.c".into(), "X".into())
            .await
            .is_ok());
    }
}
