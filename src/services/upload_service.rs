use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::error::AppError;
use crate::models::message::{Attachment, MAX_ATTACHMENT_BYTES};

/// Public URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads/messages";

/// Keeps the extension of the client's name and nothing else from it.
fn stored_name(original_name: &str, now: DateTime<Utc>) -> String {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut bytes);
    let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();

    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}-{}{}", now.timestamp_millis(), suffix, ext)
}

/// Names the public handler will serve: a single path segment that is not
/// hidden. Anything else could reach outside the upload directory.
pub fn is_servable_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.starts_with('.')
}

pub fn check_size(size: u64) -> Result<(), AppError> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(AppError::bad_request("File too large. Maximum size is 10MB"));
    }
    Ok(())
}

/// Writes an attachment under `<upload_dir>/messages/` and returns its record.
pub async fn store_attachment(
    upload_dir: &str,
    original_name: &str,
    mimetype: &str,
    bytes: &[u8],
    now: DateTime<Utc>,
) -> Result<Attachment, AppError> {
    if bytes.is_empty() {
        return Err(AppError::bad_request("No file uploaded"));
    }
    check_size(bytes.len() as u64)?;

    let dir: PathBuf = Path::new(upload_dir).join("messages");
    tokio::fs::create_dir_all(&dir).await?;

    let filename = stored_name(original_name, now);
    tokio::fs::write(dir.join(&filename), bytes).await?;
    log::info!("stored attachment {} ({} bytes)", filename, bytes.len());

    Ok(Attachment {
        url: format!("{PUBLIC_PREFIX}/{filename}"),
        filename,
        original_name: original_name.to_string(),
        mimetype: mimetype.to_string(),
        size: bytes.len() as u64,
        uploaded_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timestamp;

    #[test]
    fn stored_names_drop_client_paths() {
        let name = stored_name("../../etc/passwd", timestamp::now());
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));

        let name = stored_name("Invoice.PDF", timestamp::now());
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn only_plain_names_are_served() {
        assert!(is_servable_name("1700000000000-a1b2c3.png"));
        assert!(!is_servable_name(".."));
        assert!(!is_servable_name(".env"));
        assert!(!is_servable_name("../config.toml"));
        assert!(!is_servable_name("..\\config.toml"));
        assert!(!is_servable_name(""));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_size(MAX_ATTACHMENT_BYTES).is_ok());
        assert!(check_size(MAX_ATTACHMENT_BYTES + 1).is_err());
    }

    #[tokio::test]
    async fn attachments_land_in_the_messages_dir() {
        let dir = std::env::temp_dir().join(format!("connecto-upload-{}", std::process::id()));
        let dir_str = dir.to_string_lossy().to_string();
        let attachment = store_attachment(&dir_str, "notes.txt", "text/plain", b"hello", timestamp::now())
            .await
            .unwrap();

        assert_eq!(attachment.size, 5);
        assert!(attachment.url.starts_with(PUBLIC_PREFIX));
        let written = tokio::fs::read(dir.join("messages").join(&attachment.filename))
            .await
            .unwrap();
        assert_eq!(written, b"hello");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
