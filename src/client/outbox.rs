use futures::future::try_join_all;

use super::{ClientError, MessagingApi, Notice};
use crate::models::message::{
    resolve_content, Message, MessageKind, SendMessageRequest, MAX_ATTACHMENT_BYTES,
};

/// A file picked for upload, held in memory until the message is sent.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub mimetype: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Default)]
pub struct FileSelection {
    pub files: Vec<PendingFile>,
    pub warnings: Vec<Notice>,
}

/// Drops files over the attachment limit, with one warning per file.
pub fn select_files(picked: Vec<PendingFile>) -> FileSelection {
    let mut selection = FileSelection::default();
    for file in picked {
        if file.size() > MAX_ATTACHMENT_BYTES {
            selection.warnings.push(Notice::Warning(format!(
                "{} is too large. Max size is 10MB.",
                file.name
            )));
        } else {
            selection.files.push(file);
        }
    }
    selection
}

/// Uploads every file concurrently, then creates the message. Nothing is
/// sent if any upload fails.
pub async fn send_message<A: MessagingApi + ?Sized>(
    api: &A,
    receiver_id: &str,
    text: &str,
    files: &[PendingFile],
) -> Result<Message, ClientError> {
    let content = resolve_content(text, files.len())
        .ok_or_else(|| ClientError::Invalid("Type a message or attach a file".into()))?;

    let attachments = try_join_all(files.iter().map(|f| api.upload(f))).await?;
    let request = SendMessageRequest {
        receiver_id: receiver_id.to_string(),
        content,
        kind: MessageKind::Text,
        attachments,
    };
    api.send(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> PendingFile {
        PendingFile {
            name: name.into(),
            mimetype: "application/pdf".into(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn oversized_files_are_dropped_with_a_warning() {
        let limit = MAX_ATTACHMENT_BYTES as usize;
        let selection = select_files(vec![
            file("ok.pdf", limit),
            file("huge.pdf", limit + 1),
        ]);
        assert_eq!(selection.files.len(), 1);
        assert_eq!(selection.files[0].name, "ok.pdf");
        assert_eq!(
            selection.warnings,
            vec![Notice::Warning("huge.pdf is too large. Max size is 10MB.".into())]
        );
    }
}
