use anyhow::Context;
use async_trait::async_trait;
use lettre::Address;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::write::FileOptions;
use zip::CompressionMethod;

use super::{Delivered, Delivery, MailAttachment, Mailer, OutboundMessage};
use crate::config::MailConfig;
use crate::pipeline::WorkDir;
use crate::validate::{validate_email, RunParams};
use crate::{MashupError, Result};

/// Web delivery: zip the mashup and mail it to the recipient
pub struct EmailDelivery {
    recipient: Address,
    mailer: Arc<dyn Mailer>,
    mail: MailConfig,
}

impl EmailDelivery {
    /// Fails with [`MashupError::InvalidEmail`] before any work is done
    pub fn new(recipient: &str, mailer: Arc<dyn Mailer>, mail: MailConfig) -> std::result::Result<Self, MashupError> {
        Ok(Self {
            recipient: validate_email(recipient)?,
            mailer,
            mail,
        })
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }
}

/// Write `src` into a new zip archive at `archive` as its only entry
pub fn pack_single_entry(src: &Path, archive: &Path, entry_name: &str) -> Result<u64> {
    let data = fs_err::read(src)?;

    let file = std::fs::File::create(archive)
        .with_context(|| format!("Failed to create archive {}", archive.display()))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(entry_name, options)?;
    writer.write_all(&data)?;
    writer.finish()?;

    Ok(fs_err::metadata(archive)?.len())
}

#[async_trait]
impl Delivery for EmailDelivery {
    fn artifact_path(&self, _params: &RunParams, workdir: &WorkDir) -> PathBuf {
        workdir.file(&self.mail.output_name)
    }

    async fn deliver(&self, artifact: &Path, workdir: &WorkDir) -> Result<Delivered> {
        let archive = workdir.file(&self.mail.archive_name);
        let archive_bytes = pack_single_entry(artifact, &archive, &self.mail.output_name)
            .map_err(|e| MashupError::DeliveryFailed(format!("{:#}", e)))?;

        let data = fs_err::read(&archive)?;
        let message = OutboundMessage {
            to: self.recipient.clone(),
            subject: self.mail.subject.clone(),
            body: self.mail.body.clone(),
            attachment: MailAttachment {
                filename: self.mail.archive_name.clone(),
                content_type: "application/zip".to_string(),
                data,
            },
        };

        self.mailer
            .send(message)
            .await
            .map_err(|e| MashupError::DeliveryFailed(format!("{:#}", e)))?;

        Ok(Delivered::Emailed {
            recipient: self.recipient.to_string(),
            archive_bytes,
        })
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::mailer::MockMailer;
    use std::io::Read;

    #[test]
    fn test_pack_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("mashup.mp3");
        fs_err::write(&src, b"ID3 fake mp3 payload").unwrap();

        let archive = dir.path().join("mashup.zip");
        let size = pack_single_entry(&src, &archive, "mashup.mp3").unwrap();
        assert!(size > 0);

        let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);

        let mut entry = zip.by_index(0).unwrap();
        assert_eq!(entry.name(), "mashup.mp3");
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"ID3 fake mp3 payload");
    }

    #[test]
    fn test_invalid_recipient_fails_fast() {
        let mailer = Arc::new(MockMailer::new());
        let result = EmailDelivery::new("not-an-email", mailer, MailConfig::default());
        assert!(matches!(result, Err(MashupError::InvalidEmail)));
    }

    #[tokio::test]
    async fn test_deliver_sends_zip_attachment() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|message| {
                message.to.to_string() == "fan@example.com"
                    && message.subject == "Your Mashup"
                    && message.attachment.filename == "mashup.zip"
                    && message.attachment.content_type == "application/zip"
                    && message.attachment.data.starts_with(b"PK")
            })
            .times(1)
            .returning(|_| Ok(()));

        let delivery =
            EmailDelivery::new("fan@example.com", Arc::new(mailer), MailConfig::default()).unwrap();
        let workdir = WorkDir::create(None).unwrap();
        let artifact = workdir.file("mashup.mp3");
        fs_err::write(&artifact, b"audio").unwrap();

        let delivered = delivery.deliver(&artifact, &workdir).await.unwrap();
        match delivered {
            Delivered::Emailed { recipient, archive_bytes } => {
                assert_eq!(recipient, "fan@example.com");
                assert!(archive_bytes > 0);
            }
            other => panic!("unexpected delivery {:?}", other),
        }
        assert!(workdir.file("mashup.zip").exists());
    }

    #[tokio::test]
    async fn test_transmission_failure_is_delivery_error() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let delivery =
            EmailDelivery::new("fan@example.com", Arc::new(mailer), MailConfig::default()).unwrap();
        let workdir = WorkDir::create(None).unwrap();
        let artifact = workdir.file("mashup.mp3");
        fs_err::write(&artifact, b"audio").unwrap();

        let err = delivery.deliver(&artifact, &workdir).await.unwrap_err();
        match err.downcast_ref::<MashupError>() {
            Some(MashupError::DeliveryFailed(message)) => {
                assert!(message.contains("connection refused"))
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
