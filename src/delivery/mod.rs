use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod email;
pub mod mailer;

pub use email::{pack_single_entry, EmailDelivery};
pub use mailer::{Mailer, MailAttachment, OutboundMessage, SmtpMailer};

use crate::pipeline::WorkDir;
use crate::validate::RunParams;
use crate::Result;

/// What happened to the output artifact
#[derive(Debug, Clone, PartialEq)]
pub enum Delivered {
    /// Left on disk for the caller
    Local(PathBuf),

    /// Zipped and mailed; the file itself is gone with the working directory
    Emailed { recipient: String, archive_bytes: u64 },
}

/// Final stage of a run: decides where the mashup is written and what happens to it
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Where the concatenator should write the mashup
    fn artifact_path(&self, params: &RunParams, workdir: &WorkDir) -> PathBuf;

    /// Hand the finished artifact over
    async fn deliver(&self, artifact: &Path, workdir: &WorkDir) -> Result<Delivered>;

    fn name(&self) -> &'static str;
}

/// CLI delivery: the mashup stays where the user asked for it
#[derive(Debug, Default, Clone)]
pub struct LocalDelivery;

#[async_trait]
impl Delivery for LocalDelivery {
    fn artifact_path(&self, params: &RunParams, _workdir: &WorkDir) -> PathBuf {
        PathBuf::from(&params.output)
    }

    async fn deliver(&self, artifact: &Path, _workdir: &WorkDir) -> Result<Delivered> {
        crate::utils::check_file_accessible(artifact)?;
        Ok(Delivered::Local(artifact.to_path_buf()))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
