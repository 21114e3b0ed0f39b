use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;

use crate::Result;

/// Audio codec operations the pipeline needs
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Decode any media file and encode it as MP3 at `dest`
    async fn to_audio(&self, raw: &Path, dest: &Path) -> Result<()>;

    /// Length of an audio file in seconds
    async fn duration(&self, path: &Path) -> Result<f64>;

    /// Write the first `seconds` of `src` to `dest`
    async fn trim(&self, src: &Path, dest: &Path, seconds: f64) -> Result<()>;

    /// Join `clips` end to end into `output`, without gaps or crossfades
    async fn concat(&self, clips: &[PathBuf], output: &Path) -> Result<()>;
}
