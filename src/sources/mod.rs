use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod youtube;

pub use youtube::YtDlpSource;

use crate::Result;

/// One entry of a search, in ranking order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Platform identifier of the video
    pub id: String,

    /// Title shown in progress output and logs
    pub title: String,

    /// Page URL handed back to the downloader
    pub url: String,

    /// Duration in seconds if the index reports one
    pub duration: Option<f64>,

    /// Live streams have no finished audio to fetch
    pub is_live: bool,
}

impl SearchResult {
    /// Short label for logs
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

/// Trait for searching a video platform and fetching audio-only streams
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Search for `query`, returning at most `limit` results in ranking order
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>>;

    /// Download the audio-only stream of `result` to `dest`, returning the written file
    async fn fetch_audio(&self, result: &SearchResult, dest: &Path) -> Result<PathBuf>;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}
