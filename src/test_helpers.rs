//! Fakes for the external-service traits.
//!
//! A fake "media file" is a text file holding its length in seconds, so
//! durations survive transcode, trim and concat and can be asserted on.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::audio::Transcoder;
use crate::pipeline::MashupPipeline;
use crate::sources::{MediaSource, SearchResult};
use crate::{MashupError, Result};

/// How a fake video behaves when pushed through the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeOutcome {
    Good,
    NoAudio,
    Corrupt,
    Unprobeable,
}

#[derive(Debug, Clone)]
pub struct FakeVideo {
    pub id: String,
    pub seconds: f64,
    pub outcome: FakeOutcome,
}

impl FakeVideo {
    pub fn good(id: &str, seconds: f64) -> Self {
        Self {
            id: id.to_string(),
            seconds,
            outcome: FakeOutcome::Good,
        }
    }

    pub fn with(id: &str, outcome: FakeOutcome) -> Self {
        Self {
            id: id.to_string(),
            seconds: 180.0,
            outcome,
        }
    }
}

/// `n` videos that all succeed, each `seconds` long
pub fn good_videos(n: usize, seconds: f64) -> Vec<FakeVideo> {
    (0..n)
        .map(|i| FakeVideo::good(&format!("vid{}", i), seconds))
        .collect()
}

#[derive(Default)]
pub struct FakeSource {
    videos: Vec<FakeVideo>,
    search_error: bool,
    pub search_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(videos: Vec<FakeVideo>) -> Self {
        Self {
            videos,
            ..Default::default()
        }
    }

    pub fn failing_search() -> Self {
        Self {
            search_error: true,
            ..Default::default()
        }
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.search_error {
            anyhow::bail!("index unreachable");
        }

        Ok(self
            .videos
            .iter()
            .take(limit as usize)
            .map(|video| SearchResult {
                id: video.id.clone(),
                title: format!("{} - {}", query, video.id),
                url: format!("https://www.youtube.com/watch?v={}", video.id),
                duration: Some(video.seconds),
                is_live: false,
            })
            .collect())
    }

    async fn fetch_audio(&self, result: &SearchResult, dest: &Path) -> Result<PathBuf> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let video = self
            .videos
            .iter()
            .find(|video| video.id == result.id)
            .ok_or_else(|| anyhow::anyhow!("unknown video {}", result.id))?;

        let content = match video.outcome {
            FakeOutcome::NoAudio => {
                return Err(MashupError::NoAudioStream(result.url.clone()).into())
            }
            FakeOutcome::Corrupt => "corrupt".to_string(),
            FakeOutcome::Unprobeable => "unprobeable".to_string(),
            FakeOutcome::Good => video.seconds.to_string(),
        };

        fs_err::write(dest, content)?;
        Ok(dest.to_path_buf())
    }

    fn platform_name(&self) -> &'static str {
        "Fake"
    }
}

fn read_seconds(path: &Path) -> Result<f64> {
    let content = fs_err::read_to_string(path)?;
    content
        .trim()
        .parse::<f64>()
        .map_err(|_| anyhow::anyhow!("cannot decode {}", path.display()))
}

#[derive(Default)]
pub struct FakeTranscoder;

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn to_audio(&self, raw: &Path, dest: &Path) -> Result<()> {
        let content = fs_err::read_to_string(raw)?;
        if content == "corrupt" {
            anyhow::bail!("invalid data found when processing input");
        }
        fs_err::write(dest, content)?;
        Ok(())
    }

    async fn duration(&self, path: &Path) -> Result<f64> {
        read_seconds(path)
    }

    async fn trim(&self, src: &Path, dest: &Path, seconds: f64) -> Result<()> {
        let length = read_seconds(src)?;
        fs_err::write(dest, length.min(seconds).to_string())?;
        Ok(())
    }

    async fn concat(&self, clips: &[PathBuf], output: &Path) -> Result<()> {
        let mut total = 0.0;
        for clip in clips {
            total += read_seconds(clip)?;
        }
        fs_err::write(output, total.to_string())?;
        Ok(())
    }
}

/// Pipeline over the fakes with working directories under `temp_root`
pub fn fake_pipeline(source: Arc<FakeSource>, temp_root: &Path) -> MashupPipeline {
    MashupPipeline::new(source, Arc::new(FakeTranscoder))
        .with_temp_root(Some(temp_root.to_path_buf()))
}

/// Read back a fake audio file's length
pub fn fake_length(path: &Path) -> f64 {
    read_seconds(path).unwrap_or(f64::NAN)
}

/// Entries left under a temp root
pub fn leftover_entries(root: &Path) -> usize {
    std::fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
}
