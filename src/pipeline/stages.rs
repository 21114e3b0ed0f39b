//! Best-effort batch stages.
//!
//! Every stage takes the full output of the previous one and returns a
//! [`StageReport`]: the items that made it through plus a [`SkipReason`] for
//! each item that did not. Deciding whether an empty report is fatal is left
//! to the orchestrator.

use indicatif::ProgressBar;
use std::fmt;
use std::path::{Path, PathBuf};

use super::workdir::WorkDir;
use crate::audio::Transcoder;
use crate::sources::MediaSource;
use crate::{MashupError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Transcode,
    Trim,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Transcode => write!(f, "transcode"),
            Stage::Trim => write!(f, "trim"),
        }
    }
}

/// Why a single item was dropped
#[derive(Debug, Clone, PartialEq)]
pub struct SkipReason {
    pub stage: Stage,

    /// Position of the item in the stage's input
    pub index: usize,

    /// Title or file name, for display
    pub label: String,

    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct StageReport<T> {
    pub outputs: Vec<T>,
    pub skipped: Vec<SkipReason>,
}

impl<T> Default for StageReport<T> {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> StageReport<T> {
    fn skip(&mut self, stage: Stage, index: usize, label: &str, error: &anyhow::Error) {
        tracing::warn!(%stage, index, label, "Skipping item: {:#}", error);
        self.skipped.push(SkipReason {
            stage,
            index,
            label: label.to_string(),
            reason: format!("{:#}", error),
        });
    }
}

/// A downloaded raw media file
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedItem {
    /// Source index, 0..N-1 in fetch order
    pub index: usize,
    pub title: String,
    pub path: PathBuf,
}

/// An MP3 derived from a fetched item
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub index: usize,
    pub path: PathBuf,
}

/// A clip cut to its final length
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedClip {
    pub index: usize,
    pub path: PathBuf,
    pub seconds: f64,
}

/// Search for `artist` and download audio until `count` items succeed or results run out
pub async fn fetch_items(
    source: &dyn MediaSource,
    artist: &str,
    count: u32,
    overfetch: u32,
    workdir: &WorkDir,
    progress: &ProgressBar,
) -> Result<StageReport<FetchedItem>> {
    let limit = count.saturating_mul(overfetch.max(1));
    let results = source
        .search(artist, limit)
        .await
        .map_err(|e| MashupError::SearchFailed(format!("{:#}", e)))?;

    let wanted = count as usize;
    let mut report = StageReport::default();
    progress.set_length(count as u64);

    for (rank, result) in results.iter().enumerate() {
        if report.outputs.len() >= wanted {
            break;
        }

        let index = report.outputs.len();
        progress.set_message(format!(
            "Downloading video {}/{}: {}",
            index + 1,
            count,
            result.label()
        ));

        let dest = workdir.file(&format!("raw_{}.media", index));
        match source.fetch_audio(result, &dest).await {
            Ok(path) => {
                tracing::debug!("Downloaded {} to {}", result.url, path.display());
                report.outputs.push(FetchedItem {
                    index,
                    title: result.title.clone(),
                    path,
                });
                progress.inc(1);
            }
            Err(e) => {
                remove_partial(&dest);
                report.skip(Stage::Fetch, rank, result.label(), &e);
            }
        }
    }

    if report.outputs.len() < wanted {
        tracing::warn!(
            "Only {} videos were downloaded (requested {})",
            report.outputs.len(),
            count
        );
    }

    Ok(report)
}

/// Convert every fetched item to MP3
pub async fn transcode_all(
    transcoder: &dyn Transcoder,
    items: &[FetchedItem],
    workdir: &WorkDir,
    progress: &ProgressBar,
) -> StageReport<AudioClip> {
    let mut report = StageReport::default();
    progress.set_length(items.len() as u64);

    for (position, item) in items.iter().enumerate() {
        progress.set_message(format!("Converting {}/{}", position + 1, items.len()));

        let dest = workdir.file(&format!("audio_{}.mp3", item.index));
        match transcoder.to_audio(&item.path, &dest).await {
            Ok(()) => report.outputs.push(AudioClip {
                index: item.index,
                path: dest,
            }),
            Err(e) => {
                remove_partial(&dest);
                report.skip(Stage::Transcode, position, &item.title, &e);
            }
        }
        progress.inc(1);
    }

    report
}

/// Cut every clip to `min(seconds, clip length)`
pub async fn trim_all(
    transcoder: &dyn Transcoder,
    clips: &[AudioClip],
    seconds: u32,
    workdir: &WorkDir,
    progress: &ProgressBar,
) -> StageReport<TrimmedClip> {
    let mut report = StageReport::default();
    progress.set_length(clips.len() as u64);

    for (position, clip) in clips.iter().enumerate() {
        progress.set_message(format!("Processing {}/{}", position + 1, clips.len()));

        let dest = workdir.file(&format!("cut_{}.mp3", clip.index));
        match trim_one(transcoder, clip, f64::from(seconds), &dest).await {
            Ok(cut) => {
                tracing::debug!("Cut clip {} to {:.2} seconds", clip.index, cut);
                report.outputs.push(TrimmedClip {
                    index: clip.index,
                    path: dest,
                    seconds: cut,
                });
            }
            Err(e) => {
                remove_partial(&dest);
                report.skip(Stage::Trim, position, &file_label(&clip.path), &e);
            }
        }
        progress.inc(1);
    }

    report
}

async fn trim_one(
    transcoder: &dyn Transcoder,
    clip: &AudioClip,
    seconds: f64,
    dest: &Path,
) -> Result<f64> {
    let length = transcoder.duration(&clip.path).await?;
    let cut = seconds.min(length);
    if cut <= 0.0 {
        anyhow::bail!("clip has no audio");
    }

    transcoder.trim(&clip.path, dest, cut).await?;
    Ok(cut)
}

/// Join trimmed clips, in fetch order, into `output`
pub async fn concatenate(
    transcoder: &dyn Transcoder,
    clips: &[TrimmedClip],
    output: &Path,
) -> Result<()> {
    let mut ordered: Vec<&TrimmedClip> = clips.iter().collect();
    ordered.sort_by_key(|clip| clip.index);
    let paths: Vec<PathBuf> = ordered.iter().map(|clip| clip.path.clone()).collect();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)
            .map_err(|e| MashupError::MergeFailed(e.to_string()))?;
    }

    transcoder
        .concat(&paths, output)
        .await
        .map_err(|e| MashupError::MergeFailed(format!("{:#}", e)))?;

    Ok(())
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs_err::remove_file(path) {
            tracing::debug!("Could not remove partial file: {}", e);
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
