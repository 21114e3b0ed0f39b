use indicatif::ProgressBar;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub mod stages;
pub mod workdir;

pub use stages::{AudioClip, FetchedItem, SkipReason, Stage, StageReport, TrimmedClip};
pub use workdir::WorkDir;

use crate::audio::{FfmpegTranscoder, Transcoder};
use crate::config::Config;
use crate::delivery::{Delivered, Delivery};
use crate::sources::{MediaSource, YtDlpSource};
use crate::validate::RunParams;
use crate::{utils, MashupError, Result};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Validating,
    Fetching,
    Transcoding,
    Trimming,
    Merging,
    Delivering,
    Cleaned,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Validating => "validating",
            RunState::Fetching => "fetching",
            RunState::Transcoding => "transcoding",
            RunState::Trimming => "trimming",
            RunState::Merging => "merging",
            RunState::Delivering => "delivering",
            RunState::Cleaned => "cleaned",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Items asked for
    pub requested: u32,
    pub fetched: usize,
    pub transcoded: usize,
    pub trimmed: usize,

    /// Every item dropped along the way
    pub skipped: Vec<SkipReason>,

    /// Sum of the trimmed clip lengths in seconds
    pub total_seconds: f64,

    pub delivered: Delivered,

    /// False if the working directory could not be removed
    pub cleaned_up: bool,

    pub final_state: RunState,
}

/// Sequences fetch, transcode, trim, merge and delivery for one run at a time
pub struct MashupPipeline {
    source: Arc<dyn MediaSource>,
    transcoder: Arc<dyn Transcoder>,
    search_overfetch: u32,
    temp_root: Option<PathBuf>,
    show_progress: bool,
}

impl MashupPipeline {
    pub fn new(source: Arc<dyn MediaSource>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            source,
            transcoder,
            search_overfetch: 2,
            temp_root: None,
            show_progress: false,
        }
    }

    /// Pipeline backed by yt-dlp and ffmpeg as configured
    pub fn from_config(config: &Config) -> Self {
        let source = Arc::new(YtDlpSource::new(config.tools.yt_dlp.clone()));
        let transcoder = Arc::new(FfmpegTranscoder::new(&config.tools, &config.audio));

        Self::new(source, transcoder)
            .with_search_overfetch(config.audio.search_overfetch)
            .with_temp_root(config.app.temp_dir.clone())
    }

    pub fn with_search_overfetch(mut self, factor: u32) -> Self {
        self.search_overfetch = factor.max(1);
        self
    }

    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp_root = root;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Validate raw parameters, then run. Invalid input never reaches the network.
    pub async fn validate_and_run(
        &self,
        artist: &str,
        count: &str,
        clip_seconds: &str,
        output: &str,
        delivery: &dyn Delivery,
    ) -> Result<RunReport> {
        tracing::debug!(state = %RunState::Validating, "Validating inputs");
        let params = RunParams::parse(artist, count, clip_seconds, output)?;
        self.run(&params, delivery).await
    }

    /// Run every stage for already validated parameters.
    ///
    /// The working directory is removed exactly once, whatever the outcome.
    pub async fn run(&self, params: &RunParams, delivery: &dyn Delivery) -> Result<RunReport> {
        let workdir = WorkDir::create(self.temp_root.as_deref())?;
        let mut state = RunState::Validating;

        let outcome = self.run_stages(params, delivery, &workdir, &mut state).await;
        if let Err(e) = &outcome {
            tracing::error!(failed_in = %state, "Run failed: {:#}", e);
            enter(&mut state, RunState::Failed);
        }

        let cleaned_up = workdir.close();

        match outcome {
            Ok(mut report) => {
                enter(&mut state, RunState::Cleaned);
                report.cleaned_up = cleaned_up;
                report.final_state = state;
                Ok(report)
            }
            Err(e) => Err(e),
        }
    }

    async fn run_stages(
        &self,
        params: &RunParams,
        delivery: &dyn Delivery,
        workdir: &WorkDir,
        state: &mut RunState,
    ) -> Result<RunReport> {
        let mut skipped = Vec::new();

        enter(state, RunState::Fetching);
        tracing::info!(
            "[1/4] Searching for {} videos on {}...",
            params.artist,
            self.source.platform_name()
        );
        let progress = self.progress("[1/4]");
        let fetch = stages::fetch_items(
            self.source.as_ref(),
            &params.artist,
            params.count,
            self.search_overfetch,
            workdir,
            &progress,
        )
        .await;
        progress.finish_and_clear();
        let fetch = fetch?;
        skipped.extend(fetch.skipped);
        if fetch.outputs.is_empty() {
            return Err(MashupError::NothingFetched.into());
        }
        let fetched = fetch.outputs.len();

        enter(state, RunState::Transcoding);
        tracing::info!("[2/4] Converting videos to audio...");
        let progress = self.progress("[2/4]");
        let transcode =
            stages::transcode_all(self.transcoder.as_ref(), &fetch.outputs, workdir, &progress).await;
        progress.finish_and_clear();
        skipped.extend(transcode.skipped);
        if transcode.outputs.is_empty() {
            return Err(MashupError::NothingTranscoded.into());
        }

        enter(state, RunState::Trimming);
        tracing::info!("[3/4] Cutting first {} seconds from each audio...", params.clip_seconds);
        let progress = self.progress("[3/4]");
        let trim = stages::trim_all(
            self.transcoder.as_ref(),
            &transcode.outputs,
            params.clip_seconds,
            workdir,
            &progress,
        )
        .await;
        progress.finish_and_clear();
        skipped.extend(trim.skipped);
        if trim.outputs.is_empty() {
            return Err(MashupError::NothingTrimmed.into());
        }

        enter(state, RunState::Merging);
        tracing::info!("[4/4] Merging {} audio clips into mashup...", trim.outputs.len());
        let artifact = delivery.artifact_path(params, workdir);
        stages::concatenate(self.transcoder.as_ref(), &trim.outputs, &artifact).await?;
        tracing::info!("Mashup created: {}", artifact.display());

        enter(state, RunState::Delivering);
        let delivered = delivery.deliver(&artifact, workdir).await?;
        tracing::info!("Delivered via {}", delivery.name());

        Ok(RunReport {
            requested: params.count,
            fetched,
            transcoded: transcode.outputs.len(),
            trimmed: trim.outputs.len(),
            total_seconds: trim.outputs.iter().map(|clip| clip.seconds).sum(),
            skipped,
            delivered,
            cleaned_up: false,
            final_state: *state,
        })
    }

    fn progress(&self, prefix: &'static str) -> ProgressBar {
        utils::stage_progress(self.show_progress, prefix)
    }
}

fn enter(state: &mut RunState, next: RunState) {
    tracing::debug!(from = %state, to = %next, "Run state change");
    *state = next;
}
