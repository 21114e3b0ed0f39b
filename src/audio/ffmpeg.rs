use anyhow::Context;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::Transcoder;
use crate::config::{AudioConfig, ToolsConfig};
use crate::{MashupError, Result};

/// Transcoding, trimming and concatenation through ffmpeg/ffprobe
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    ffprobe_path: String,
    bitrate: String,
    sample_rate: u32,
}

impl FfmpegTranscoder {
    pub fn new(tools: &ToolsConfig, audio: &AudioConfig) -> Self {
        Self {
            ffmpeg_path: tools.ffmpeg.clone(),
            ffprobe_path: tools.ffprobe.clone(),
            bitrate: audio.bitrate.clone(),
            sample_rate: audio.sample_rate,
        }
    }

    /// Run ffmpeg with `args`, overwriting outputs and staying quiet
    async fn ffmpeg(&self, args: Vec<OsString>) -> Result<()> {
        tracing::debug!("{} {:?}", self.ffmpeg_path, args);

        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"])
            .args(&args)
            .output()
            .await
            .with_context(|| format!("Failed to start {}", self.ffmpeg_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(MashupError::ToolFailed {
                tool: "ffmpeg".to_string(),
                message: error.trim().to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// MP3 encoder arguments shared by every re-encoding step
    fn encoder_args(&self) -> Vec<OsString> {
        vec![
            "-vn".into(),
            "-acodec".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            self.bitrate.clone().into(),
            "-ar".into(),
            self.sample_rate.to_string().into(),
        ]
    }
}

/// Build the body of an ffmpeg concat-demuxer list file
pub fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| {
            // Single quotes inside a quoted entry are written as '\''
            let escaped = clip.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Read `format.duration` from ffprobe JSON output
pub fn parse_probe_duration(stdout: &[u8]) -> Result<f64> {
    let info: serde_json::Value = serde_json::from_slice(stdout)
        .context("Failed to parse ffprobe output")?;

    info["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| anyhow::anyhow!("ffprobe reported no duration"))
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn to_audio(&self, raw: &Path, dest: &Path) -> Result<()> {
        let mut args: Vec<OsString> = vec!["-i".into(), raw.into()];
        args.extend(self.encoder_args());
        args.push(dest.into());

        self.ffmpeg(args).await
    }

    async fn duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .await
            .with_context(|| format!("Failed to start {}", self.ffprobe_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(MashupError::ToolFailed {
                tool: "ffprobe".to_string(),
                message: error.trim().to_string(),
            }
            .into());
        }

        parse_probe_duration(&output.stdout)
    }

    async fn trim(&self, src: &Path, dest: &Path, seconds: f64) -> Result<()> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            src.into(),
            "-t".into(),
            format!("{:.3}", seconds).into(),
        ];
        args.extend(self.encoder_args());
        args.push(dest.into());

        self.ffmpeg(args).await
    }

    async fn concat(&self, clips: &[PathBuf], output: &Path) -> Result<()> {
        if clips.is_empty() {
            anyhow::bail!("Nothing to concatenate");
        }

        // The list file sits next to the first clip, inside the working directory
        let list_path = clips[0].with_file_name("concat.txt");
        fs_err::write(&list_path, concat_list(clips))?;

        let result = self
            .ffmpeg(vec![
                "-f".into(),
                "concat".into(),
                "-safe".into(),
                "0".into(),
                "-i".into(),
                list_path.clone().into(),
                "-c".into(),
                "copy".into(),
                output.into(),
            ])
            .await;

        if let Err(e) = fs_err::remove_file(&list_path) {
            tracing::debug!("Could not remove concat list: {}", e);
        }

        result
    }
}
