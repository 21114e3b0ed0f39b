use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use super::{MediaSource, SearchResult};
use crate::{MashupError, Result};

/// YouTube search and audio download using yt-dlp
pub struct YtDlpSource {
    yt_dlp_path: String,
}

impl YtDlpSource {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    /// Run yt-dlp and return stdout, or its stderr as the error
    async fn run(&self, args: &[&str]) -> std::result::Result<Vec<u8>, String> {
        tracing::debug!("{} {}", self.yt_dlp_path, args.join(" "));

        let output = Command::new(&self.yt_dlp_path)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| format!("could not start {}: {}", self.yt_dlp_path, e))?;

        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }

        Ok(output.stdout)
    }
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

/// Parse `--dump-json` output, one JSON object per line
pub fn parse_search_output(stdout: &str) -> Vec<SearchResult> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) => search_result_from_json(&value),
            Err(e) => {
                tracing::debug!("Ignoring unparsable search line: {}", e);
                None
            }
        })
        .collect()
}

fn search_result_from_json(info: &Value) -> Option<SearchResult> {
    let id = info["id"].as_str()?.to_string();

    let url = info["webpage_url"]
        .as_str()
        .or_else(|| info["url"].as_str())
        .and_then(|u| Url::parse(u).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", id));

    Some(SearchResult {
        title: info["title"].as_str().unwrap_or_default().to_string(),
        url,
        duration: info["duration"].as_f64(),
        is_live: info["live_status"].as_str() == Some("is_live")
            || info["is_live"].as_bool().unwrap_or(false),
        id,
    })
}

fn is_missing_format(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("requested format is not available") || lower.contains("no audio")
}

#[async_trait]
impl MediaSource for YtDlpSource {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>> {
        let target = format!("ytsearch{}:{}", limit, query);
        let stdout = self
            .run(&["--flat-playlist", "--dump-json", "--no-warnings", target.as_str()])
            .await
            .map_err(|stderr| anyhow::anyhow!("yt-dlp search failed: {}", stderr))?;

        let results = parse_search_output(&String::from_utf8_lossy(&stdout));
        tracing::info!("Search for '{}' returned {} results", query, results.len());

        Ok(results)
    }

    async fn fetch_audio(&self, result: &SearchResult, dest: &Path) -> Result<PathBuf> {
        if result.is_live {
            return Err(MashupError::NoAudioStream(format!("{} is a live stream", result.url)).into());
        }

        let dest_str = dest.to_string_lossy().into_owned();
        match self
            .run(&[
                "--format",
                "bestaudio",
                "--no-playlist",
                "--no-part",
                "--output",
                dest_str.as_str(),
                result.url.as_str(),
            ])
            .await
        {
            Ok(_) => {}
            Err(stderr) if is_missing_format(&stderr) => {
                return Err(MashupError::NoAudioStream(result.url.clone()).into());
            }
            Err(stderr) => {
                return Err(MashupError::ToolFailed {
                    tool: "yt-dlp".to_string(),
                    message: stderr,
                }
                .into());
            }
        }

        if !dest.exists() {
            anyhow::bail!("yt-dlp reported success but {} was not written", dest.display());
        }

        Ok(dest.to_path_buf())
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_output() {
        let stdout = concat!(
            r#"{"id":"abc123","title":"First Song","url":"https://www.youtube.com/watch?v=abc123","duration":212.0}"#,
            "\n",
            "not json\n",
            r#"{"id":"live1","title":"Live now","live_status":"is_live"}"#,
            "\n",
            r#"{"title":"missing id"}"#,
            "\n",
        );

        let results = parse_search_output(stdout);
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].id, "abc123");
        assert_eq!(results[0].title, "First Song");
        assert_eq!(results[0].duration, Some(212.0));
        assert!(!results[0].is_live);

        assert_eq!(results[1].url, "https://www.youtube.com/watch?v=live1");
        assert!(results[1].is_live);
    }

    #[test]
    fn test_missing_format_detection() {
        assert!(is_missing_format("ERROR: [youtube] x: Requested format is not available"));
        assert!(!is_missing_format("ERROR: unable to download webpage"));
    }

    #[tokio::test]
    async fn test_live_results_are_not_fetched() {
        let source = YtDlpSource::new("yt-dlp-binary-that-does-not-exist");
        let result = SearchResult {
            id: "live1".to_string(),
            title: "Live".to_string(),
            url: "https://www.youtube.com/watch?v=live1".to_string(),
            duration: None,
            is_live: true,
        };

        let err = source
            .fetch_audio(&result, Path::new("raw_0.media"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MashupError>(),
            Some(MashupError::NoAudioStream(_))
        ));
    }

    #[tokio::test]
    async fn test_search_surfaces_spawn_failure() {
        let source = YtDlpSource::new("yt-dlp-binary-that-does-not-exist");
        let err = source.search("Test", 5).await.unwrap_err();
        assert!(err.to_string().contains("yt-dlp search failed"));
    }
}
