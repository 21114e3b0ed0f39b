use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External programs
    pub tools: ToolsConfig,

    /// Audio processing settings
    pub audio: AudioConfig,

    /// Application settings
    pub app: AppConfig,

    /// Outbound mail settings
    pub mail: MailConfig,

    /// Web form settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable
    pub yt_dlp: String,

    /// ffmpeg executable
    pub ffmpeg: String,

    /// ffprobe executable
    pub ffprobe: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// MP3 bitrate passed to ffmpeg
    pub bitrate: String,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Search results requested per wanted item, so skipped results can be replaced
    pub search_overfetch: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for per-run working directories (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// SMTP relay host
    pub smtp_host: String,

    /// SMTP relay port (STARTTLS)
    pub smtp_port: u16,

    /// Subject of the delivery message
    pub subject: String,

    /// Plain-text body of the delivery message
    pub body: String,

    /// File name of the attached archive
    pub archive_name: String,

    /// Name of the mashup inside the working directory and the archive
    pub output_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening address
    pub host: String,

    /// Listening port, overridden by `PORT`
    pub port: u16,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bitrate: "192k".to_string(),
            sample_rate: 44100,
            search_overfetch: 2,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            subject: "Your Mashup".to_string(),
            body: "Mashup attached.".to_string(),
            archive_name: "mashup.zip".to_string(),
            output_name: "mashup.mp3".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                let content = fs_err::read_to_string(&path)
                    .context("Failed to read config file")?;
                let config = Self::from_yaml(&content)?;
                tracing::debug!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            _ => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("mashup-creator").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.audio.search_overfetch == 0 {
            anyhow::bail!("audio.search_overfetch must be at least 1");
        }

        if self.audio.bitrate.trim().is_empty() {
            anyhow::bail!("audio.bitrate must not be empty");
        }

        if !self.mail.output_name.ends_with(crate::OUTPUT_EXTENSION) {
            anyhow::bail!(
                "mail.output_name must end with {}",
                crate::OUTPUT_EXTENSION
            );
        }

        for (name, value) in [
            ("tools.yt_dlp", &self.tools.yt_dlp),
            ("tools.ffmpeg", &self.tools.ffmpeg),
            ("tools.ffprobe", &self.tools.ffprobe),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        Ok(())
    }
}
