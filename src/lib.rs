//! Mashup Creator - build an audio mashup from the top YouTube results for an artist
//!
//! The library searches for an artist, downloads the audio of the first N results,
//! transcodes and trims every clip, concatenates them into one MP3 and hands the
//! result to a delivery adapter (local file or zipped email attachment).

pub mod audio;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod pipeline;
pub mod sources;
pub mod utils;
pub mod validate;
pub mod web;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cli::{Cli, ServeArgs};
pub use config::Config;
pub use delivery::{Delivery, EmailDelivery, LocalDelivery, Mailer, SmtpMailer};
pub use pipeline::{MashupPipeline, RunReport, RunState};
pub use sources::{MediaSource, SearchResult};
pub use audio::Transcoder;
pub use validate::{validate_inputs, RunParams};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Extension every output artifact must carry
pub const OUTPUT_EXTENSION: &str = ".mp3";

/// Error types specific to the mashup pipeline
#[derive(thiserror::Error, Debug)]
pub enum MashupError {
    #[error("Invalid inputs detected: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    #[error("Invalid Email")]
    InvalidEmail,

    #[error("Error searching for videos: {0}")]
    SearchFailed(String),

    #[error("No audio stream available: {0}")]
    NoAudioStream(String),

    #[error("No videos were downloaded successfully")]
    NothingFetched,

    #[error("No audio files were created")]
    NothingTranscoded,

    #[error("No audio files were cut successfully")]
    NothingTrimmed,

    #[error("Error merging audio files: {0}")]
    MergeFailed(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },
}
