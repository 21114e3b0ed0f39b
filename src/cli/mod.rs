use clap::Parser;

/// Usage line printed after argument and validation errors
pub const USAGE: &str =
    "Usage: mashup <SingerName> <NumberOfVideos> <AudioDuration> <OutputFileName>";

#[derive(Parser, Debug)]
#[command(
    name = "mashup",
    about = "Mashup Creator - Stitch the opening seconds of an artist's top YouTube results into one MP3",
    version,
    long_about = "Searches YouTube for an artist, downloads the audio of the first N results, cuts the first Y seconds of each and merges them into a single MP3 file."
)]
pub struct Cli {
    /// Artist to search for
    #[arg(value_name = "SingerName")]
    pub singer: String,

    /// Number of videos to use (more than 10)
    #[arg(value_name = "NumberOfVideos", allow_hyphen_values = true)]
    pub videos: String,

    /// Seconds to keep from each video (at least 20)
    #[arg(value_name = "AudioDuration", allow_hyphen_values = true)]
    pub duration: String,

    /// Output file, must end in .mp3
    #[arg(value_name = "OutputFileName")]
    pub output: String,
}

/// Settings for the web form server, read from the environment
#[derive(Parser, Debug)]
#[command(
    name = "mashup-web",
    about = "Mashup Creator web form - builds a mashup and emails it as a zip attachment",
    version
)]
pub struct ServeArgs {
    /// Port to listen on (falls back to the configured port)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Account used to log in to the mail relay and as the sender address
    #[arg(long, env = "MAIL_USERNAME")]
    pub mail_username: String,

    /// Password for the mail account
    #[arg(long, env = "MAIL_PASSWORD", hide_env_values = true)]
    pub mail_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments_stay_raw() {
        let cli = Cli::try_parse_from(["mashup", "Sharry Maan", "-3", "abc", "out.mp3"]).unwrap();
        assert_eq!(cli.singer, "Sharry Maan");
        assert_eq!(cli.videos, "-3");
        assert_eq!(cli.duration, "abc");
        assert_eq!(cli.output, "out.mp3");
    }

    #[test]
    fn test_wrong_argument_count_is_rejected() {
        assert!(Cli::try_parse_from(["mashup", "Test", "11", "20"]).is_err());
        assert!(Cli::try_parse_from(["mashup", "Test", "11", "20", "a.mp3", "extra"]).is_err());
    }

    #[test]
    fn test_serve_args_from_flags() {
        let args = ServeArgs::try_parse_from([
            "mashup-web",
            "--port",
            "8080",
            "--mail-username",
            "sender@example.com",
            "--mail-password",
            "secret",
        ])
        .unwrap();
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.mail_username, "sender@example.com");
    }
}
