use std::str::FromStr;

use lettre::Address;

use crate::{MashupError, OUTPUT_EXTENSION};

/// Smallest accepted number of videos (exclusive)
pub const MIN_ITEM_COUNT_EXCLUSIVE: u32 = 10;

/// Smallest accepted clip duration in seconds (inclusive)
pub const MIN_CLIP_SECONDS: u32 = 20;

/// Validated parameters for one mashup run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    /// Artist to search for
    pub artist: String,

    /// Number of items to fetch
    pub count: u32,

    /// Per-item clip length in seconds
    pub clip_seconds: u32,

    /// Output file name (always ends in `.mp3`)
    pub output: String,
}

impl RunParams {
    /// Validate raw string parameters and convert them to typed values.
    ///
    /// Every problem is reported at once; nothing is short-circuited.
    pub fn parse(
        artist: &str,
        count: &str,
        clip_seconds: &str,
        output: &str,
    ) -> Result<Self, MashupError> {
        let errors = validate_inputs(artist, count, clip_seconds, output);
        if !errors.is_empty() {
            return Err(MashupError::InvalidInput(errors));
        }

        // The validator already proved both values parse.
        match (count.trim().parse(), clip_seconds.trim().parse()) {
            (Ok(count), Ok(clip_seconds)) => Ok(Self {
                artist: artist.trim().to_string(),
                count,
                clip_seconds,
                output: output.trim().to_string(),
            }),
            _ => Err(MashupError::InvalidInput(vec![
                "Numeric parameters could not be read".to_string(),
            ])),
        }
    }
}

/// Validate all input parameters, returning every human-readable error found
pub fn validate_inputs(artist: &str, count: &str, clip_seconds: &str, output: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if artist.trim().is_empty() {
        errors.push("Singer name cannot be empty".to_string());
    }

    match count.trim().parse::<i64>() {
        Ok(n) if n <= i64::from(MIN_ITEM_COUNT_EXCLUSIVE) => {
            errors.push(format!(
                "Number of videos must be greater than {}",
                MIN_ITEM_COUNT_EXCLUSIVE
            ));
        }
        Ok(n) if n > i64::from(u32::MAX) => {
            errors.push("Number of videos is too large".to_string());
        }
        Ok(_) => {}
        Err(_) => errors.push("Number of videos must be a valid integer".to_string()),
    }

    match clip_seconds.trim().parse::<i64>() {
        Ok(n) if n < i64::from(MIN_CLIP_SECONDS) => {
            errors.push(format!(
                "Audio duration must be at least {} seconds",
                MIN_CLIP_SECONDS
            ));
        }
        Ok(n) if n > i64::from(u32::MAX) => {
            errors.push("Audio duration is too large".to_string());
        }
        Ok(_) => {}
        Err(_) => errors.push("Audio duration must be a valid integer".to_string()),
    }

    let output = output.trim();
    if output.is_empty() {
        errors.push("Output file name cannot be empty".to_string());
    } else if !output.ends_with(OUTPUT_EXTENSION) {
        errors.push(format!("Output file must have {} extension", OUTPUT_EXTENSION));
    }

    errors
}

/// Check a recipient address syntactically
pub fn validate_email(email: &str) -> Result<Address, MashupError> {
    Address::from_str(email.trim()).map_err(|_| MashupError::InvalidEmail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_inputs_have_no_errors() {
        assert!(validate_inputs("Test", "11", "20", "out.mp3").is_empty());
        assert!(validate_inputs("  Sharry Maan ", " 25 ", "45", "mix/out.mp3").is_empty());
    }

    #[test]
    fn test_each_rule_fails_independently() {
        assert_eq!(
            validate_inputs("   ", "11", "20", "out.mp3"),
            vec!["Singer name cannot be empty"]
        );
        assert_eq!(
            validate_inputs("Test", "10", "20", "out.mp3"),
            vec!["Number of videos must be greater than 10"]
        );
        assert_eq!(
            validate_inputs("Test", "eleven", "20", "out.mp3"),
            vec!["Number of videos must be a valid integer"]
        );
        assert_eq!(
            validate_inputs("Test", "11", "19", "out.mp3"),
            vec!["Audio duration must be at least 20 seconds"]
        );
        assert_eq!(
            validate_inputs("Test", "11", "2.5", "out.mp3"),
            vec!["Audio duration must be a valid integer"]
        );
        assert_eq!(
            validate_inputs("Test", "11", "20", ""),
            vec!["Output file name cannot be empty"]
        );
        assert_eq!(
            validate_inputs("Test", "11", "20", "out.wav"),
            vec!["Output file must have .mp3 extension"]
        );
    }

    #[test]
    fn test_errors_are_collected_not_short_circuited() {
        let errors = validate_inputs("", "3", "5", "out.ogg");
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_negative_numbers_are_rejected() {
        let errors = validate_inputs("Test", "-20", "-1", "out.mp3");
        assert_eq!(
            errors,
            vec![
                "Number of videos must be greater than 10",
                "Audio duration must be at least 20 seconds",
            ]
        );
    }

    #[test]
    fn test_run_params_parse() {
        let params = RunParams::parse(" Test ", "11", "20", "out.mp3").unwrap();
        assert_eq!(params.artist, "Test");
        assert_eq!(params.count, 11);
        assert_eq!(params.clip_seconds, 20);
        assert_eq!(params.output, "out.mp3");

        match RunParams::parse("", "1", "1", "x") {
            Err(MashupError::InvalidInput(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("someone@example.com").is_ok());
        assert!(matches!(
            validate_email("not-an-email"),
            Err(MashupError::InvalidEmail)
        ));
        assert!(validate_email("").is_err());
    }
}
