//! Schedule input parsing
//!
//! Turns human schedule input into the `(date, time)` string pair a
//! scheduled record stores. Accepts explicit "YYYY-MM-DD HH:MM", relative
//! durations like "2h", and natural language like "tomorrow 9am".

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::error::{LinkloomError, Result};

/// Parse a schedule string into `(YYYY-MM-DD, HH:MM)`.
///
/// # Errors
///
/// Returns `InvalidInput` if the string is empty or matches no supported
/// format.
pub fn parse_schedule(input: &str) -> Result<(String, String)> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LinkloomError::InvalidInput(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    // Explicit date and time first, since the natural-language parser is
    // looser about what it accepts.
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(split(dt.and_utc()));
    }

    if let Ok(duration) = parse_duration(input) {
        return Ok(split(Utc::now() + duration));
    }

    if let Ok(dt) = chrono_english::parse_date_string(input, Utc::now(), chrono_english::Dialect::Us)
    {
        return Ok(split(dt));
    }

    Err(LinkloomError::InvalidInput(format!(
        "Could not parse schedule string: {}",
        input
    )))
}

fn parse_duration(input: &str) -> std::result::Result<Duration, ()> {
    let std_duration = humantime::parse_duration(input).map_err(|_| ())?;
    Duration::try_seconds(std_duration.as_secs() as i64).ok_or(())
}

fn split(dt: DateTime<Utc>) -> (String, String) {
    (dt.format("%Y-%m-%d").to_string(), dt.format("%H:%M").to_string())
}
