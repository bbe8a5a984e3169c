//! Parsing and normalization of provider observation times.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

/// Native format of Open-Meteo `current.time` values, e.g. `2024-01-01T12:00`
pub const OBSERVATION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const OBSERVATION_TIME_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("unparsable observation time {raw:?}: {reason}")]
    Unparsable { raw: String, reason: String },
    #[error("invalid UTC offset {0} seconds")]
    InvalidOffset(i32),
    #[error("local time {0} does not exist in {1}")]
    NonexistentLocalTime(NaiveDateTime, Tz),
}

/// Parse a raw provider timestamp and express it in `canonical`.
///
/// With `utc_offset_seconds` the raw value is local time at that offset.
/// Without it the raw value is taken as local time in `canonical` itself.
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
pub fn normalize(
    raw: &str,
    utc_offset_seconds: Option<i32>,
    canonical: Tz,
) -> Result<DateTime<FixedOffset>, TimestampError> {
    let naive = parse_naive(raw)?;

    let instant = match utc_offset_seconds {
        Some(seconds) => {
            let offset =
                FixedOffset::east_opt(seconds).ok_or(TimestampError::InvalidOffset(seconds))?;
            offset
                .from_local_datetime(&naive)
                .single()
                .ok_or(TimestampError::InvalidOffset(seconds))?
                .with_timezone(&canonical)
        }
        None => canonical
            .from_local_datetime(&naive)
            .earliest()
            .ok_or(TimestampError::NonexistentLocalTime(naive, canonical))?,
    };

    let offset = instant.offset().fix();
    Ok(instant.with_timezone(&offset))
}

fn parse_naive(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, OBSERVATION_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, OBSERVATION_TIME_FORMAT_SECONDS))
        .map_err(|e| TimestampError::Unparsable {
            raw: raw.to_string(),
            reason: e.to_string(),
        })
}
