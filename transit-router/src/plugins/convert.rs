//! Helpers shared by the plugins' response conversions.

use chrono::{DateTime, FixedOffset};

use super::PluginError;

/// Error converting a backend response into domain types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    #[error("utc offset out of range: {0} s")]
    InvalidOffset(i32),

    #[error("invalid polyline: {0}")]
    InvalidPolyline(String),

    /// A reference to a stop or leg that isn't in the response
    #[error("index {index} out of range for {what}")]
    OutOfRange { what: &'static str, index: usize },

    #[error("itinerary without legs")]
    EmptyItinerary,
}

impl From<ConversionError> for PluginError {
    fn from(err: ConversionError) -> Self {
        PluginError::json(err)
    }
}

/// Builds a timestamp from milliseconds since the epoch, shown in the
/// given UTC offset.
pub fn datetime_from_millis(
    millis: i64,
    offset_secs: i32,
) -> Result<DateTime<FixedOffset>, ConversionError> {
    let offset =
        FixedOffset::east_opt(offset_secs).ok_or(ConversionError::InvalidOffset(offset_secs))?;
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or(ConversionError::InvalidTimestamp(millis))
}

/// Keeps `color` only if it is a six digit hex RGB string.
pub fn valid_hex_color(color: Option<String>) -> Option<String> {
    color.filter(|c| c.len() == 6 && c.chars().all(|ch| ch.is_ascii_hexdigit()))
}

/// Treats an empty string as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn millis_in_offset() {
        // 2024-03-15 09:00:00 UTC
        let dt = datetime_from_millis(1_710_493_200_000, 3600).unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.offset().local_minus_utc(), 3600);
        assert_eq!(
            dt,
            FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 3, 15, 9, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn rejects_bad_offset() {
        assert_eq!(
            datetime_from_millis(0, 90_000),
            Err(ConversionError::InvalidOffset(90_000))
        );
    }

    #[test]
    fn hex_colors() {
        assert_eq!(valid_hex_color(Some("00aaFF".into())), Some("00aaFF".into()));
        assert_eq!(valid_hex_color(Some("#00aaff".into())), None);
        assert_eq!(valid_hex_color(Some("00aafg".into())), None);
        assert_eq!(valid_hex_color(Some("fff".into())), None);
        assert_eq!(valid_hex_color(None), None);
    }
}
