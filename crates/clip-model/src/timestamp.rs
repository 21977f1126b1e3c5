//! Recording timestamp keys.
//!
//! Clip groups are keyed by the recorder's timestamp string
//! (`YYYY-MM-DD_HH-MM-SS`). The composite is tagged with the same instant
//! in the human-readable `YYYY-MM-DD HH:MM:SS` form.

use chrono::NaiveDateTime;

use quadcam_common::error::{QuadcamError, QuadcamResult};

/// `strftime` format of a timestamp key.
pub const TIMESTAMP_KEY_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `strftime` format of the creation-time metadata tag.
pub const CREATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a timestamp key into a naive local date-time.
pub fn parse_timestamp_key(key: &str) -> QuadcamResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(key, TIMESTAMP_KEY_FORMAT).map_err(|_| {
        QuadcamError::InvalidTimestamp {
            key: key.to_string(),
        }
    })
}

/// Reformat a timestamp key as a creation-time tag value.
pub fn creation_time_for_key(key: &str) -> QuadcamResult<String> {
    Ok(parse_timestamp_key(key)?
        .format(CREATION_TIME_FORMAT)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use proptest::prelude::*;

    #[test]
    fn test_creation_time_reformat() {
        assert_eq!(
            creation_time_for_key("2023-05-01_10-00-00").unwrap(),
            "2023-05-01 10:00:00"
        );
    }

    #[test]
    fn test_rejects_malformed_key() {
        for key in ["2023-05-01", "2023-05-01 10:00:00", "2023-13-01_10-00-00", ""] {
            assert!(
                matches!(
                    creation_time_for_key(key),
                    Err(QuadcamError::InvalidTimestamp { .. })
                ),
                "{key} should be rejected"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_key_round_trips_to_creation_time(
            year in 2000i32..2100,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
            second in 0u32..60,
        ) {
            let dt = NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|d| d.and_hms_opt(hour, minute, second))
                .unwrap();
            let key = dt.format(TIMESTAMP_KEY_FORMAT).to_string();
            let parsed = parse_timestamp_key(&key).unwrap();
            prop_assert_eq!(parsed, dt);
            prop_assert_eq!(parsed.second(), second);
            prop_assert_eq!(
                creation_time_for_key(&key).unwrap(),
                dt.format(CREATION_TIME_FORMAT).to_string()
            );
        }
    }
}
