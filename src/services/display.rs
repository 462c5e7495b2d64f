//! Timestamp handling for the read views.
//!
//! Stored instants are normalized to UTC and only converted to a wall clock
//! when rendered for the person looking at the listing.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Treats a zone-less value as UTC.
pub fn assume_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

/// Parses RFC 3339 input, falling back to zone-less forms read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(assume_utc)
}

/// `deserialize_with` adapter for [`parse_instant`].
pub fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time {raw:?}")))
}

pub fn render_in<Tz>(instant: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    instant.with_timezone(zone).format(DISPLAY_FORMAT).to_string()
}

/// Renders in the local zone of the machine serving the request.
pub fn render_local(instant: DateTime<Utc>) -> String {
    render_in(instant, &Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn naive_values_are_read_as_utc() {
        let naive = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(20, 30, 0)
            .unwrap();
        let instant = assume_utc(naive);
        assert_eq!(instant.to_rfc3339(), "2025-03-09T20:30:00+00:00");
    }

    #[test]
    fn parses_zoned_and_zone_less_input() {
        let zoned = parse_instant("2025-03-09T14:30:00-06:00").unwrap();
        assert_eq!(zoned.to_rfc3339(), "2025-03-09T20:30:00+00:00");

        let naive = parse_instant("2025-03-09 20:30").unwrap();
        assert_eq!(naive, zoned);

        assert!(parse_instant("next tuesday").is_none());
    }

    #[test]
    fn renders_in_the_viewer_zone() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 10, 2, 15, 0).unwrap();
        let mexico_city = FixedOffset::west_opt(6 * 3600).unwrap();

        assert_eq!(render_in(instant, &Utc), "2025-03-10 02:15");
        assert_eq!(render_in(instant, &mexico_city), "2025-03-09 20:15");
    }
}
