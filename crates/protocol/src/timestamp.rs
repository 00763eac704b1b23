use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parses RFC 3339 timestamps as well as the naive forms older writers
/// produced (with or without a bare trailing `Z`). Naive values are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_aware_and_naive_forms_to_the_same_instant() {
        let expected = Utc.with_ymd_and_hms(2025, 11, 4, 10, 15, 0).unwrap();
        for raw in [
            "2025-11-04T10:15:00Z",
            "2025-11-04T10:15:00+00:00",
            "2025-11-04T10:15:00",
            "2025-11-04T10:15:00.000000Z",
            "2025-11-04 10:15:00",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }
    }

    #[test]
    fn parses_offsets_into_utc() {
        let parsed = parse_timestamp("2025-11-04T12:15:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 11, 4, 10, 15, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn formatted_timestamps_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let text = format_timestamp(at);
        assert!(text.ends_with('Z'), "{text}");
        assert_eq!(parse_timestamp(&text), Some(at));
    }
}
