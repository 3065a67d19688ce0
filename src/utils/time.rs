use chrono::{DateTime, SecondsFormat, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// ISO-8601 with microseconds and a `Z` suffix, as used in log records.
pub fn now_iso8601() -> String {
    to_rfc3339(now())
}

pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso8601_round_trips_through_parser() {
        let stamp = now_iso8601();
        assert!(stamp.ends_with('Z'));
        let parsed = from_rfc3339(&stamp).unwrap();
        assert_eq!(to_rfc3339(parsed), stamp);
    }
}
