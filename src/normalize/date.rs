use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses a feed date: RFC 2822 (`pubDate`), then RFC 3339 (`dc:date`,
/// Atom), then a bare ISO timestamp taken as UTC.
///
/// Some generators end RFC 2822 dates with `" Z"`, which is not a zone the
/// grammar allows; it is rewritten to `" GMT"` first. The day-of-week prefix
/// is dropped because generators often get it wrong and chrono rejects a
/// weekday that disagrees with the date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = strip_weekday(raw.trim());
    let rewritten;
    let candidate = match raw.strip_suffix(" Z") {
        Some(head) => {
            rewritten = format!("{head} GMT");
            rewritten.as_str()
        }
        None => raw,
    };

    DateTime::parse_from_rfc2822(candidate)
        .or_else(|_| DateTime::parse_from_rfc3339(candidate))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(candidate, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn strip_weekday(raw: &str) -> &str {
    match raw.split_once(", ") {
        Some((day, rest)) if day.len() == 3 && day.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => raw,
    }
}

/// The first present date field, parsed; `now` when none is present or the
/// value cannot be parsed.
pub fn resolve_timestamp(candidates: &[Option<&str>], now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = candidates.iter().flatten().next() else {
        return now;
    };
    parse_timestamp(raw).unwrap_or_else(|| {
        tracing::warn!(date = %raw, "Unparseable item date, using current time");
        now
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rfc2822_with_offset_and_gmt() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 2, 22, 7, 35).unwrap();
        assert_eq!(parse_timestamp("Sun, 02 Feb 2026 22:07:35 +0000"), Some(expected));
        assert_eq!(parse_timestamp("Sun, 02 Feb 2026 22:07:35 GMT"), Some(expected));
    }

    #[test]
    fn test_wrong_weekday_ignored() {
        // 2 February 2026 is a Monday
        assert_eq!(
            parse_timestamp("Sun, 02 Feb 2026 21:44:11 GMT"),
            Some(Utc.with_ymd_and_hms(2026, 2, 2, 21, 44, 11).unwrap())
        );
    }

    #[test]
    fn test_trailing_z_rewritten() {
        assert_eq!(
            parse_timestamp("Sun, 02 Feb 2026 22:07:35 Z"),
            Some(Utc.with_ymd_and_hms(2026, 2, 2, 22, 7, 35).unwrap())
        );
    }

    #[test]
    fn test_rfc3339_and_naive() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T13:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:00:00"), Some(expected));
    }

    #[test]
    fn test_resolve_uses_first_present_field() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let resolved = resolve_timestamp(
            &[None, Some("2024-01-01T00:00:00Z"), Some("garbage")],
            now,
        );
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(resolve_timestamp(&[None, None], now), now);
        assert_eq!(resolve_timestamp(&[Some("not a date")], now), now);
    }
}
