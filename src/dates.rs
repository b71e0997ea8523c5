//! Timestamp normalization for search-result listings.
//!
//! Listings carry a single text fragment of the shape
//! `"<created> (uppdaterad <updated>)"`. [`created_updated`] splits the
//! fragment at the publication's updated-marker and parses both halves
//! leniently, attaching the publication's home zone whenever the text does
//! not carry an explicit offset.
//!
//! A fragment without the marker, without a terminating `)`, or with an
//! unparseable half yields `None` rather than an error: callers treat the
//! item as "timestamp unavailable" and exclude it from date-window matching.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

// Embedded ISO date with an optional time, e.g. "2024-01-15 kl 10.30".
static ISO_STAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})-(\d{2})-(\d{2})(?:\D{1,4}(\d{1,2})[:.](\d{2}))?").unwrap()
});

// Day-first European form, e.g. "3 mars 2020 kl 14.30" or "15 January 2024".
static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\.?\s+([a-zåäö]{3,})\.?\s+(\d{4})(?:\D{1,6}(\d{1,2})[:.](\d{2}))?")
        .unwrap()
});

// Month-first English form, e.g. "March 3, 2020 14:30".
static MONTH_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-zåäö]{3,})\.?\s+(\d{1,2}),?\s+(\d{4})(?:\D{1,6}(\d{1,2})[:.](\d{2}))?")
        .unwrap()
});

/// Split a raw listing fragment into `(created, updated)`.
///
/// `marker` is the publication's updated-marker (for Aftonbladet,
/// `"(uppdaterad"`); the fragment must end with `)` for the updated segment
/// to be considered well formed. Returns `None` when the marker is absent or
/// malformed, or when either half fails to parse.
pub fn created_updated(raw: &str, marker: &str, zone: Tz) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
    let raw = raw.trim();
    let pos = raw.find(marker)?;
    if !raw.ends_with(')') {
        trace!(fragment = raw, "Updated segment not terminated; timestamp unavailable");
        return None;
    }
    let created = parse_lenient(&raw[..pos], zone)?;
    let updated = parse_lenient(&raw[pos..], zone)?;
    Some((created, updated))
}

/// Leniently parse a timestamp out of prose.
///
/// Explicit-offset RFC 3339 input is honored and converted into `zone`.
/// Otherwise the first recognizable date form found in the text is taken as
/// local time in `zone`. Returns `None` when nothing date-like is found or
/// the local time does not exist in `zone`.
pub fn parse_lenient(text: &str, zone: Tz) -> Option<DateTime<Tz>> {
    let text = text.trim();

    if let Ok(explicit) = DateTime::parse_from_rfc3339(text) {
        return Some(explicit.with_timezone(&zone));
    }

    let naive = find_naive(text)?;
    let resolved = zone.from_local_datetime(&naive).earliest();
    if resolved.is_none() {
        trace!(%naive, "Local time does not exist in zone; timestamp unavailable");
    }
    resolved
}

fn find_naive(text: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = ISO_STAMP.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return Some(date.and_time(captured_time(&caps, 4)?));
    }

    if let Some(caps) = DAY_FIRST.captures(text) {
        if let Some(month) = month_from_name(&caps[2]) {
            let date =
                NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[1].parse().ok()?)?;
            return Some(date.and_time(captured_time(&caps, 4)?));
        }
    }

    if let Some(caps) = MONTH_FIRST.captures(text) {
        if let Some(month) = month_from_name(&caps[1]) {
            let date =
                NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[2].parse().ok()?)?;
            return Some(date.and_time(captured_time(&caps, 4)?));
        }
    }

    None
}

fn captured_time(caps: &regex::Captures<'_>, first_group: usize) -> Option<NaiveTime> {
    match (caps.get(first_group), caps.get(first_group + 1)) {
        (Some(h), Some(m)) => {
            NaiveTime::from_hms_opt(h.as_str().parse().ok()?, m.as_str().parse().ok()?, 0)
        }
        _ => NaiveTime::from_hms_opt(0, 0, 0),
    }
}

/// Swedish and English month names, matched on their first three letters.
fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let prefix: String = lower.chars().take(3).collect();
    match prefix.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "maj" | "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "okt" | "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Stockholm;

    const MARKER: &str = "(uppdaterad";

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        Stockholm.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_iso_fragment_with_swedish_time() {
        let (created, updated) = created_updated(
            "2024-01-15 kl 10.30 (uppdaterad 2024-01-15 kl 12.00)",
            MARKER,
            Stockholm,
        )
        .unwrap();
        assert_eq!(created, local(2024, 1, 15, 10, 30));
        assert_eq!(updated, local(2024, 1, 15, 12, 0));
    }

    #[test]
    fn test_day_first_swedish_month_names() {
        let (created, updated) =
            created_updated("3 mars 2020 kl 14.30 (uppdaterad 4 mars 2020 kl 09.15)", MARKER, Stockholm)
                .unwrap();
        assert_eq!(created, local(2020, 3, 3, 14, 30));
        assert_eq!(updated, local(2020, 3, 4, 9, 15));
    }

    #[test]
    fn test_month_first_english_defaults_to_midnight() {
        let (created, updated) =
            created_updated("March 3, 2020 (uppdaterad March 4, 2020)", MARKER, Stockholm).unwrap();
        assert_eq!(created, local(2020, 3, 3, 0, 0));
        assert_eq!(updated, local(2020, 3, 4, 0, 0));
    }

    #[test]
    fn test_missing_marker_is_unavailable() {
        assert!(created_updated("2024-01-15 kl 10.30", MARKER, Stockholm).is_none());
    }

    #[test]
    fn test_trailing_garbage_is_unavailable() {
        // Marker present but the fragment does not end with ')'.
        assert!(
            created_updated("March 3, 2020 (uppdaterad March 3, 2020).", MARKER, Stockholm)
                .is_none()
        );
    }

    #[test]
    fn test_unparseable_half_is_unavailable() {
        assert!(created_updated("i går (uppdaterad nyss)", MARKER, Stockholm).is_none());
    }

    #[test]
    fn test_explicit_offset_is_honored() {
        // 08:00 UTC is 09:00 in Stockholm in January.
        let parsed = parse_lenient("2024-01-15T08:00:00+00:00", Stockholm).unwrap();
        assert_eq!(parsed, local(2024, 1, 15, 9, 0));
    }

    #[test]
    fn test_prose_around_the_stamp_is_tolerated() {
        let parsed = parse_lenient("NYHETER publicerad 2024-01-15 kl 10.30 av TT", Stockholm);
        assert_eq!(parsed, Some(local(2024, 1, 15, 10, 30)));
    }

    #[test]
    fn test_nothing_date_like_is_unavailable() {
        assert!(parse_lenient("direktsändning", Stockholm).is_none());
    }
}
