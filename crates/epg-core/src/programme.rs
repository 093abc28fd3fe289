//! A single scheduled broadcast.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{GuideError, Result};

/// Title used when a `<programme>` carries no `<title>` element.
pub const UNTITLED: &str = "Not Available";

/// One time-boxed schedule entry.
///
/// Start and stop keep the UTC offset written in the XMLTV document; local
/// views are produced on demand against a guide's reference timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Programme {
    title: String,
    subtitle: String,
    description: String,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl Programme {
    /// Build a programme from already-parsed instants.
    ///
    /// # Errors
    /// Returns `GuideError::InvalidInterval` when `end` precedes `start`.
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        description: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self> {
        let title = title.into();
        if end < start {
            return Err(GuideError::InvalidInterval {
                title,
                start: start.to_rfc3339(),
                stop: end.to_rfc3339(),
            });
        }
        Ok(Self {
            title,
            subtitle: subtitle.into(),
            description: description.into(),
            start,
            end,
        })
    }

    /// Title, or `"Not Available"` when the source had none.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Episode sub-title, empty when absent.
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    /// Description, empty when absent.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Start instant with the offset it was published in.
    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    /// Stop instant with the offset it was published in.
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Start projected into `tz`.
    pub fn local_start(&self, tz: &Tz) -> DateTime<Tz> {
        self.start.with_timezone(tz)
    }

    /// Stop projected into `tz`.
    pub fn local_end(&self, tz: &Tz) -> DateTime<Tz> {
        self.end.with_timezone(tz)
    }

    /// Calendar date of the start instant in `tz`.
    pub fn local_start_date(&self, tz: &Tz) -> NaiveDate {
        self.local_start(tz).date_naive()
    }

    /// Local start time as `"HH:MM"`.
    pub fn start_hour(&self, tz: &Tz) -> String {
        self.local_start(tz).format("%H:%M").to_string()
    }

    /// Local end time as `"HH:MM"`.
    pub fn end_hour(&self, tz: &Tz) -> String {
        self.local_end(tz).format("%H:%M").to_string()
    }

    /// Inclusive on both ends: a programme is airing at its own start and stop.
    pub fn is_airing_at(&self, now: DateTime<Utc>) -> bool {
        self.start.with_timezone(&Utc) <= now && now <= self.end.with_timezone(&Utc)
    }

    /// True once the stop instant is strictly before `now`.
    pub fn has_ended_by(&self, now: DateTime<Utc>) -> bool {
        self.end.with_timezone(&Utc) < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn start_hour_renders_in_reference_zone() {
        let p = Programme::new(
            "News",
            "",
            "",
            at("2024-01-01T20:00:00+00:00"),
            at("2024-01-01T21:00:00+00:00"),
        )
        .unwrap();
        // Etc/GMT-2 is UTC+2 (POSIX sign inversion).
        let tz: Tz = "Etc/GMT-2".parse().unwrap();
        assert_eq!(p.start_hour(&tz), "22:00");
        assert_eq!(p.end_hour(&tz), "23:00");
    }

    #[test]
    fn local_date_crosses_midnight() {
        let p = Programme::new(
            "Late Show",
            "",
            "",
            at("2024-01-01T23:30:00+00:00"),
            at("2024-01-02T00:30:00+00:00"),
        )
        .unwrap();
        let tz: Tz = "Asia/Jerusalem".parse().unwrap();
        assert_eq!(
            p.local_start_date(&tz),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(
            p.local_start_date(&Tz::UTC),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let err = Programme::new(
            "Backwards",
            "",
            "",
            at("2024-01-01T21:00:00+00:00"),
            at("2024-01-01T20:00:00+00:00"),
        )
        .unwrap_err();
        assert!(matches!(err, GuideError::InvalidInterval { .. }));
    }

    #[test]
    fn airing_is_inclusive_at_both_edges() {
        let p = Programme::new(
            "Edge",
            "",
            "",
            at("2024-01-01T20:00:00+02:00"),
            at("2024-01-01T21:00:00+02:00"),
        )
        .unwrap();
        let start = at("2024-01-01T18:00:00Z").with_timezone(&Utc);
        let end = at("2024-01-01T19:00:00Z").with_timezone(&Utc);
        assert!(p.is_airing_at(start));
        assert!(p.is_airing_at(end));
        assert!(!p.is_airing_at(end + chrono::Duration::seconds(1)));
    }
}
