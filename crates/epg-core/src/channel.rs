//! Per-channel schedule queries: now/next and today/tomorrow buckets.
//!
//! Every query has an `*_at(now)` form taking an explicit instant and a
//! convenience form reading the system clock. Calendar dates are always taken
//! in the channel's reference timezone, never in UTC or in the offset the
//! programme was published with.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Serialize;

use crate::programme::Programme;

/// One row of a day schedule, keyed elsewhere by its local start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub title: String,
    pub description: String,
    pub subtitle: String,
    /// Local start time, `"HH:MM"`.
    pub start: String,
    /// Local end time, `"HH:MM"`.
    pub end: String,
}

/// Remaining programmes of one local day, keyed by local `"HH:MM"` start in
/// document order.
///
/// Two programmes starting in the same local minute share a key; the later
/// one in document order replaces the earlier.
pub type DaySchedule = IndexMap<String, ScheduleEntry>;

/// Remaining programmes split into local today and tomorrow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayBuckets {
    pub today: DaySchedule,
    pub tomorrow: DaySchedule,
}

/// A broadcast channel and its programmes in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    id: String,
    display_name: String,
    language: Option<String>,
    programmes: Vec<Programme>,
    tz: Tz,
}

impl Channel {
    /// Build a channel whose local views use `tz`.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        language: Option<String>,
        tz: Tz,
        programmes: Vec<Programme>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            language,
            programmes,
            tz,
        }
    }

    /// The XMLTV channel id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.display_name
    }

    /// `lang` of the display name, if given.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// All programmes in document order, ended ones included.
    pub fn programmes(&self) -> &[Programme] {
        &self.programmes
    }

    /// Reference timezone for today/tomorrow.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// First programme, in list order, whose `[start, end]` contains `now`.
    ///
    /// `None` is the normal answer for schedule gaps and off-air periods.
    pub fn current_programme_at(&self, now: DateTime<Utc>) -> Option<&Programme> {
        self.programmes.iter().find(|p| p.is_airing_at(now))
    }

    /// [`Self::current_programme_at`] with the system clock.
    pub fn current_programme(&self) -> Option<&Programme> {
        self.current_programme_at(Utc::now())
    }

    /// Title of the programme airing now.
    pub fn current_title(&self) -> Option<&str> {
        self.current_programme().map(Programme::title)
    }

    /// Description of the programme airing now.
    pub fn current_description(&self) -> Option<&str> {
        self.current_programme().map(Programme::description)
    }

    /// Sub-title of the programme airing now.
    pub fn current_subtitle(&self) -> Option<&str> {
        self.current_programme().map(Programme::subtitle)
    }

    /// The programme starting exactly when the current one ends.
    ///
    /// Guides are expected to be contiguous: a gap after the current
    /// programme yields `None` rather than the next programme after the gap.
    pub fn next_programme_at(&self, now: DateTime<Utc>) -> Option<&Programme> {
        let current = self.current_programme_at(now)?;
        self.programmes
            .iter()
            .find(|p| !std::ptr::eq(*p, current) && p.start() == current.end())
    }

    /// [`Self::next_programme_at`] with the system clock.
    pub fn next_programme(&self) -> Option<&Programme> {
        self.next_programme_at(Utc::now())
    }

    /// Programmes starting on today's local date that have not yet ended.
    pub fn programmes_for_today_at(&self, now: DateTime<Utc>) -> DaySchedule {
        self.programmes_per_day_at(now).today
    }

    /// [`Self::programmes_for_today_at`] with the system clock.
    pub fn programmes_for_today(&self) -> DaySchedule {
        self.programmes_for_today_at(Utc::now())
    }

    /// Programmes that have not yet ended, bucketed by local start date.
    ///
    /// Programmes starting on any other date are left out entirely.
    pub fn programmes_per_day_at(&self, now: DateTime<Utc>) -> DayBuckets {
        let (today, tomorrow) = local_days(self.tz, now);
        let mut buckets = DayBuckets::default();

        for programme in &self.programmes {
            if programme.has_ended_by(now) {
                continue;
            }
            let date = programme.local_start_date(&self.tz);
            let bucket = if date == today {
                &mut buckets.today
            } else if Some(date) == tomorrow {
                &mut buckets.tomorrow
            } else {
                continue;
            };
            bucket.insert(programme.start_hour(&self.tz), self.entry(programme));
        }

        buckets
    }

    /// [`Self::programmes_per_day_at`] with the system clock.
    pub fn programmes_per_day(&self) -> DayBuckets {
        self.programmes_per_day_at(Utc::now())
    }

    fn entry(&self, programme: &Programme) -> ScheduleEntry {
        ScheduleEntry {
            title: programme.title().to_string(),
            description: programme.description().to_string(),
            subtitle: programme.subtitle().to_string(),
            start: programme.start_hour(&self.tz),
            end: programme.end_hour(&self.tz),
        }
    }
}

/// Local calendar "today" and "tomorrow" for `now` in `tz`.
///
/// Tomorrow is `None` only at the very end of chrono's date range.
pub(crate) fn local_days(tz: Tz, now: DateTime<Utc>) -> (NaiveDate, Option<NaiveDate>) {
    let today = now.with_timezone(&tz).date_naive();
    (today, today.succ_opt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        at(s).with_timezone(&Utc)
    }

    fn prog(title: &str, start: &str, end: &str) -> Programme {
        Programme::new(title, "", "", at(start), at(end)).unwrap()
    }

    #[test]
    fn current_programme_respects_offsets() {
        let channel = Channel::new(
            "c1",
            "Channel One",
            None,
            Tz::UTC,
            vec![
                prog("Morning", "2024-03-10T08:00:00+02:00", "2024-03-10T09:00:00+02:00"),
                prog("Late Morning", "2024-03-10T09:00:00+02:00", "2024-03-10T11:00:00+02:00"),
            ],
        );
        let now = utc("2024-03-10T07:30:00Z");
        assert_eq!(channel.current_programme_at(now).unwrap().title(), "Late Morning");
    }

    #[test]
    fn next_requires_back_to_back_start() {
        let channel = Channel::new(
            "c1",
            "Channel One",
            None,
            Tz::UTC,
            vec![
                prog("A", "2024-03-10T08:00:00Z", "2024-03-10T09:00:00Z"),
                prog("C", "2024-03-10T09:30:00Z", "2024-03-10T10:00:00Z"),
            ],
        );
        assert!(channel.next_programme_at(utc("2024-03-10T08:30:00Z")).is_none());
        assert!(channel.next_programme_at(utc("2024-03-10T09:10:00Z")).is_none());
    }

    #[test]
    fn colliding_start_minute_keeps_later_entry_in_first_slot() {
        let channel = Channel::new(
            "c1",
            "Channel One",
            None,
            Tz::UTC,
            vec![
                prog("First", "2024-03-10T20:00:00Z", "2024-03-10T20:00:30Z"),
                prog("Other", "2024-03-10T21:00:00Z", "2024-03-10T22:00:00Z"),
                prog("Second", "2024-03-10T20:00:10Z", "2024-03-10T21:00:00Z"),
            ],
        );
        let today = channel.programmes_for_today_at(utc("2024-03-10T12:00:00Z"));
        let keys: Vec<&str> = today.keys().map(String::as_str).collect();
        assert_eq!(keys, ["20:00", "21:00"]);
        assert_eq!(today["20:00"].title, "Second");
    }
}
