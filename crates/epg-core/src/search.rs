//! Cross-channel title search over the today/tomorrow buckets.
//!
//! Results are flattened across channels (and across guides, for hosts
//! holding several) and stably sorted by their local start date-time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::channel::{local_days, DaySchedule, ScheduleEntry};
use crate::error::{GuideError, Result};
use crate::guide::Guide;

/// Shown in results for programmes without a description.
pub const NO_DESCRIPTION: &str = "No description";

/// Which day buckets a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateScope {
    Today,
    Tomorrow,
    /// Today and tomorrow.
    #[default]
    Any,
}

impl DateScope {
    fn covers_today(self) -> bool {
        matches!(self, DateScope::Today | DateScope::Any)
    }

    fn covers_tomorrow(self) -> bool {
        matches!(self, DateScope::Tomorrow | DateScope::Any)
    }
}

impl FromStr for DateScope {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DateScope::Today),
            "tomorrow" => Ok(DateScope::Tomorrow),
            "any" | "all" | "all_future" => Ok(DateScope::Any),
            _ => Err(GuideError::InvalidDateScope(s.to_string())),
        }
    }
}

impl fmt::Display for DateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateScope::Today => "today",
            DateScope::Tomorrow => "tomorrow",
            DateScope::Any => "any",
        })
    }
}

/// One matching programme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub channel_name: String,
    pub title: String,
    pub description: String,
    /// Local `"HH:MM"`.
    pub start_time: String,
    /// Local `"HH:MM"`.
    pub end_time: String,
    /// Local calendar date of the bucket the programme was found in.
    pub date: NaiveDate,
    /// `date` combined with `start_time`, e.g. `2024-01-01T21:00:00`.
    pub start_datetime_iso: String,
}

/// Search one guide. See [`search_guides_at`].
pub fn search(
    guide: &Guide,
    pattern: &str,
    channel_name: Option<&str>,
    scope: DateScope,
) -> Result<Vec<SearchResult>> {
    search_at(guide, pattern, channel_name, scope, Utc::now())
}

/// Search one guide at a fixed instant.
pub fn search_at(
    guide: &Guide,
    pattern: &str,
    channel_name: Option<&str>,
    scope: DateScope,
    now: DateTime<Utc>,
) -> Result<Vec<SearchResult>> {
    search_guides_at([guide], pattern, channel_name, scope, now)
}

/// Search several guides, merging their results into one chronological list.
///
/// `pattern` is a regular expression matched case-insensitively anywhere in
/// the title, so a plain word acts as a substring search. `channel_name`,
/// when given, must equal a channel's display name exactly. Ties keep
/// discovery order: guide, then channel, then today before tomorrow.
///
/// # Errors
/// Returns `GuideError::InvalidPattern` if `pattern` is not a valid regex.
pub fn search_guides_at<'a, I>(
    guides: I,
    pattern: &str,
    channel_name: Option<&str>,
    scope: DateScope,
    now: DateTime<Utc>,
) -> Result<Vec<SearchResult>>
where
    I: IntoIterator<Item = &'a Guide>,
{
    let matcher = RegexBuilder::new(pattern).case_insensitive(true).build()?;
    let mut results = Vec::new();

    for guide in guides {
        let (today, tomorrow) = local_days(guide.timezone(), now);

        for channel in guide.channels() {
            if channel_name.is_some_and(|name| name != channel.name()) {
                continue;
            }
            let buckets = channel.programmes_per_day_at(now);

            if scope.covers_today() {
                collect(&mut results, &matcher, channel.name(), &buckets.today, today)?;
            }
            if let (true, Some(tomorrow)) = (scope.covers_tomorrow(), tomorrow) {
                collect(&mut results, &matcher, channel.name(), &buckets.tomorrow, tomorrow)?;
            }
        }
    }

    results.sort_by(|a, b| a.start_datetime_iso.cmp(&b.start_datetime_iso));
    Ok(results)
}

fn collect(
    results: &mut Vec<SearchResult>,
    matcher: &Regex,
    channel_name: &str,
    schedule: &DaySchedule,
    date: NaiveDate,
) -> Result<()> {
    for entry in schedule.values().filter(|e| matcher.is_match(&e.title)) {
        results.push(to_result(entry, channel_name, date)?);
    }
    Ok(())
}

fn to_result(entry: &ScheduleEntry, channel_name: &str, date: NaiveDate) -> Result<SearchResult> {
    let start = NaiveTime::parse_from_str(&entry.start, "%H:%M").map_err(|e| {
        GuideError::InvalidTimestamp {
            value: entry.start.clone(),
            reason: e.to_string(),
        }
    })?;
    let description = if entry.description.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        entry.description.clone()
    };

    Ok(SearchResult {
        channel_name: channel_name.to_string(),
        title: entry.title.clone(),
        description,
        start_time: entry.start.clone(),
        end_time: entry.end.clone(),
        date,
        start_datetime_iso: date.and_time(start).format("%Y-%m-%dT%H:%M:%S").to_string(),
    })
}
