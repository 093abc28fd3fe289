//! Render-ready view of one channel for a host sensor.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::channel::{Channel, DayBuckets, DaySchedule};
use crate::programme::Programme;
use crate::search::NO_DESCRIPTION;

pub const UNAVAILABLE: &str = "Unavailable";
pub const NO_SUBTITLE: &str = "No subtitle";

/// Schedule attribute: today only, or today and tomorrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScheduleView {
    Today { today: DaySchedule },
    PerDay(DayBuckets),
}

/// What airs on a channel now and next, plus its remaining schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    /// Current title, or `"Unavailable"` during a gap.
    pub state: String,
    #[serde(flatten)]
    pub schedule: ScheduleView,
    pub desc: String,
    pub sub_title: String,
    pub next_program_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_program_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_program_end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_program_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_program_sub_title: Option<String>,
    pub channel_id: String,
    pub channel_display_name: String,
}

impl Channel {
    /// Render the channel as of `now`; `full_schedule` adds tomorrow.
    pub fn snapshot_at(&self, now: DateTime<Utc>, full_schedule: bool) -> ChannelSnapshot {
        let tz = self.timezone();
        let current = self.current_programme_at(now);
        let next = self.next_programme_at(now);

        let schedule = if full_schedule {
            ScheduleView::PerDay(self.programmes_per_day_at(now))
        } else {
            ScheduleView::Today {
                today: self.programmes_for_today_at(now),
            }
        };

        ChannelSnapshot {
            state: current.map_or(UNAVAILABLE, Programme::title).to_string(),
            schedule,
            desc: or_placeholder(current.map(Programme::description), NO_DESCRIPTION),
            sub_title: or_placeholder(current.map(Programme::subtitle), NO_SUBTITLE),
            next_program_title: next.map_or(UNAVAILABLE, Programme::title).to_string(),
            next_program_start_time: next.map(|p| p.start_hour(&tz)),
            next_program_end_time: next.map(|p| p.end_hour(&tz)),
            next_program_desc: next.map(|p| or_placeholder(Some(p.description()), NO_DESCRIPTION)),
            next_program_sub_title: next.map(|p| or_placeholder(Some(p.subtitle()), NO_SUBTITLE)),
            channel_id: self.id().to_string(),
            channel_display_name: self.name().to_string(),
        }
    }

    /// [`Self::snapshot_at`] with the system clock.
    pub fn snapshot(&self, full_schedule: bool) -> ChannelSnapshot {
        self.snapshot_at(Utc::now(), full_schedule)
    }
}

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}
