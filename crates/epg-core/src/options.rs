//! Guide construction options: reference timezone and channel selection.
//!
//! [`GuideOptions`] mirrors the settings a host stores for one configured
//! guide (timezone, selected channels, full-guide mode, schedule depth) and
//! derives the inputs [`Guide::parse`](crate::Guide::parse) needs from them.

use std::collections::BTreeSet;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{GuideError, Result};

/// The sentinel display name meaning "keep every channel".
pub const ALL_CHANNELS: &str = "ALL";

/// Which channels, by display name, survive parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelFilter {
    /// Keep every channel in the document.
    #[default]
    All,
    /// Keep only channels whose display name is in the set.
    Names(BTreeSet<String>),
}

impl ChannelFilter {
    /// Build a filter from display names. A lone `"ALL"` entry keeps everything.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.len() == 1 && names.contains(ALL_CHANNELS) {
            ChannelFilter::All
        } else {
            ChannelFilter::Names(names)
        }
    }

    /// Whether a channel with `display_name` is kept.
    pub fn accepts(&self, display_name: &str) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Names(names) => names.contains(display_name),
        }
    }
}

/// Per-guide configuration as stored by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideOptions {
    /// IANA timezone used for all today/tomorrow bucketing.
    pub time_zone: String,
    /// Display names of the channels to keep (ignored when `generated`).
    pub selected_channels: Vec<String>,
    /// Full-guide mode: keep every channel in the document.
    pub generated: bool,
    /// Render today and tomorrow instead of today only.
    pub full_schedule: bool,
}

impl Default for GuideOptions {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            selected_channels: Vec::new(),
            generated: false,
            full_schedule: false,
        }
    }
}

impl GuideOptions {
    /// Resolve `time_zone` into a `chrono-tz` zone.
    ///
    /// # Errors
    /// Returns `GuideError::InvalidTimezone` if it is not a valid IANA identifier.
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.time_zone)
    }

    /// Channel selection implied by `generated` and `selected_channels`.
    pub fn channel_filter(&self) -> ChannelFilter {
        if self.generated {
            ChannelFilter::All
        } else {
            ChannelFilter::from_names(self.selected_channels.iter().cloned())
        }
    }
}

/// Parse an IANA timezone identifier.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| GuideError::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_keeps_everything() {
        let filter = ChannelFilter::from_names(["ALL"]);
        assert_eq!(filter, ChannelFilter::All);
        assert!(filter.accepts("Anything"));
    }

    #[test]
    fn names_filter_is_exact() {
        let filter = ChannelFilter::from_names(["BBC One"]);
        assert!(filter.accepts("BBC One"));
        assert!(!filter.accepts("BBC Two"));
        assert!(!filter.accepts("bbc one"));
    }

    #[test]
    fn generated_mode_overrides_selection() {
        let options = GuideOptions {
            selected_channels: vec!["BBC One".to_string()],
            generated: true,
            ..GuideOptions::default()
        };
        assert_eq!(options.channel_filter(), ChannelFilter::All);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: GuideOptions =
            serde_json::from_str(r#"{"time_zone":"Europe/London","selected_channels":["ITV1"]}"#)
                .unwrap();
        assert_eq!(options.timezone().unwrap(), chrono_tz::Europe::London);
        assert!(!options.full_schedule);
        assert!(options.channel_filter().accepts("ITV1"));
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let err = parse_timezone("Mars/Olympus").unwrap_err();
        assert!(matches!(err, GuideError::InvalidTimezone(_)));
    }
}
