//! The parsed guide: channels in document order plus the reference timezone.
//!
//! A `Guide` is built in one shot from an XMLTV document and never changes
//! afterwards. Refreshing means parsing a new document into a new `Guide`
//! (see [`GuideHandle`](crate::GuideHandle) for swapping it in).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::channel::{local_days, Channel};
use crate::error::{GuideError, Result};
use crate::options::{ChannelFilter, GuideOptions};
use crate::programme::{Programme, UNTITLED};
use crate::xmltv::{self, RawProgramme};

/// Marker every usable XMLTV payload contains.
const CHANNEL_MARKER: &str = "channel";

/// Cheap sanity check for fetched content before it is handed to
/// [`Guide::parse`]: empty bodies and error pages without any channel marker
/// should be treated as fetch failures.
pub fn looks_like_guide(text: &str) -> bool {
    !text.trim().is_empty() && text.contains(CHANNEL_MARKER)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    channels: Vec<Channel>,
    tz: Tz,
}

impl Guide {
    /// Parse an XMLTV document.
    ///
    /// Channels whose display name `filter` rejects are dropped together with
    /// their programmes. A kept channel with no programmes is still present.
    ///
    /// # Errors
    /// Fails as a whole, never yielding a partial guide, when the XML is
    /// malformed, a kept programme lacks `start`/`stop`, a timestamp does not
    /// match `YYYYMMDDHHMMSS ±HHMM`, or a programme ends before it starts.
    pub fn parse(text: &str, tz: Tz, filter: &ChannelFilter) -> Result<Self> {
        let raw = xmltv::scan(text)?;

        let declared: HashSet<&str> = raw.channels.iter().map(|c| c.id.as_str()).collect();
        let mut by_channel: HashMap<&str, Vec<&RawProgramme>> = HashMap::new();
        let mut orphans = 0usize;
        for programme in &raw.programmes {
            match programme.channel.as_deref() {
                Some(id) if declared.contains(id) => {
                    by_channel.entry(id).or_default().push(programme)
                }
                _ => orphans += 1,
            }
        }
        if orphans > 0 {
            warn!("{} programme(s) reference no declared channel", orphans);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut channels = Vec::new();
        for raw_channel in &raw.channels {
            let display_name = raw_channel.display_name.as_deref().unwrap_or_default();
            if !filter.accepts(display_name) {
                continue;
            }
            if !seen.insert(raw_channel.id.as_str()) {
                warn!("Duplicate channel id '{}', keeping the first", raw_channel.id);
                continue;
            }

            let programmes = by_channel
                .get(raw_channel.id.as_str())
                .map(|raws| raws.iter().map(|p| build_programme(p)).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();

            channels.push(Channel::new(
                raw_channel.id.clone(),
                display_name,
                raw_channel.language.clone(),
                tz,
                programmes,
            ));
        }

        let guide = Self { channels, tz };
        debug!(
            "Parsed guide: {} of {} channel(s), {} programme(s), tz={}",
            guide.channels.len(),
            raw.channels.len(),
            guide.programme_count(),
            tz
        );
        Ok(guide)
    }

    /// Parse with the timezone and channel selection from `options`.
    pub fn from_options(text: &str, options: &GuideOptions) -> Result<Self> {
        Self::parse(text, options.timezone()?, &options.channel_filter())
    }

    /// Retained channels in document order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Look up a retained channel by its XMLTV id.
    pub fn get_channel_by_id(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id() == id)
    }

    /// Look up a retained channel by exact display name.
    pub fn get_channel_by_name(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name() == name)
    }

    /// Reference timezone the guide was parsed with.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Total programmes across all retained channels.
    pub fn programme_count(&self) -> usize {
        self.channels.iter().map(|c| c.programmes().len()).sum()
    }

    /// Whether the guide no longer reaches into local tomorrow.
    ///
    /// Providers typically publish about two days of data once a day, so the
    /// guide is due for a refetch once the first channel's last programme
    /// (in list order) starts before tomorrow's local date. Only the first
    /// channel is inspected; channels with shorter coverage are not noticed.
    /// No channels, or an empty first channel, is always stale.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.channels.first().and_then(|c| c.programmes().last()) else {
            return true;
        };
        match local_days(self.tz, now) {
            (_, Some(tomorrow)) => last.local_start_date(&self.tz) < tomorrow,
            (_, None) => false,
        }
    }

    /// [`Self::is_stale_at`] with the system clock.
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }
}

fn build_programme(raw: &RawProgramme) -> Result<Programme> {
    let start = raw.start.as_deref().ok_or(GuideError::MissingAttribute {
        element: "programme",
        attribute: "start",
    })?;
    let stop = raw.stop.as_deref().ok_or(GuideError::MissingAttribute {
        element: "programme",
        attribute: "stop",
    })?;

    Programme::new(
        raw.title.as_deref().unwrap_or(UNTITLED),
        raw.subtitle.clone().unwrap_or_default(),
        raw.description.clone().unwrap_or_default(),
        xmltv::parse_timestamp(start)?,
        xmltv::parse_timestamp(stop)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn guide_is_shareable_across_threads() {
        assert_send_sync::<Guide>();
    }

    #[test]
    fn guide_marker_check() {
        assert!(looks_like_guide("<tv><channel id=\"a\"/></tv>"));
        assert!(!looks_like_guide("   "));
        assert!(!looks_like_guide("<html>503 Service Unavailable</html>"));
    }

    #[test]
    fn empty_guide_is_stale() {
        let guide = Guide::parse("<tv></tv>", Tz::UTC, &ChannelFilter::All).unwrap();
        assert!(guide.channels().is_empty());
        assert!(guide.is_stale_at(Utc::now()));
    }
}
