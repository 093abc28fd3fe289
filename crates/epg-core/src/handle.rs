//! Shared, atomically swappable reference to the current guide.
//!
//! Readers call [`GuideHandle::load`] on every render cycle and keep the
//! returned `Arc<Guide>` for as long as they need it. A refresh parses the
//! new document first and only then swaps it in, so readers see either the
//! old guide or the complete new one.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::guide::Guide;
use crate::options::GuideOptions;

#[derive(Debug, Default)]
pub struct GuideHandle {
    current: ArcSwapOption<Guide>,
}

impl GuideHandle {
    /// An empty handle; [`Self::needs_refresh`] is true until a guide is installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle with `guide` already installed.
    pub fn with_guide(guide: Guide) -> Self {
        Self {
            current: ArcSwapOption::from_pointee(guide),
        }
    }

    /// The installed guide, or `None` before the first successful refresh.
    pub fn load(&self) -> Option<Arc<Guide>> {
        self.current.load_full()
    }

    /// Replace the installed guide, returning the previous one.
    pub fn install(&self, guide: Guide) -> Option<Arc<Guide>> {
        debug!(
            "Installing guide with {} channel(s)",
            guide.channels().len()
        );
        self.current.swap(Some(Arc::new(guide)))
    }

    /// Parse `text` and install the result.
    ///
    /// # Errors
    /// Returns the parse error and leaves the previously installed guide in
    /// place.
    pub fn refresh_from_str(&self, text: &str, options: &GuideOptions) -> Result<Arc<Guide>> {
        match Guide::from_options(text, options) {
            Ok(guide) => {
                let guide = Arc::new(guide);
                self.current.store(Some(Arc::clone(&guide)));
                debug!("Guide refreshed");
                Ok(guide)
            }
            Err(err) => {
                warn!("Guide refresh failed, keeping previous guide: {}", err);
                Err(err)
            }
        }
    }

    /// True when nothing is installed or the installed guide is stale.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.load().is_none_or(|guide| guide.is_stale_at(now))
    }

    /// [`Self::needs_refresh_at`] with the system clock.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }
}
