//! # epg-core
//!
//! XMLTV programme guides with timezone-correct "now", "today" and
//! "tomorrow" queries.
//!
//! XMLTV timestamps carry a fixed UTC offset (`20240101200000 +0000`) while
//! viewers think in local calendar days. Every day-relative answer here is
//! computed in the guide's reference timezone via `chrono-tz`, never in UTC
//! and never in the offset the provider happened to publish.
//!
//! ## Modules
//!
//! - [`xmltv`]: streaming XMLTV scan and timestamp parsing
//! - [`guide`]: `Guide` construction, channel lookup, staleness
//! - [`channel`]: now/next lookups and day-bucketed schedules
//! - [`programme`]: a single immutable schedule entry
//! - [`search`]: cross-channel title search
//! - [`handle`]: atomic swap of the current guide on refresh
//! - [`snapshot`]: render-ready per-channel view
//! - [`options`]: reference timezone and channel selection
//! - [`error`]: Error types

pub mod channel;
pub mod error;
pub mod guide;
pub mod handle;
pub mod options;
pub mod programme;
pub mod search;
pub mod snapshot;
pub mod xmltv;

pub use channel::{Channel, DayBuckets, DaySchedule, ScheduleEntry};
pub use error::GuideError;
pub use guide::{looks_like_guide, Guide};
pub use handle::GuideHandle;
pub use options::{ChannelFilter, GuideOptions, ALL_CHANNELS};
pub use programme::Programme;
pub use search::{search, search_at, search_guides_at, DateScope, SearchResult};
pub use snapshot::{ChannelSnapshot, ScheduleView};
