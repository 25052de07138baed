//! Tracked sources and their per-source fetch state.
//!
//! A [`Source`] is one tag or one user being polled.  The
//! [`SourceRegistry`] owns every tracked source, reference-counted by key;
//! each source embeds its own [`TokenRotator`] and [`RecencyWindow`].
//! [`MediaItem`] is what a fetch of a source produces.

mod dedup;
mod media_item;
mod registry;
mod rotator;

pub use dedup::RecencyWindow;
pub use media_item::MediaItem;
pub use registry::SourceRegistry;
pub use rotator::TokenRotator;

use std::fmt;

use chrono::{DateTime, Utc};

/// What kind of entity a source is; decides the endpoint it is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterType {
    Tag,
    User,
}

impl FilterType {
    /// Round-robin order of the scheduler's filter-type cursor.
    pub const ALL: [FilterType; 2] = [FilterType::Tag, FilterType::User];

    /// `/tags/{key}/media/recent` or `/users/{key}/media/recent`, with `key`
    /// percent-encoded.
    pub fn path(self, key: &str) -> String {
        let encoded = urlencoding::encode(key);
        match self {
            FilterType::Tag => format!("/tags/{encoded}/media/recent"),
            FilterType::User => format!("/users/{encoded}/media/recent"),
        }
    }

    pub fn index(self) -> usize {
        match self {
            FilterType::Tag => 0,
            FilterType::User => 1,
        }
    }

    pub fn other(self) -> FilterType {
        match self {
            FilterType::Tag => FilterType::User,
            FilterType::User => FilterType::Tag,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterType::Tag => f.write_str("tag"),
            FilterType::User => f.write_str("user"),
        }
    }
}

/// One tracked tag or user.
///
/// Exists only while at least one `track`/`follow` call references it.
#[derive(Debug, Clone)]
pub struct Source {
    pub filter_type: FilterType,
    pub key: String,
    /// Outstanding track/follow calls for this key.
    pub ref_count: usize,
    /// Completion time of the last successful fetch; the epoch until then.
    pub last_update: DateTime<Utc>,
    pub recent: RecencyWindow,
    pub credentials: TokenRotator,
    /// Distinguishes this incarnation from an earlier or later one of the same key.
    pub generation: u64,
}

impl Source {
    pub(crate) fn new(filter_type: FilterType, key: String, window: usize, generation: u64) -> Self {
        Self {
            filter_type,
            key,
            ref_count: 0,
            last_update: DateTime::<Utc>::UNIX_EPOCH,
            recent: RecencyWindow::with_capacity(window),
            credentials: TokenRotator::new(),
            generation,
        }
    }

    pub fn never_fetched(&self) -> bool {
        self.last_update == DateTime::<Utc>::UNIX_EPOCH
    }

    /// Record a successful fetch and return the items not delivered before.
    pub fn complete_fetch(&mut self, at: DateTime<Utc>, items: Vec<MediaItem>) -> Vec<MediaItem> {
        self.last_update = at;
        self.recent.filter_and_record(items)
    }
}
