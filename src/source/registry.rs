//! Reference-counted set of tracked sources, one map per filter type.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::info;

use super::{FilterType, Source};
use crate::config::DEFAULT_RECENCY_WINDOW;

/// Owns every tracked [`Source`].
///
/// A source is present exactly while its reference count is positive.
/// Dropping to zero discards its recency window and credential rotation, so
/// tracking the key again starts from scratch.
#[derive(Debug)]
pub struct SourceRegistry {
    by_type: [BTreeMap<String, Source>; 2],
    window: usize,
    next_generation: u64,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_RECENCY_WINDOW)
    }
}

impl SourceRegistry {
    /// `window` is the recency-window capacity given to every new source.
    pub fn new(window: usize) -> Self {
        Self {
            by_type: [BTreeMap::new(), BTreeMap::new()],
            window,
            next_generation: 0,
        }
    }

    fn sources(&self, filter_type: FilterType) -> &BTreeMap<String, Source> {
        &self.by_type[filter_type.index()]
    }

    fn sources_mut(&mut self, filter_type: FilterType) -> &mut BTreeMap<String, Source> {
        &mut self.by_type[filter_type.index()]
    }

    /// Add one reference to `key`, creating the source on first reference.
    /// `credential`, if given, joins the back of the source's rotation.
    pub fn add(&mut self, filter_type: FilterType, key: &str, credential: Option<&str>) {
        let sources = &mut self.by_type[filter_type.index()];
        let source = match sources.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                info!(%filter_type, key, "tracking new source");
                self.next_generation += 1;
                entry.insert(Source::new(
                    filter_type,
                    key.to_string(),
                    self.window,
                    self.next_generation,
                ))
            }
        };

        source.ref_count += 1;
        if let Some(token) = credential {
            source.credentials.push(token);
        }
    }

    /// Drop one reference to `key`; unknown keys are ignored.
    pub fn remove(&mut self, filter_type: FilterType, key: &str) {
        let sources = self.sources_mut(filter_type);
        let Some(source) = sources.get_mut(key) else {
            return;
        };

        source.ref_count = source.ref_count.saturating_sub(1);
        if source.ref_count == 0 {
            sources.remove(key);
            info!(%filter_type, key, "stopped tracking source");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.iter().all(BTreeMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.by_type.iter().map(BTreeMap::len).sum()
    }

    /// Snapshot of the tracked keys of one type, in key order.
    pub fn list_keys(&self, filter_type: FilterType) -> Vec<String> {
        self.sources(filter_type).keys().cloned().collect()
    }

    /// The source of `filter_type` fetched longest ago; ties go to the
    /// smallest key.
    pub fn select_next(&mut self, filter_type: FilterType) -> Option<&mut Source> {
        self.sources_mut(filter_type)
            .values_mut()
            .min_by(|a, b| a.last_update.cmp(&b.last_update).then_with(|| a.key.cmp(&b.key)))
    }

    pub fn get(&self, filter_type: FilterType, key: &str) -> Option<&Source> {
        self.sources(filter_type).get(key)
    }

    pub fn get_mut(&mut self, filter_type: FilterType, key: &str) -> Option<&mut Source> {
        self.sources_mut(filter_type).get_mut(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MediaItem;
    use chrono::{Duration, Utc};

    #[test]
    fn starts_empty() {
        let registry = SourceRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.list_keys(FilterType::Tag).is_empty());
        assert!(registry.list_keys(FilterType::User).is_empty());
    }

    #[test]
    fn add_and_list_per_type() {
        let mut registry = SourceRegistry::default();
        registry.add(FilterType::Tag, "test2", None);
        registry.add(FilterType::Tag, "test1", None);
        registry.add(FilterType::User, "42", None);

        assert_eq!(registry.list_keys(FilterType::Tag), ["test1", "test2"]);
        assert_eq!(registry.list_keys(FilterType::User), ["42"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn remove_unknown_key_is_noop() {
        let mut registry = SourceRegistry::default();
        registry.add(FilterType::Tag, "test2", None);
        registry.remove(FilterType::Tag, "test1");
        registry.remove(FilterType::User, "test2");
        assert_eq!(registry.list_keys(FilterType::Tag), ["test2"]);
    }

    #[test]
    fn refcount_keeps_source_until_last_remove() {
        let mut registry = SourceRegistry::default();
        for _ in 0..3 {
            registry.add(FilterType::Tag, "nature", None);
        }
        assert_eq!(registry.get(FilterType::Tag, "nature").unwrap().ref_count, 3);

        registry.remove(FilterType::Tag, "nature");
        registry.remove(FilterType::Tag, "nature");
        assert_eq!(registry.list_keys(FilterType::Tag), ["nature"]);

        registry.remove(FilterType::Tag, "nature");
        assert!(registry.is_empty());
    }

    #[test]
    fn retracking_starts_fresh() {
        let mut registry = SourceRegistry::default();
        registry.add(FilterType::Tag, "nature", Some("tok"));
        let first_generation = {
            let source = registry.get_mut(FilterType::Tag, "nature").unwrap();
            source.complete_fetch(Utc::now(), vec![MediaItem::new("1")]);
            source.generation
        };

        registry.remove(FilterType::Tag, "nature");
        registry.add(FilterType::Tag, "nature", None);

        let source = registry.get(FilterType::Tag, "nature").unwrap();
        assert!(source.recent.is_empty());
        assert!(source.credentials.is_empty());
        assert!(source.never_fetched());
        assert_ne!(source.generation, first_generation);
    }

    #[test]
    fn repeated_add_keeps_generation_and_pools_credentials() {
        let mut registry = SourceRegistry::default();
        registry.add(FilterType::User, "1", Some("A"));
        let generation = registry.get(FilterType::User, "1").unwrap().generation;
        registry.add(FilterType::User, "1", Some("B"));
        registry.add(FilterType::User, "1", None);

        let source = registry.get(FilterType::User, "1").unwrap();
        assert_eq!(source.generation, generation);
        assert_eq!(source.ref_count, 3);
        assert_eq!(source.credentials.iter().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn select_next_prefers_oldest_update() {
        let mut registry = SourceRegistry::default();
        registry.add(FilterType::Tag, "a", None);
        registry.add(FilterType::Tag, "b", None);
        registry.add(FilterType::Tag, "c", None);

        let now = Utc::now();
        registry.get_mut(FilterType::Tag, "a").unwrap().last_update = now;
        registry.get_mut(FilterType::Tag, "b").unwrap().last_update = now - Duration::seconds(10);
        registry.get_mut(FilterType::Tag, "c").unwrap().last_update = now - Duration::seconds(5);

        assert_eq!(registry.select_next(FilterType::Tag).unwrap().key, "b");
    }

    #[test]
    fn never_fetched_source_wins_and_ties_break_by_key() {
        let mut registry = SourceRegistry::default();
        registry.add(FilterType::Tag, "zebra", None);
        registry.add(FilterType::Tag, "apple", None);
        assert_eq!(registry.select_next(FilterType::Tag).unwrap().key, "apple");

        registry.get_mut(FilterType::Tag, "apple").unwrap().last_update = Utc::now();
        assert_eq!(registry.select_next(FilterType::Tag).unwrap().key, "zebra");
    }

    #[test]
    fn select_next_on_empty_type_is_none() {
        let mut registry = SourceRegistry::default();
        registry.add(FilterType::Tag, "a", None);
        assert!(registry.select_next(FilterType::User).is_none());
    }
}
