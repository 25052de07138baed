//! Per-source recency window of delivered item ids.

use std::collections::VecDeque;

use crate::config::DEFAULT_RECENCY_WINDOW;

use super::MediaItem;

/// Bounded, insertion-ordered history of the ids a source has delivered.
///
/// The API returns overlapping pages between polls; anything whose id is in
/// the window is dropped silently.  Memory per source stays bounded no matter
/// how much a source produces.
#[derive(Debug, Clone)]
pub struct RecencyWindow {
    ids: VecDeque<String>,
    capacity: usize,
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECENCY_WINDOW)
    }
}

impl RecencyWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    /// Keep the items whose id is new, in their original order, and record
    /// those ids.  The window is trimmed to its capacity once the whole batch
    /// has been processed, so ids repeated inside one batch collapse too.
    pub fn filter_and_record(&mut self, items: Vec<MediaItem>) -> Vec<MediaItem> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if self.contains(&item.id) {
                continue;
            }
            self.ids.push_back(item.id.clone());
            kept.push(item);
        }

        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
        kept
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[&str]) -> Vec<MediaItem> {
        ids.iter().map(|id| MediaItem::new(*id)).collect()
    }

    fn ids_of(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn same_batch_twice_yields_nothing_new() {
        let mut window = RecencyWindow::default();
        let first = window.filter_and_record(items(&["1", "2"]));
        assert_eq!(ids_of(&first), ["1", "2"]);

        let second = window.filter_and_record(items(&["1", "2"]));
        assert!(second.is_empty());
        assert_eq!(window.ids().collect::<Vec<_>>(), ["1", "2"]);
    }

    #[test]
    fn overlapping_page_keeps_only_new_items_in_order() {
        let mut window = RecencyWindow::default();
        window.filter_and_record(items(&["1", "2", "3"]));

        let kept = window.filter_and_record(items(&["4", "2", "5", "3"]));
        assert_eq!(ids_of(&kept), ["4", "5"]);
    }

    #[test]
    fn duplicates_within_one_batch_collapse() {
        let mut window = RecencyWindow::default();
        let kept = window.filter_and_record(items(&["a", "a", "b"]));
        assert_eq!(ids_of(&kept), ["a", "b"]);
    }

    #[test]
    fn never_exceeds_capacity_and_evicts_oldest() {
        let mut window = RecencyWindow::default();
        let batch: Vec<String> = (0..120).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = batch.iter().map(String::as_str).collect();

        let kept = window.filter_and_record(items(&refs));
        assert_eq!(kept.len(), 120);
        assert_eq!(window.len(), 50);
        assert_eq!(window.ids().next(), Some("70"));
        assert!(!window.contains("69"));
        assert!(window.contains("119"));

        // Evicted ids count as new again.
        let again = window.filter_and_record(items(&["0"]));
        assert_eq!(ids_of(&again), ["0"]);
        assert_eq!(window.len(), 50);
    }

    #[test]
    fn custom_capacity() {
        let mut window = RecencyWindow::with_capacity(2);
        window.filter_and_record(items(&["1", "2", "3"]));
        assert_eq!(window.ids().collect::<Vec<_>>(), ["2", "3"]);
    }
}
