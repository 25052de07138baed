use std::collections::HashSet;

use ratatui::widgets::ListState;

use instagram_stream::MediaItem;

pub struct App {
    /// De-duplicated, newest-first items.
    pub items: Vec<MediaItem>,
    /// The same media can reach us through a tag and a followed user.
    seen: HashSet<String>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last poll status message.
    pub status: String,
    /// What is being tracked, shown in the list title.
    pub sources: String,
}

impl App {
    pub fn new(sources: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            sources: sources.into(),
        }
    }

    /// Merge newly-streamed items, de-duplicate, and re-sort newest first.
    /// Items without a `created_time` sink to the bottom.
    pub fn merge_items(&mut self, new_items: Vec<MediaItem>) -> usize {
        let before = self.items.len();
        for item in new_items {
            if self.seen.insert(item.id.clone()) {
                self.items.push(item);
            }
        }
        self.items
            .sort_by(|a, b| b.created_time().cmp(&a.created_time()));
        self.items.len() - before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.list_state.select(None);
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        self.select_down_by(1);
    }

    pub fn select_previous(&mut self) {
        self.select_up_by(1);
    }

    pub fn select_down_by(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_add(n).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_up_by(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(n),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}
