//! Round-robin credential pool for one source.

use std::collections::VecDeque;

/// Hands out the credentials registered for a source in strict rotation,
/// spreading rate-limit consumption evenly: every token is used once before
/// any token is used twice.
#[derive(Debug, Clone, Default)]
pub struct TokenRotator {
    pool: VecDeque<String>,
}

impl TokenRotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.pool.push_back(token.into());
    }

    /// Take the front token and move it to the back.  `None` when the pool is
    /// empty; the caller then falls back to the stream default.
    pub fn next_credential(&mut self) -> Option<String> {
        let token = self.pool.pop_front()?;
        self.pool.push_back(token.clone());
        Some(token)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Tokens in the order they will be handed out.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pool.iter().map(String::as_str)
    }
}
