//! The consumer-facing stream.
//!
//! [`InstagramStream`] is a [`futures::Stream`] of new media for every tracked
//! tag and followed user.  It is lazy: nothing is fetched until the consumer
//! polls, and a poll that finds no buffered item is the demand signal that
//! lets the scheduler start the next fetch cycle.
//!
//! ```no_run
//! use futures::StreamExt;
//! use instagram_stream::{ClientConfig, InstagramStream, StreamConfig};
//!
//! # async fn run() -> instagram_stream::Result<()> {
//! let mut stream = InstagramStream::connect(
//!     ClientConfig::default(),
//!     StreamConfig::default().with_access_token("token"),
//! )?;
//! stream.track("nature").follow("1234");
//!
//! while let Some(event) = stream.next().await {
//!     match event {
//!         Ok(item) => println!("{}", item.id),
//!         Err(err) => eprintln!("fetch failed: {err}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Failed fetches arrive as `Err` items and never end the stream; it only
//! ends after [`close`](InstagramStream::close).  A [`StreamHandle`] can
//! change what is tracked from any task or thread while the stream is being
//! consumed elsewhere.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;

use crate::client::{ApiClient, InstagramClient};
use crate::config::{ClientConfig, StreamConfig};
use crate::error::Result;
use crate::scheduler::{Cycle, Scheduler, SchedulerState, Shared};
use crate::source::{FilterType, MediaItem, Source};

/// Cloneable handle for changing what a stream tracks.
///
/// Every mutating method returns `&Self` so calls chain.  After the stream is
/// closed or dropped, mutations are ignored.
#[derive(Clone)]
pub struct StreamHandle {
    shared: Arc<Mutex<Shared>>,
}

impl StreamHandle {
    pub fn track(&self, tag: &str) -> &Self {
        self.shared.lock().add(FilterType::Tag, tag, None);
        self
    }

    /// Track `tag`, adding `token` to that tag's credential rotation.
    pub fn track_with_token(&self, tag: &str, token: &str) -> &Self {
        self.shared.lock().add(FilterType::Tag, tag, Some(token));
        self
    }

    pub fn track_all<I, S>(&self, tags: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut shared = self.shared.lock();
        for tag in tags {
            shared.add(FilterType::Tag, tag.as_ref(), None);
        }
        drop(shared);
        self
    }

    pub fn untrack(&self, tag: &str) -> &Self {
        self.shared.lock().remove(FilterType::Tag, tag);
        self
    }

    pub fn untrack_all<I, S>(&self, tags: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut shared = self.shared.lock();
        for tag in tags {
            shared.remove(FilterType::Tag, tag.as_ref());
        }
        drop(shared);
        self
    }

    pub fn follow(&self, user_id: &str) -> &Self {
        self.shared.lock().add(FilterType::User, user_id, None);
        self
    }

    /// Follow `user_id`, adding `token` to that user's credential rotation.
    pub fn follow_with_token(&self, user_id: &str, token: &str) -> &Self {
        self.shared.lock().add(FilterType::User, user_id, Some(token));
        self
    }

    pub fn follow_all<I, S>(&self, user_ids: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut shared = self.shared.lock();
        for user_id in user_ids {
            shared.add(FilterType::User, user_id.as_ref(), None);
        }
        drop(shared);
        self
    }

    pub fn unfollow(&self, user_id: &str) -> &Self {
        self.shared.lock().remove(FilterType::User, user_id);
        self
    }

    pub fn unfollow_all<I, S>(&self, user_ids: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut shared = self.shared.lock();
        for user_id in user_ids {
            shared.remove(FilterType::User, user_id.as_ref());
        }
        drop(shared);
        self
    }

    /// Replace the stream-level credential used for sources without tokens.
    pub fn set_access_token(&self, token: &str) -> &Self {
        self.shared.lock().access_token = Some(token.to_string());
        self
    }

    /// Tracked tags, in key order.
    pub fn tracking(&self) -> Vec<String> {
        self.shared.lock().registry.list_keys(FilterType::Tag)
    }

    /// Followed user ids, in key order.
    pub fn following(&self) -> Vec<String> {
        self.shared.lock().registry.list_keys(FilterType::User)
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().registry.is_empty()
    }

    /// Snapshot of one source's fetch state.
    pub fn source(&self, filter_type: FilterType, key: &str) -> Option<Source> {
        self.shared.lock().registry.get(filter_type, key).cloned()
    }

    /// End the stream.  Pending timers are cancelled and the consumer's
    /// next poll returns `None`.
    pub fn close(&self) {
        self.shared.lock().close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

/// Ordered, de-duplicated stream of new media for the tracked sources.
pub struct InstagramStream {
    handle: StreamHandle,
    scheduler: Scheduler,
    buffer: VecDeque<MediaItem>,
}

impl InstagramStream {
    pub fn new<C>(client: C, config: StreamConfig) -> Self
    where
        C: ApiClient + 'static,
    {
        Self::with_client(Arc::new(client), config)
    }

    pub fn with_client(client: Arc<dyn ApiClient>, config: StreamConfig) -> Self {
        let shared = Arc::new(Mutex::new(Shared::new(&config)));
        let scheduler = Scheduler::new(Arc::clone(&shared), client, &config);
        Self {
            handle: StreamHandle { shared },
            scheduler,
            buffer: VecDeque::new(),
        }
    }

    /// Build the stream on an [`InstagramClient`].  The stream's default
    /// credential falls back to the client's access token.
    pub fn connect(client_config: ClientConfig, mut config: StreamConfig) -> Result<Self> {
        if config.access_token.is_none() {
            config.access_token = client_config.access_token.clone();
        }
        let client = InstagramClient::new(client_config)?;
        Ok(Self::new(client, config))
    }

    /// A handle that can change tracking from elsewhere.
    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        self.scheduler.client()
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn track(&self, tag: &str) -> &Self {
        self.handle.track(tag);
        self
    }

    pub fn track_with_token(&self, tag: &str, token: &str) -> &Self {
        self.handle.track_with_token(tag, token);
        self
    }

    pub fn track_all<I, S>(&self, tags: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.handle.track_all(tags);
        self
    }

    pub fn untrack(&self, tag: &str) -> &Self {
        self.handle.untrack(tag);
        self
    }

    pub fn untrack_all<I, S>(&self, tags: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.handle.untrack_all(tags);
        self
    }

    pub fn follow(&self, user_id: &str) -> &Self {
        self.handle.follow(user_id);
        self
    }

    pub fn follow_with_token(&self, user_id: &str, token: &str) -> &Self {
        self.handle.follow_with_token(user_id, token);
        self
    }

    pub fn follow_all<I, S>(&self, user_ids: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.handle.follow_all(user_ids);
        self
    }

    pub fn unfollow(&self, user_id: &str) -> &Self {
        self.handle.unfollow(user_id);
        self
    }

    pub fn unfollow_all<I, S>(&self, user_ids: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.handle.unfollow_all(user_ids);
        self
    }

    pub fn set_access_token(&self, token: &str) -> &Self {
        self.handle.set_access_token(token);
        self
    }

    pub fn tracking(&self) -> Vec<String> {
        self.handle.tracking()
    }

    pub fn following(&self) -> Vec<String> {
        self.handle.following()
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_empty()
    }

    /// Stop polling, drop any in-flight request, and end the stream.
    pub fn close(&mut self) {
        self.handle.close();
        self.scheduler.shutdown();
        self.buffer.clear();
    }
}

impl Stream for InstagramStream {
    type Item = Result<MediaItem>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.handle.is_closed() {
                this.scheduler.shutdown();
                this.buffer.clear();
                return Poll::Ready(None);
            }
            if let Some(item) = this.buffer.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }
            match this.scheduler.poll_cycle(cx) {
                Poll::Ready(Cycle::Delivered(items)) => this.buffer.extend(items),
                Poll::Ready(Cycle::Failed(err)) => return Poll::Ready(Some(Err(err))),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for InstagramStream {
    fn drop(&mut self) {
        self.handle.close();
    }
}
