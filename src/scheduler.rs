//! Pull-driven polling scheduler.
//!
//! The scheduler decides which tracked source to fetch next, with which
//! credential, and when.  It never runs on its own: every transition happens
//! inside `Scheduler::poll_cycle`, which the stream calls from `poll_next`.
//!
//! ```text
//!            demand, registry non-empty
//!   ┌──────┐ ─────────────────────────► ┌──────────┐
//!   │ Idle │                            │ Fetching │
//!   └──────┘ ◄───────────────────────── └──────────┘
//!      ▲      done, registry empty         │    ▲
//!      │                                   │    │ timer elapsed
//!      │ registry emptied              done│    │
//!      │ (timer cancelled)                 ▼    │
//!      └─────────────────────────────── ┌───────┐
//!                                       │ Armed │
//!                                       └───────┘
//! ```
//!
//! At most one request is outstanding at a time: the only place a request is
//! created is the `Idle → Fetching` edge, and `poll_cycle` takes `&mut self`.
//!
//! Registry mutations from [`StreamHandle`](crate::StreamHandle)s go through
//! `Shared` under a single mutex that is never held across an `.await`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::time::{sleep, sleep_until, Instant, Sleep};
use tracing::{debug, warn};

use crate::client::{ApiClient, Method, RequestOptions, Response};
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::source::{FilterType, MediaItem, SourceRegistry};

/// State shared between the scheduler and every handle of one stream.
#[derive(Debug)]
pub(crate) struct Shared {
    pub registry: SourceRegistry,
    /// Credential used when a source's pool is empty.
    pub access_token: Option<String>,
    /// Bumped to cancel the pending timer; an armed timer from an older
    /// epoch is a no-op even if it has already elapsed.
    pub timer_epoch: u64,
    pub closed: bool,
    waker: Option<Waker>,
}

impl Shared {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            registry: SourceRegistry::new(config.recency_window),
            access_token: config.access_token.clone(),
            timer_epoch: 0,
            closed: false,
            waker: None,
        }
    }

    pub fn add(&mut self, filter_type: FilterType, key: &str, credential: Option<&str>) {
        if self.closed {
            return;
        }
        let was_empty = self.registry.is_empty();
        self.registry.add(filter_type, key, credential);
        if was_empty {
            self.wake();
        }
    }

    pub fn remove(&mut self, filter_type: FilterType, key: &str) {
        if self.closed {
            return;
        }
        self.registry.remove(filter_type, key);
        if self.registry.is_empty() {
            self.cancel_timer();
        }
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.cancel_timer();
    }

    fn cancel_timer(&mut self) {
        self.timer_epoch += 1;
        self.wake();
    }

    fn wake(&mut self) {
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }

    fn register(&mut self, waker: &Waker) {
        match &self.waker {
            Some(current) if current.will_wake(waker) => {}
            _ => self.waker = Some(waker.clone()),
        }
    }
}

/// Observable phase of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing tracked, or waiting for the consumer to ask for data.
    Idle,
    /// Waiting out the inter-fetch delay.
    Armed,
    /// One request is outstanding.
    Fetching,
}

/// What a finished fetch cycle produced.
#[derive(Debug)]
pub(crate) enum Cycle {
    /// Items not delivered before, in response order.  May be empty.
    Delivered(Vec<MediaItem>),
    Failed(StreamError),
}

/// The source a request was issued for.
#[derive(Debug, Clone)]
struct FetchTarget {
    filter_type: FilterType,
    key: String,
    generation: u64,
}

enum Phase {
    Idle,
    Armed {
        timer: Pin<Box<Sleep>>,
        epoch: u64,
    },
    Fetching {
        target: FetchTarget,
        request: BoxFuture<'static, Result<Response>>,
    },
}

pub(crate) struct Scheduler {
    shared: Arc<Mutex<Shared>>,
    client: Arc<dyn ApiClient>,
    interval: Duration,
    /// When the last request finished; the next one may not start before
    /// `last_completed + interval`, even if the timer was cancelled meanwhile.
    last_completed: Option<Instant>,
    count: u32,
    path_prefix: String,
    /// Round-robin cursor into [`FilterType::ALL`].
    next_filter_type: usize,
    phase: Phase,
}

impl Scheduler {
    pub(crate) fn new(
        shared: Arc<Mutex<Shared>>,
        client: Arc<dyn ApiClient>,
        config: &StreamConfig,
    ) -> Self {
        Self {
            shared,
            client,
            interval: config.interval,
            last_completed: None,
            count: config.count,
            path_prefix: config.path_prefix.clone(),
            next_filter_type: 0,
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.phase {
            Phase::Idle => SchedulerState::Idle,
            Phase::Armed { .. } => SchedulerState::Armed,
            Phase::Fetching { .. } => SchedulerState::Fetching,
        }
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        &self.client
    }

    /// Drop any pending timer and in-flight request.
    pub(crate) fn shutdown(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Drive the state machine until a fetch cycle completes.
    ///
    /// Calling this is the consumer's demand signal.  Returns `Pending` while
    /// armed, while a request is in flight, and while nothing is tracked.
    pub(crate) fn poll_cycle(&mut self, cx: &mut Context<'_>) -> Poll<Cycle> {
        self.shared.lock().register(cx.waker());

        loop {
            match &mut self.phase {
                Phase::Idle => {
                    if let Some(armed) = self.wait_out_interval() {
                        self.phase = armed;
                        continue;
                    }
                    match self.start_fetch() {
                        Some(fetching) => self.phase = fetching,
                        None => return Poll::Pending,
                    }
                }
                Phase::Armed { timer, epoch } => {
                    let cancelled = {
                        let shared = self.shared.lock();
                        *epoch != shared.timer_epoch || shared.registry.is_empty()
                    };
                    if cancelled {
                        debug!("pending fetch cancelled");
                        self.phase = Phase::Idle;
                        continue;
                    }
                    match timer.as_mut().poll(cx) {
                        Poll::Ready(()) => self.phase = Phase::Idle,
                        Poll::Pending => return Poll::Pending,
                    }
                }
                Phase::Fetching { target, request } => {
                    let result = match request.as_mut().poll(cx) {
                        Poll::Ready(result) => result,
                        Poll::Pending => return Poll::Pending,
                    };
                    let target = target.clone();
                    self.phase = Phase::Idle;
                    self.last_completed = Some(Instant::now());
                    let cycle = self.complete(target, result);
                    self.rearm();
                    return Poll::Ready(cycle);
                }
            }
        }
    }

    /// An `Armed` phase for the rest of the interval, if the last request
    /// finished less than one interval ago and there is something to fetch.
    fn wait_out_interval(&self) -> Option<Phase> {
        let deadline = self.last_completed? + self.interval;
        if deadline <= Instant::now() {
            return None;
        }
        let shared = self.shared.lock();
        if shared.closed || shared.registry.is_empty() {
            return None;
        }
        Some(Phase::Armed {
            timer: Box::pin(sleep_until(deadline)),
            epoch: shared.timer_epoch,
        })
    }

    /// `Idle → Fetching`: pick a source, a credential, and issue the request.
    fn start_fetch(&mut self) -> Option<Phase> {
        let mut shared = self.shared.lock();
        if shared.closed || shared.registry.is_empty() {
            return None;
        }
        let default_token = shared.access_token.clone();

        // An empty filter type must not stall the cycle: fall through to the
        // other one, advancing the cursor on every attempt.
        for _ in 0..FilterType::ALL.len() {
            let filter_type = FilterType::ALL[self.next_filter_type];
            self.next_filter_type = (self.next_filter_type + 1) % FilterType::ALL.len();

            let Some(source) = shared.registry.select_next(filter_type) else {
                continue;
            };
            let token = source.credentials.next_credential().or_else(|| default_token.clone());
            let target = FetchTarget {
                filter_type,
                key: source.key.clone(),
                generation: source.generation,
            };

            let path = format!("{}{}", self.path_prefix, filter_type.path(&target.key));
            let mut options = RequestOptions::default();
            match token {
                Some(token) => options = options.query("access_token", token),
                None => warn!(%filter_type, key = %target.key, "no credential for source, requesting without access_token"),
            }
            options = options.query("count", self.count.to_string());

            debug!(%filter_type, key = %target.key, %path, "fetching");
            let client = Arc::clone(&self.client);
            let request = async move { client.request(Method::GET, &path, options).await }.boxed();
            return Some(Phase::Fetching { target, request });
        }
        None
    }

    /// Apply a finished request to the source it was issued for.
    fn complete(&mut self, target: FetchTarget, result: Result<Response>) -> Cycle {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(filter_type = %target.filter_type, key = %target.key, error = %err, "fetch failed");
                return Cycle::Failed(err);
            }
        };

        if let Some(rate_limit) = response.rate_limit {
            debug!(remaining = rate_limit.remaining, limit = rate_limit.limit, "rate limit");
        }

        let items = match MediaItem::from_response_body(&response.body) {
            Ok(items) => items,
            Err(err) => {
                warn!(filter_type = %target.filter_type, key = %target.key, error = %err, "unexpected response body");
                return Cycle::Failed(err.into());
            }
        };

        let mut shared = self.shared.lock();
        let Some(source) = shared
            .registry
            .get_mut(target.filter_type, &target.key)
            .filter(|source| source.generation == target.generation)
        else {
            debug!(filter_type = %target.filter_type, key = %target.key, "source untracked during fetch, discarding results");
            return Cycle::Delivered(Vec::new());
        };

        let received = items.len();
        let fresh = source.complete_fetch(Utc::now(), items);
        debug!(
            filter_type = %target.filter_type,
            key = %target.key,
            received,
            fresh = fresh.len(),
            "fetch complete"
        );
        Cycle::Delivered(fresh)
    }

    /// `Fetching → Armed`, or `→ Idle` if the registry emptied meanwhile.
    fn rearm(&mut self) {
        let shared = self.shared.lock();
        self.phase = if shared.closed || shared.registry.is_empty() {
            Phase::Idle
        } else {
            Phase::Armed {
                timer: Box::pin(sleep(self.interval)),
                epoch: shared.timer_epoch,
            }
        };
    }
}
