//! instagram-stream: push-like updates from Instagram's pull-only media API.
//!
//! ## Architecture overview
//!
//! ```text
//!  track/follow ┌──────────────────┐ select_next ┌───────────────┐
//!  ───────────► │  SourceRegistry  │ ◄────────── │   Scheduler   │
//!               │ (refcounts, ids, │             │ Idle / Armed  │
//!               │  token rotation) │             │  / Fetching   │
//!               └──────────────────┘             └───────┬───────┘
//!                                                        │ request()
//!   poll_next   ┌──────────────────┐   new items ┌───────▼───────┐
//!  ◄─────────── │  InstagramStream │ ◄────────── │   ApiClient   │
//!               └──────────────────┘             └───────────────┘
//! ```
//!
//! * **`source`**: tracked sources: [`SourceRegistry`], per-source
//!   [`TokenRotator`] and [`RecencyWindow`], and the [`MediaItem`] type.
//! * **`scheduler`**: picks the next source (strict tag/user alternation,
//!   oldest first), enforces the inter-fetch delay, and applies results.
//! * **`stream`**: the [`futures::Stream`] the consumer pulls from, plus
//!   [`StreamHandle`] for changing tracking from other tasks.
//! * **`client`**: the [`ApiClient`] seam and the reqwest-backed
//!   [`InstagramClient`] with its OAuth helpers.
//! * **`config`** / **`error`**: tunables and the error taxonomy.
//!
//! All state lives in the stream instance; nothing survives a restart.

pub mod client;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod source;
pub mod stream;

pub use client::{
    AccessToken, ApiClient, AuthParams, AuthorizationOptions, InstagramClient, Method, RateLimit,
    RequestOptions, Response,
};
pub use config::{ClientConfig, StreamConfig};
pub use error::{Result, StreamError};
pub use scheduler::SchedulerState;
pub use source::{FilterType, MediaItem, RecencyWindow, Source, SourceRegistry, TokenRotator};
pub use stream::{InstagramStream, StreamHandle};
