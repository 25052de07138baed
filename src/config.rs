//! Tunables for the stream and the HTTP client.
//!
//! Both structs are plain data with sensible defaults; the `with_*` methods
//! make one-off overrides read well at the call site:
//!
//! ```
//! use std::time::Duration;
//! use instagram_stream::StreamConfig;
//!
//! let config = StreamConfig::default()
//!     .with_interval(Duration::from_secs(2))
//!     .with_access_token("token");
//! assert_eq!(config.count, 50);
//! ```

use std::time::Duration;

/// Minimum delay between the end of one fetch and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(720);

/// Page size requested from the API, and the size of each source's recency window.
pub const DEFAULT_COUNT: u32 = 50;
pub const DEFAULT_RECENCY_WINDOW: usize = 50;

pub const DEFAULT_HOST: &str = "https://api.instagram.com";

/// Settings that shape the polling loop.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Fixed inter-fetch delay.
    pub interval: Duration,
    /// Value of the `count` query parameter.
    pub count: u32,
    /// Number of recently delivered ids remembered per source.
    pub recency_window: usize,
    /// Prefix for the media path templates (`/v1/tags/{key}/media/recent`).
    pub path_prefix: String,
    /// Stream-level credential used when a source has no pooled token.
    pub access_token: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            count: DEFAULT_COUNT,
            recency_window: DEFAULT_RECENCY_WINDOW,
            path_prefix: "/v1".to_string(),
            access_token: None,
        }
    }
}

impl StreamConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_recency_window(mut self, capacity: usize) -> Self {
        self.recency_window = capacity;
        self
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// Settings for [`InstagramClient`](crate::InstagramClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and authority of the API, without a trailing slash.
    pub host: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            client_id: None,
            client_secret: None,
            access_token: None,
            timeout: Duration::from_secs(30),
            user_agent: concat!("instagram-stream/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}
