//! Recording [`ApiClient`] for scheduler and stream tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{ApiClient, Method, RequestOptions, Response};
use crate::error::{Result, StreamError};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub options: RequestOptions,
}

impl RecordedRequest {
    pub fn token(&self) -> Option<&str> {
        self.options.query_value("access_token")
    }
}

enum Reply {
    Body(Value),
    Status(u16),
}

#[derive(Default)]
struct Inner {
    requests: Vec<RecordedRequest>,
    queued: VecDeque<Reply>,
}

/// Replays queued replies in order, then `{ "data": [] }`.
#[derive(Clone, Default)]
pub struct MockClient {
    inner: Arc<Mutex<Inner>>,
    latency: Option<Duration>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply by `latency` (uses tokio time, so paused clocks apply).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn reply(&self, body: Value) -> &Self {
        self.inner.lock().queued.push_back(Reply::Body(body));
        self
    }

    pub fn fail(&self, status: u16) -> &Self {
        self.inner.lock().queued.push_back(Reply::Status(status));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().requests.len()
    }
}

#[async_trait]
impl ApiClient for MockClient {
    async fn request(&self, method: Method, path: &str, options: RequestOptions) -> Result<Response> {
        let reply = {
            let mut inner = self.inner.lock();
            inner.requests.push(RecordedRequest {
                method,
                path: path.to_string(),
                options,
            });
            match inner.queued.pop_front() {
                Some(reply) => reply,
                None => Reply::Body(serde_json::json!({ "data": [] })),
            }
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match reply {
            Reply::Body(body) => Ok(Response::new(200, body)),
            Reply::Status(status) => Err(StreamError::Http {
                status,
                body: String::new(),
            }),
        }
    }
}
