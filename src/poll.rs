//! Bridges the async stream to the synchronous UI thread.
//!
//! A task on the tokio runtime pulls from the [`InstagramStream`] and forwards
//! every event over an [`mpsc`] channel the UI drains on each tick.  Pulling
//! is what drives polling, so the stream only fetches while this task runs.

use std::sync::mpsc;

use futures::StreamExt;
use tokio::runtime::Runtime;

use instagram_stream::{InstagramStream, MediaItem};

/// Messages sent from the stream task to the UI thread.
pub enum PollMsg {
    /// A new media item.
    Item(MediaItem),
    /// A fetch failed with this error description.
    Error(String),
}

/// Spawn the consumer task on `runtime`.
///
/// The task stops when the stream ends or the receiver is dropped, which
/// drops (and thereby closes) the stream.
pub fn spawn(runtime: &Runtime, mut stream: InstagramStream) -> mpsc::Receiver<PollMsg> {
    let (tx, rx) = mpsc::channel();

    runtime.spawn(async move {
        while let Some(event) = stream.next().await {
            let msg = match event {
                Ok(item) => PollMsg::Item(item),
                Err(e) => PollMsg::Error(e.to_string()),
            };
            if tx.send(msg).is_err() {
                return;
            }
        }
    });

    rx
}
