//! Polling subscription to a relay's new messages.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use tracing::{debug, warn};

use desu_core::Result;
use desu_core::protocol::StoredMessage;
use desu_core::traits::Relay;

use crate::cursor::Cursor;

/// Default pause between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Stream of messages as they arrive on a relay.
pub struct MessageStream {
    inner: Pin<Box<dyn Stream<Item = Result<StoredMessage>> + Send>>,
}

impl MessageStream {
    fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StoredMessage>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for MessageStream {
    type Item = Result<StoredMessage>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Poll `relay` every `interval` and yield each message received at or
/// after `since`, once, in receive order.
///
/// A failed poll is yielded as an error and polling carries on; drop the
/// stream to stop.
pub fn subscribe<R>(relay: Arc<R>, since: i64, interval: Duration) -> MessageStream
where
    R: Relay + ?Sized + 'static,
{
    let stream = async_stream::stream! {
        let mut cursor = Cursor::new(since);

        loop {
            match cursor.fetch(relay.as_ref()).await {
                Ok(messages) => {
                    if !messages.is_empty() {
                        debug!(
                            fresh = messages.len(),
                            min_time = cursor.min_time(),
                            "Polled new messages"
                        );
                    }
                    for message in messages {
                        yield Ok(message);
                    }
                }
                Err(e) => {
                    warn!(error = %e, url = %relay.url(), "Poll failed");
                    yield Err(e);
                }
            }

            tokio::time::sleep(interval).await;
        }
    };

    MessageStream::new(stream)
}
