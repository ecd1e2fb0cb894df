//! Relaying a model stream to one consumer
//!
//! A spawned task forwards upstream chunks, in arrival order, through a
//! bounded channel. The consumer side is a [`ChatStream`]; dropping it or
//! cancelling its token stops the relay and drops the upstream stream.
//! Upstream errors become one final in-band text fragment.

use crate::generation::TextStream;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

/// A cooperative cancellation token.
///
/// The consumer sets the token; the relay checks it while waiting for the
/// next upstream chunk. Chunks already delivered remain delivered.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenState::default()),
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Text fragment appended when the upstream stream fails
pub fn stream_error_fragment(message: &str) -> String {
    format!("\n\n[Stream error: {}]", message)
}

/// Ordered text fragments of one streamed chat reply.
///
/// Dropping the stream cancels the relay.
pub struct ChatStream {
    rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
}

impl ChatStream {
    /// Token that stops the relay when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn next_fragment(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Stream for ChatStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the relay task for `upstream`.
///
/// `on_complete` receives the full text once upstream ends normally; it
/// runs before the consumer sees end-of-stream. It does not run after an
/// error or cancellation.
pub fn spawn_relay<F, Fut>(upstream: TextStream, buffer: usize, on_complete: F) -> ChatStream
where
    F: FnOnce(String) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(buffer.max(1));
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        let mut upstream = upstream;
        let mut full = String::new();

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => {
                    debug!("chat stream cancelled, dropping upstream");
                    return;
                }
                next = upstream.next_chunk() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    full.push_str(&chunk);
                    if tx.send(chunk).await.is_err() {
                        debug!("chat stream consumer gone");
                        return;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "chat stream failed");
                    let _ = tx.send(stream_error_fragment(&e.to_string())).await;
                    return;
                }
                None => break,
            }
        }

        on_complete(full).await;
    });

    ChatStream { rx, cancel }
}
