//! Single-producer/single-consumer event pipe with a terminal value.
//!
//! A run owns the [`EventSink`] half and the caller consumes the
//! [`EventStream`] half. `push` is non-blocking and order-preserving;
//! `end(value)` seals the pipe, after which further pushes are discarded.
//! The sealed value travels on a separate completion channel so it can be
//! awaited independently of event consumption.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use log::debug;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::events::AgentEvent;
use crate::model::Message;

/// Producer half; cheap to clone so nested emitters can push.
pub struct EventSink<E, R> {
    events: mpsc::UnboundedSender<E>,
    seal: Arc<Mutex<Option<oneshot::Sender<R>>>>,
}

impl<E, R> Clone for EventSink<E, R> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            seal: self.seal.clone(),
        }
    }
}

impl<E, R> EventSink<E, R> {
    /// Append an event. No-op once the stream is sealed or the consumer is
    /// gone.
    pub fn push(&self, event: E) {
        if self.seal.lock().is_none() {
            debug!("event stream sealed, discarding push");
            return;
        }
        let _ = self.events.send(event);
    }

    /// Seal the stream with its terminal value. Idempotent; only the first
    /// call delivers.
    pub fn end(&self, result: R) {
        if let Some(tx) = self.seal.lock().take() {
            let _ = tx.send(result);
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.lock().is_none()
    }
}

/// Consumer half: an ordered event sequence plus the sealed value.
pub struct EventStream<E, R> {
    events: mpsc::UnboundedReceiver<E>,
    result: oneshot::Receiver<R>,
}

impl<E, R> EventStream<E, R> {
    /// Next event, or `None` once the producer is done and the buffer is
    /// drained.
    pub async fn next(&mut self) -> Option<E> {
        self.events.recv().await
    }

    /// Await the sealed value. `None` if the producer went away without
    /// sealing.
    pub async fn result(self) -> Option<R> {
        self.result.await.ok()
    }

    /// Drain every event, then return them with the sealed value.
    pub async fn collect(mut self) -> (Vec<E>, Option<R>) {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        let result = self.result.await.ok();
        (events, result)
    }
}

impl<E, R> Stream for EventStream<E, R> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        self.events.poll_recv(cx)
    }
}

/// Create a connected sink/stream pair.
pub fn channel<E, R>() -> (EventSink<E, R>, EventStream<E, R>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (seal_tx, seal_rx) = oneshot::channel();
    (
        EventSink {
            events: events_tx,
            seal: Arc::new(Mutex::new(Some(seal_tx))),
        },
        EventStream {
            events: events_rx,
            result: seal_rx,
        },
    )
}

/// Sink specialization used by agent runs.
pub type AgentEventSink = EventSink<AgentEvent, Vec<Message>>;
/// Stream specialization returned to agent-run callers.
pub type AgentEventStream = EventStream<AgentEvent, Vec<Message>>;
