//! Bounded FIFO conduit between task units and the collector.
//!
//! A thin layer over [`tokio::sync::mpsc`] that fixes the item type and exposes
//! the blocking and non-blocking halves separately. Producers that outpace the
//! collector wait in [`CompletionSender::send`] until there is room again.

use tokio::sync::mpsc;

use crate::{
    error::{SendError, TrySendError},
    task::CompletionSignal,
};

/// Creates a channel holding at most `capacity` undelivered signals.
///
/// # Panics
///
/// Panics when `capacity` is zero. [`crate::RunConfig::validate`] rejects that
/// before a run starts.
pub fn completion_channel(capacity: usize) -> (CompletionSender, CompletionReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        CompletionSender { inner: sender },
        CompletionReceiver {
            inner: receiver,
            closed: false,
        },
    )
}

#[derive(Debug, Clone)]
pub struct CompletionSender {
    inner: mpsc::Sender<CompletionSignal>,
}

impl CompletionSender {
    /// Waits for room in the buffer, then enqueues the signal.
    ///
    /// Fails as soon as the receiver is closed or dropped, including while
    /// waiting for room.
    pub async fn send(&self, signal: CompletionSignal) -> Result<(), SendError> {
        self.inner
            .send(signal)
            .await
            .map_err(|mpsc::error::SendError(signal)| SendError(signal))
    }

    pub fn try_send(&self, signal: CompletionSignal) -> Result<(), TrySendError> {
        self.inner.try_send(signal).map_err(|error| match error {
            mpsc::error::TrySendError::Full(signal) => TrySendError::Full(signal),
            mpsc::error::TrySendError::Closed(signal) => TrySendError::Closed(signal),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Outcome of a non-blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecv {
    Signal(CompletionSignal),
    // Nothing buffered right now, but producers are still around.
    Empty,
    // Nothing buffered and nothing more will ever arrive.
    Closed,
}

#[derive(Debug)]
pub struct CompletionReceiver {
    inner: mpsc::Receiver<CompletionSignal>,
    // Set by an explicit `close`; dropped senders are tracked by mpsc itself.
    closed: bool,
}

impl CompletionReceiver {
    /// Waits for the next signal. `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<CompletionSignal> {
        self.inner.recv().await
    }

    pub fn try_recv(&mut self) -> TryRecv {
        match self.inner.try_recv() {
            Ok(signal) => TryRecv::Signal(signal),
            Err(mpsc::error::TryRecvError::Empty) if self.closed => TryRecv::Closed,
            Err(mpsc::error::TryRecvError::Empty) => TryRecv::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => TryRecv::Closed,
        }
    }

    /// Stops accepting new signals. Signals already buffered can still be received.
    pub fn close(&mut self) {
        self.closed = true;
        self.inner.close();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.max_capacity()
    }
}
