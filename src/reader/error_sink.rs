//! Bounded, never-blocking error stream.

use std::sync::Arc;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::ReaderError;

/// Producer side of the error stream.
///
/// `push` never waits: when the stream is full or nobody listens the error
/// is dropped and logged instead.
#[derive(Debug, Clone)]
pub struct ErrorSink {
    /// Bounded stream to the consumer.
    tx: mpsc::Sender<ReaderError>,
    /// Errors that did not fit or had no listener.
    dropped: Arc<AtomicUsize>,
}

impl ErrorSink {
    /// Creates a sink retaining at most `capacity` undrained errors.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ReaderError>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, dropped: Arc::new(AtomicUsize::new(0)) }, rx)
    }

    /// Sends `error` if there is room, otherwise drops and logs it.
    pub fn push(&self, error: ReaderError) {
        match self.tx.try_send(error) {
            Ok(()) => {}
            Err(TrySendError::Full(error)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%error, "Error stream is full, dropping error");
            }
            Err(TrySendError::Closed(error)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%error, "Error stream is closed, dropping error");
            }
        }
    }

    /// Number of errors dropped so far.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}
