//! Explicit cancellation passed to every I/O-issuing operation.
//!
//! A [`CancelSource`] is owned by the outermost entry point (the binary fires
//! it from its signal handler). Everything below receives a [`CancelToken`]
//! by reference and races its work against [`CancelToken::cancelled`].
//! No process-wide state is involved.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::ApiError;

/// The firing side of a cancellation channel.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    /// Creates a source that has not fired.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Returns a token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
            deadline: None,
        }
    }

    /// Fires the source. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The observing side of a cancellation channel, with an optional deadline.
///
/// Cheap to clone; clones observe the same source.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx, deadline: None }
    }

    /// Returns a token that also fires once `timeout` has elapsed.
    ///
    /// An earlier existing deadline is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };

        Self {
            rx: self.rx.clone(),
            deadline: Some(deadline),
        }
    }

    /// Returns `true` if the source fired or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the token is cancelled.
    ///
    /// A token whose source was dropped without firing only resolves on its
    /// deadline, or never if it has none.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let signalled = async move {
            if rx.wait_for(|fired| *fired).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signalled => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signalled.await,
        }
    }

    /// Runs `work` unless the token fires first, in which case `work` is
    /// dropped (aborting any request it has in flight) and
    /// [`ApiError::cancelled`] is returned.
    pub async fn guard<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.is_cancelled() {
            return Err(ApiError::cancelled());
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(ApiError::cancelled()),
            result = work => result,
        }
    }
}
