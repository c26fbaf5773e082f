//! Bounded waiting for backend calls: every request gets a deadline and
//! observes the cancellation token of whoever issued it.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct RequestBounds {
    timeout: Duration,
    cancel: CancellationToken,
}

impl RequestBounds {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// Same deadline, cancelled together with `self` or on its own.
    pub fn child(&self) -> Self {
        Self {
            timeout: self.timeout,
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn run<T, F>(&self, request: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, request) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(self.timeout)),
            },
        }
    }
}

impl Default for RequestBounds {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT, CancellationToken::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_request_times_out() {
        let bounds = RequestBounds::new(Duration::from_secs(5), CancellationToken::new());
        let result: ClientResult<()> = bounds
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ClientError::Timeout(d)) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn cancelled_parent_cancels_child_requests() {
        let parent = RequestBounds::default();
        let child = parent.child();
        parent.cancel();
        let result: ClientResult<u8> = child.run(std::future::pending()).await;
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelling_child_leaves_parent_usable() {
        let parent = RequestBounds::default();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
        let value = parent.run(async { Ok(7u8) }).await.expect("parent still live");
        assert_eq!(value, 7);
    }

    #[test]
    fn default_bounds_use_default_timeout() {
        let bounds = RequestBounds::default();
        assert_eq!(bounds.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(!bounds.is_cancelled());
    }
}
