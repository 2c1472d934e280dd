//! Background polling for the unread-notification counter.
//!
//! The server has no push channel; the counter is refreshed on a fixed
//! interval and published through a watch channel. Poll failures are
//! logged and the previous value stands until the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::NotificationApi;
use crate::model::UnreadCount;

/// Handle to a running poll task. Dropping it does NOT stop the task;
/// call [`stop`](Self::stop).
pub struct NotificationPoller {
    rx: watch::Receiver<UnreadCount>,
    handle: JoinHandle<()>,
}

impl NotificationPoller {
    /// Spawn the poll loop. The first fetch happens immediately.
    pub fn spawn<A>(api: Arc<A>, interval: Duration) -> Self
    where
        A: NotificationApi + 'static,
    {
        let (tx, rx) = watch::channel(UnreadCount::default());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match api.unread_count().await {
                    Ok(count) => {
                        if tx.send(count).is_err() {
                            // Every receiver is gone; nothing left to notify.
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("notification poll failed: {}", e);
                    }
                }
            }
        });

        Self { rx, handle }
    }

    /// Subscribe to counter updates.
    pub fn subscribe(&self) -> watch::Receiver<UnreadCount> {
        self.rx.clone()
    }

    /// The most recently polled value.
    pub fn current(&self) -> UnreadCount {
        *self.rx.borrow()
    }

    /// Stop the poll loop.
    pub fn stop(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::error::ApiError;
    use crate::model::Notification;

    struct CountingApi {
        calls: AtomicU64,
    }

    #[async_trait]
    impl NotificationApi for CountingApi {
        async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(UnreadCount {
                unread: n,
                has_new: true,
            })
        }

        async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
            unimplemented!("not used in these tests")
        }

        async fn mark_notification_read(&self, _id: u64) -> Result<(), ApiError> {
            unimplemented!("not used in these tests")
        }

        async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
            unimplemented!("not used in these tests")
        }
    }

    #[tokio::test]
    async fn publishes_polled_counts() {
        let api = Arc::new(CountingApi {
            calls: AtomicU64::new(0),
        });
        let poller = NotificationPoller::spawn(api.clone(), Duration::from_millis(10));
        let mut rx = poller.subscribe();

        rx.changed().await.unwrap();
        let first = *rx.borrow();
        assert!(first.unread >= 1);
        assert!(first.has_new);

        rx.changed().await.unwrap();
        assert!(rx.borrow().unread > first.unread);

        poller.stop();
    }

    struct FailingApi;

    #[async_trait]
    impl NotificationApi for FailingApi {
        async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
            Err(ApiError::Network("down".to_string()))
        }

        async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
            unimplemented!("not used in these tests")
        }

        async fn mark_notification_read(&self, _id: u64) -> Result<(), ApiError> {
            unimplemented!("not used in these tests")
        }

        async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
            unimplemented!("not used in these tests")
        }
    }

    #[tokio::test]
    async fn poll_failures_keep_the_last_value() {
        let poller = NotificationPoller::spawn(Arc::new(FailingApi), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(poller.current(), UnreadCount::default());
        poller.stop();
    }
}
