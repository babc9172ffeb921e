//! Async dispatch over `tokio::sync::mpsc`
//!
//! Capacity is reserved first and the request moves into the channel only
//! once a permit is held. Dropping the future mid-wait releases nothing but
//! the pending reservation, so the request is never half-sent.

use super::dispatcher::log_finished;
use super::{timeout_from_secs, DispatchResult, Dispatcher, Undelivered};
use crate::core::LogContext;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

impl Dispatcher {
    /// Async counterpart of [`send`](Dispatcher::send) for tokio channels.
    ///
    /// # Example
    ///
    /// ```
    /// use monitor_runtime::{Dispatcher, Logger};
    ///
    /// # #[tokio::main(flavor = "current_thread", start_paused = true)]
    /// # async fn main() {
    /// let dispatcher = Dispatcher::new(Logger::disabled());
    /// let (tx, mut rx) = tokio::sync::mpsc::channel(1);
    ///
    /// dispatcher.send_async(&tx, 1u32, 1).await.unwrap();
    /// let back = dispatcher.send_async(&tx, 2u32, 1).await.unwrap_err();
    /// assert_eq!(back.into_inner(), 2);
    /// assert_eq!(rx.recv().await, Some(1));
    /// # }
    /// ```
    pub async fn send_async<T>(
        &self,
        channel: &Sender<T>,
        request: T,
        timeout_secs: i64,
    ) -> DispatchResult<T> {
        self.dispatch_async(
            channel,
            request,
            timeout_from_secs(timeout_secs),
            LogContext::new().with_field("timeout_secs", timeout_secs),
        )
        .await
    }

    pub async fn send_timeout_async<T>(
        &self,
        channel: &Sender<T>,
        request: T,
        timeout: Duration,
    ) -> DispatchResult<T> {
        self.dispatch_async(
            channel,
            request,
            timeout,
            LogContext::new().with_field("timeout_secs", timeout),
        )
        .await
    }

    async fn dispatch_async<T>(
        &self,
        channel: &Sender<T>,
        request: T,
        timeout: Duration,
        context: LogContext,
    ) -> DispatchResult<T> {
        self.logger().info_with_context("dispatching request", context);
        let started = Instant::now();

        let outcome = deliver(channel, request, timeout).await;

        log_finished(self.logger(), outcome.is_ok(), started);
        outcome
    }
}

async fn deliver<T>(channel: &Sender<T>, request: T, timeout: Duration) -> DispatchResult<T> {
    if timeout.is_zero() {
        return match channel.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(request)) | Err(TrySendError::Closed(request)) => {
                Err(Undelivered(request))
            }
        };
    }

    match tokio::time::timeout(timeout, channel.reserve()).await {
        Ok(Ok(permit)) => {
            permit.send(request);
            Ok(())
        }
        // Receiver gone, or the budget ran out while waiting for room.
        Ok(Err(_)) | Err(_) => Err(Undelivered(request)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Logger;
    use tokio::sync::mpsc;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Logger::disabled())
    }

    #[tokio::test]
    async fn test_channel_with_room() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(dispatcher().send_async(&tx, "ok", 1).await.is_ok());
        assert_eq!(rx.recv().await, Some("ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_channel_times_out() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(0u8).await.unwrap();

        let started = tokio::time::Instant::now();
        let err = dispatcher().send_async(&tx, 1u8, 2).await.unwrap_err();

        assert_eq!(err.into_inner(), 1);
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(rx.recv().await, Some(0));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_zero_timeout_is_single_attempt() {
        let (tx, _rx) = mpsc::channel(1);
        let dispatcher = dispatcher();

        assert!(dispatcher.send_async(&tx, 1, 0).await.is_ok());
        assert_eq!(dispatcher.send_async(&tx, 2, 0).await.unwrap_err().into_inner(), 2);
        assert_eq!(dispatcher.send_async(&tx, 3, -1).await.unwrap_err().into_inner(), 3);
    }

    #[tokio::test]
    async fn test_room_freed_before_deadline() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(0).await.unwrap();

        let reader = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let first = rx.recv().await;
            let second = rx.recv().await;
            (first, second)
        });

        assert!(dispatcher()
            .send_timeout_async(&tx, 1, Duration::from_secs(5))
            .await
            .is_ok());
        assert_eq!(reader.await.unwrap(), (Some(0), Some(1)));
    }

    #[tokio::test]
    async fn test_closed_channel_returns_request() {
        let (tx, rx) = mpsc::channel::<String>(1);
        drop(rx);

        let err = dispatcher()
            .send_async(&tx, "orphan".to_string(), 5)
            .await
            .unwrap_err();
        assert_eq!(err.into_inner(), "orphan");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_dispatch_sends_nothing() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(0).await.unwrap();
        let dispatcher = dispatcher();

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            dispatcher.send_async(&tx, 1, 60),
        )
        .await;
        assert!(cancelled.is_err());

        assert_eq!(rx.recv().await, Some(0));
        assert!(rx.try_recv().is_err());
    }
}
