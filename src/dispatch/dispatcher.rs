//! Blocking dispatcher over `crossbeam-channel`

use super::{timeout_from_secs, DispatchResult, Undelivered};
use crate::core::{LogContext, Logger};
use crossbeam_channel::Sender;
use std::time::{Duration, Instant};

/// Hands requests to a channel within a time budget.
///
/// The dispatcher holds only its logger. Channels are borrowed for the
/// duration of one call and never closed, resized or retained.
///
/// # Example
///
/// ```
/// use monitor_runtime::{Dispatcher, Logger};
/// use crossbeam_channel::bounded;
///
/// let dispatcher = Dispatcher::new(Logger::disabled());
/// let (tx, rx) = bounded(1);
///
/// assert!(dispatcher.send(&tx, "first", 1).is_ok());
///
/// // The buffer is full and nobody is reading: the request comes back.
/// let undelivered = dispatcher.send(&tx, "second", 0).unwrap_err();
/// assert_eq!(undelivered.into_inner(), "second");
/// assert_eq!(rx.recv().unwrap(), "first");
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    logger: Logger,
}

impl Dispatcher {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Offer `request` to `channel` for at most `timeout_secs` seconds.
    ///
    /// Returns `Ok(())` once a receiver has the request. On timeout the
    /// request is returned in [`Undelivered`]. A budget of zero or less makes
    /// a single attempt that succeeds only if the channel can take the request
    /// without waiting.
    ///
    /// A channel whose receivers are all gone can never take the request; it
    /// is reported as undelivered straight away.
    pub fn send<T>(&self, channel: &Sender<T>, request: T, timeout_secs: i64) -> DispatchResult<T> {
        self.dispatch(
            channel,
            request,
            timeout_from_secs(timeout_secs),
            LogContext::new().with_field("timeout_secs", timeout_secs),
        )
    }

    /// Same as [`send`](Self::send) with a sub-second budget
    pub fn send_timeout<T>(
        &self,
        channel: &Sender<T>,
        request: T,
        timeout: Duration,
    ) -> DispatchResult<T> {
        self.dispatch(
            channel,
            request,
            timeout,
            LogContext::new().with_field("timeout_secs", timeout),
        )
    }

    fn dispatch<T>(
        &self,
        channel: &Sender<T>,
        request: T,
        timeout: Duration,
        context: LogContext,
    ) -> DispatchResult<T> {
        self.logger.info_with_context("dispatching request", context);
        let started = Instant::now();

        let outcome = deliver(channel, request, timeout);

        log_finished(&self.logger, outcome.is_ok(), started);
        outcome
    }
}

fn deliver<T>(channel: &Sender<T>, request: T, timeout: Duration) -> DispatchResult<T> {
    if timeout.is_zero() {
        return channel
            .try_send(request)
            .map_err(|e| Undelivered(e.into_inner()));
    }

    match Instant::now().checked_add(timeout) {
        Some(deadline) => channel
            .send_deadline(request, deadline)
            .map_err(|e| Undelivered(e.into_inner())),
        // Past the end of the clock; no deadline can fire first.
        None => channel.send(request).map_err(|e| Undelivered(e.into_inner())),
    }
}

/// Second record of a dispatch; a timeout is an expected outcome, so it
/// stays at `info`.
pub(super) fn log_finished(logger: &Logger, delivered: bool, started: Instant) {
    logger.info_with_context(
        "dispatch finished",
        LogContext::new()
            .with_field("delivered", delivered)
            .with_field("elapsed_ms", started.elapsed().as_millis() as u64),
    );
}
