//! Deadline-bounded delivery of requests onto caller-owned channels
//!
//! A [`Dispatcher`] offers one request to a channel and gives up when the
//! time budget runs out. A request is either received exactly once or handed
//! back to the caller inside [`Undelivered`]; it is never dropped or
//! duplicated. No thread, task or timer outlives a call.

pub mod dispatcher;
#[cfg(feature = "async-dispatch")]
pub mod async_dispatcher;

pub use dispatcher::Dispatcher;

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// `Ok(())` when the request was handed to the channel
pub type DispatchResult<T> = Result<(), Undelivered<T>>;

/// A request that was not delivered before its deadline.
///
/// Owns the request again so the caller can drop, retry or escalate it.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Undelivered<T>(pub(crate) T);

impl<T> Undelivered<T> {
    /// Take the request back
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn get_ref(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Undelivered<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Undelivered { .. }")
    }
}

impl<T> fmt::Display for Undelivered<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request not delivered before the deadline")
    }
}

impl<T> Error for Undelivered<T> {}

/// Whole seconds to a budget; negative values mean "do not wait"
pub fn timeout_from_secs(timeout_secs: i64) -> Duration {
    Duration::from_secs(u64::try_from(timeout_secs).unwrap_or(0))
}
