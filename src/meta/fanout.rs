//! The ordered fan-out primitive.
//!
//! Runs N independent tasks concurrently and joins their results in the
//! original slot order, so out-of-order completion cannot reorder merged
//! lists. The shared cancellation token aborts the whole join with no
//! partial delivery; the deadline turns a hang into a `Timeout`.

use crate::error::{Error, Result};
use futures::future::{BoxFuture, join_all};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run `tasks` concurrently; resolve to their results in input order.
///
/// - Cancellation wins over everything: `Err(Cancelled)`, results dropped.
/// - `deadline` bounds the whole batch: `Err(Timeout)` on expiry.
pub async fn fan_out<T>(
    tasks: Vec<BoxFuture<'_, T>>,
    cancel: &CancellationToken,
    deadline: Duration,
    stage: &'static str,
) -> Result<Vec<T>> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        joined = tokio::time::timeout(deadline, join_all(tasks)) => {
            joined.map_err(|_| Error::Timeout { stage, deadline })
        }
    }
}
