//! Request-scoped context and bounded, order-preserving fan-out.
//!
//! - `RequestContext` carries a correlation id and a cancellation token across
//!   port boundaries.
//! - `map_ordered` runs an async function over a list of inputs with bounded
//!   concurrency and returns outputs in input order.
//!
//! Cancellation is cooperative: inputs that have not started are skipped, and
//! in-flight work is aborted when the request is cancelled.

use crate::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A correlation identifier used for logging and telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation identifier from caller input.
    ///
    /// The value is trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::from(trimmed)))
    }

    /// Create a new request id, unique within this process.
    #[must_use]
    pub fn new_request_id() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(format!("req_{n}")))
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Request-scoped context passed across boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a new request context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context with an auto-generated `req_*` id.
    #[must_use]
    pub fn new_request() -> Self {
        Self::new(CorrelationId::new_request_id())
    }

    /// Derive a context that is cancelled with its parent but can also be
    /// cancelled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            cancellation: self.cancellation.child_token(),
        }
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Returns true if the request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this request and every child context.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Await cancellation.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Return a cancellation error when cancelled, including operation metadata.
    pub fn ensure_not_cancelled(&self, operation: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(cancelled_error(operation));
        }
        Ok(())
    }
}

pub(crate) fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

/// Apply an async function over inputs with bounded concurrency.
///
/// Outputs are returned in input order regardless of completion order. The
/// first failure aborts the remaining work and is returned as-is.
pub async fn map_ordered<TIn, TOut, Fut, F>(
    ctx: &RequestContext,
    concurrency: usize,
    inputs: Vec<TIn>,
    f: F,
) -> Result<Vec<TOut>>
where
    TIn: Send + 'static,
    TOut: Send + 'static,
    Fut: Future<Output = Result<TOut>> + Send + 'static,
    F: Fn(TIn, usize) -> Fut + Send + Sync + 'static,
{
    ctx.ensure_not_cancelled("map_ordered")?;
    if concurrency == 0 {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "concurrency must be a positive number",
        ));
    }

    let count = inputs.len();
    let permits = Arc::new(Semaphore::new(concurrency));
    let f = Arc::new(f);
    let mut tasks = JoinSet::new();

    for (index, input) in inputs.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let f = Arc::clone(&f);
        let ctx = ctx.clone();
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| cancelled_error("map_ordered.acquire"))?;
            ctx.ensure_not_cancelled("map_ordered.task")?;
            f(input, index).await.map(|out| (index, out))
        });
    }

    let mut slots: Vec<Option<TOut>> = (0..count).map(|_| None).collect();
    loop {
        let joined = tokio::select! {
            () = ctx.cancelled() => {
                tasks.abort_all();
                return Err(cancelled_error("map_ordered.await"));
            }
            joined = tasks.join_next() => joined,
        };
        let Some(joined) = joined else {
            break;
        };

        let (index, out) = match joined {
            Ok(Ok(pair)) => pair,
            Ok(Err(error)) => {
                tasks.abort_all();
                return Err(error);
            },
            Err(join_error) => {
                tasks.abort_all();
                return Err(ErrorEnvelope::unexpected(
                    ErrorCode::internal(),
                    format!("map_ordered task failed: {join_error}"),
                    ErrorClass::NonRetriable,
                ));
            },
        };

        match slots.get_mut(index) {
            Some(slot) => *slot = Some(out),
            None => {
                return Err(ErrorEnvelope::invariant(
                    ErrorCode::internal(),
                    "map_ordered index out of bounds",
                ));
            },
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| {
                ErrorEnvelope::invariant(ErrorCode::internal(), "map_ordered missing result")
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn correlation_ids_are_prefixed_and_unique() {
        let a = CorrelationId::new_request_id();
        let b = CorrelationId::new_request_id();
        assert!(a.as_str().starts_with("req_"));
        assert_ne!(a, b);
        assert!(CorrelationId::parse("   ").is_err());
    }

    #[test]
    fn child_context_follows_parent_cancellation() {
        let parent = RequestContext::new_request();
        let child = parent.child();
        assert_eq!(child.correlation_id(), parent.correlation_id());

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let second = parent.child();
        parent.cancel();
        assert!(second.is_cancelled());
        assert!(second.ensure_not_cancelled("op").is_err());
    }

    #[tokio::test]
    async fn map_ordered_keeps_input_order() -> Result<()> {
        let ctx = RequestContext::new_request();
        let out = map_ordered(&ctx, 2, vec![1u64, 2, 3, 4], |value, index| async move {
            // Later inputs finish first.
            let delay_ms = (4 - index as u64) * 10;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(value * 2)
        })
        .await?;

        assert_eq!(out, vec![2, 4, 6, 8]);
        Ok(())
    }

    #[tokio::test]
    async fn map_ordered_bounds_concurrency() -> Result<()> {
        let ctx = RequestContext::new_request();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        map_ordered(&ctx, 2, (0..8).collect::<Vec<u32>>(), move |_, _| {
            let (active, peak) = (Arc::clone(&a), Arc::clone(&p));
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await?;

        assert!(peak.load(Ordering::SeqCst) <= 2);
        Ok(())
    }

    #[tokio::test]
    async fn map_ordered_returns_first_error() {
        let ctx = RequestContext::new_request();
        let result = map_ordered(&ctx, 4, vec![1u32, 2, 3], |value, _| async move {
            if value == 2 {
                return Err(ErrorEnvelope::expected(ErrorCode::not_found(), "missing"));
            }
            Ok(value)
        })
        .await;

        assert!(matches!(result, Err(ref error) if error.is_not_found()));
    }

    #[tokio::test]
    async fn map_ordered_handles_empty_input() -> Result<()> {
        let ctx = RequestContext::new_request();
        let out: Vec<u32> = map_ordered(&ctx, 1, Vec::<u32>::new(), |value, _| async move {
            Ok(value)
        })
        .await?;
        assert!(out.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn map_ordered_stops_on_cancellation() {
        let ctx = RequestContext::new_request();
        let canceller = ctx.clone();
        let task = tokio::spawn(async move {
            map_ordered(&ctx, 1, vec![1u32, 2], |value, _| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(value)
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
        let result = task.await.expect("join");
        assert!(matches!(result, Err(ref error) if error.is_cancelled()));
    }
}
