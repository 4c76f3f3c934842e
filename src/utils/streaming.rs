//! Stream adapters for lazily produced result sets.

use futures_util::stream::{FusedStream, Stream};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream that hands out at most a fixed number of successful items.
///
/// Once the budget is spent the inner stream is never polled again, so a paginating
/// producer does not fetch pages nobody asked for. Errors pass through without
/// consuming the budget.
pub struct Bounded<S> {
    stream: S,
    remaining: Option<usize>,
}

impl<S> Bounded<S> {
    /// Limit `stream` to `limit` items; `None` leaves it unbounded.
    pub fn new(stream: S, limit: Option<usize>) -> Self {
        Self {
            stream,
            remaining: limit,
        }
    }

    /// Items that may still be yielded, if bounded.
    pub fn remaining(&self) -> Option<usize> {
        self.remaining
    }
}

impl<S, T, E> Stream for Bounded<S>
where
    S: Stream<Item = Result<T, E>> + Unpin,
{
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.remaining == Some(0) {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.stream).poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
                Poll::Ready(Some(Ok(item)))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.stream.size_hint();
        match self.remaining {
            Some(n) => (lower.min(n), Some(upper.map_or(n, |u| u.min(n)))),
            None => (lower, upper),
        }
    }
}

impl<S, T, E> FusedStream for Bounded<S>
where
    S: FusedStream<Item = Result<T, E>> + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.remaining == Some(0) || self.stream.is_terminated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::{self, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_bounded_stops_at_limit() {
        let items = stream::iter((0..10).map(Ok::<_, ()>));
        let taken: Vec<_> = Bounded::new(items, Some(3)).collect().await;

        assert_eq!(taken, vec![Ok(0), Ok(1), Ok(2)]);
    }

    #[tokio::test]
    async fn test_bounded_unbounded_passes_everything() {
        let items = stream::iter((0..4).map(Ok::<_, ()>));
        let taken: Vec<_> = Bounded::new(items, None).collect().await;

        assert_eq!(taken.len(), 4);
    }

    #[tokio::test]
    async fn test_bounded_does_not_poll_past_limit() {
        let produced = AtomicUsize::new(0);
        let items = stream::iter(0..100)
            .map(|n| {
                produced.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(n)
            })
            .boxed();

        let taken: Vec<_> = Bounded::new(items, Some(5)).collect().await;

        assert_eq!(taken.len(), 5);
        assert_eq!(produced.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_bounded_errors_do_not_consume_budget() {
        let items = stream::iter(vec![Ok(1), Err("boom"), Ok(2), Ok(3)]);
        let mut bounded = Bounded::new(items, Some(2));

        assert_eq!(bounded.next().await, Some(Ok(1)));
        assert_eq!(bounded.next().await, Some(Err("boom")));
        assert_eq!(bounded.next().await, Some(Ok(2)));
        assert_eq!(bounded.next().await, None);
        assert_eq!(bounded.remaining(), Some(0));
    }

    #[tokio::test]
    async fn test_bounded_zero_yields_nothing() {
        let items = stream::iter((0..3).map(Ok::<_, ()>));
        let taken: Vec<_> = Bounded::new(items, Some(0)).collect().await;

        assert!(taken.is_empty());
    }
}
