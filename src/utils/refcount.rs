//! Reference-counted sharing of a lazily opened session.
//!
//! [`RefCounted`] wraps a [`SessionProvider`] so that nested or concurrent users of
//! the same client share one underlying session (for HTTP, one connection pool).
//! The session is opened when the count goes from zero to one and closed when the
//! last holder releases it; the order of releases, not acquisitions, decides when
//! teardown happens.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Opens and closes the resource guarded by a [`RefCounted`] wrapper.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The shared resource handed to every holder.
    type Session: Send + Sync;

    /// Error raised while opening or closing the resource.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Perform the real resource acquisition.
    async fn open(&self) -> Result<Self::Session, Self::Error>;

    /// Tear the resource down after the last holder released it.
    async fn close(&self, session: Arc<Self::Session>) -> Result<(), Self::Error>;
}

/// Errors raised by [`RefCounted`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `release` was called more times than `acquire`.
    #[error("session released without a matching acquire")]
    UnbalancedRelease,

    /// The provider failed to open the session.
    #[error("failed to open session: {0}")]
    Open(#[source] BoxError),

    /// The provider failed to close the session.
    #[error("failed to close session: {0}")]
    Close(#[source] BoxError),
}

#[derive(Debug)]
struct RefState<S> {
    count: usize,
    session: Option<Arc<S>>,
}

impl<S> RefState<S> {
    fn reset(&mut self) {
        self.count = 0;
        self.session = None;
    }
}

/// A session shared by reference count.
pub struct RefCounted<P: SessionProvider> {
    provider: P,
    state: Mutex<RefState<P::Session>>,
}

impl<P: SessionProvider> RefCounted<P> {
    /// Wrap a provider; nothing is opened until the first [`acquire`](Self::acquire).
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: Mutex::new(RefState {
                count: 0,
                session: None,
            }),
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Enter the session, opening it if this is the first holder.
    ///
    /// The state lock is held across the open, so concurrent first entries still
    /// open the resource once. If opening fails the wrapper is reset to its initial
    /// state and the error is returned.
    pub async fn acquire(&self) -> Result<Arc<P::Session>, SessionError> {
        let mut state = self.state.lock().await;

        let session = match (&state.session, state.count) {
            (Some(session), count) if count > 0 => Arc::clone(session),
            _ => match self.provider.open().await {
                Ok(session) => {
                    debug!("Opened shared session");
                    let session = Arc::new(session);
                    state.session = Some(Arc::clone(&session));
                    session
                }
                Err(err) => {
                    state.reset();
                    return Err(SessionError::Open(Box::new(err)));
                }
            },
        };

        state.count += 1;
        debug!(holders = state.count, "Acquired session");
        Ok(session)
    }

    /// Leave the session, closing it if this was the last holder.
    pub async fn release(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;

        if state.count == 0 {
            return Err(SessionError::UnbalancedRelease);
        }

        state.count -= 1;
        debug!(holders = state.count, "Released session");
        if state.count > 0 {
            return Ok(());
        }

        let Some(session) = state.session.take() else {
            return Ok(());
        };
        if let Err(err) = self.provider.close(session).await {
            state.reset();
            return Err(SessionError::Close(Box::new(err)));
        }
        debug!("Closed shared session");
        Ok(())
    }

    /// The open session, if any holder currently has it.
    pub async fn current(&self) -> Option<Arc<P::Session>> {
        self.state.lock().await.session.clone()
    }

    /// Number of current holders.
    pub async fn refcount(&self) -> usize {
        self.state.lock().await.count
    }
}

impl<P: SessionProvider + std::fmt::Debug> std::fmt::Debug for RefCounted<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefCounted")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct MockError(&'static str);

    #[derive(Debug, Default)]
    struct MockProvider {
        opened: AtomicUsize,
        closed: AtomicUsize,
        fail_open: AtomicBool,
        fail_close: AtomicBool,
    }

    #[async_trait]
    impl SessionProvider for MockProvider {
        type Session = usize;
        type Error = MockError;

        async fn open(&self) -> Result<usize, MockError> {
            let n = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            if self.fail_open.load(Ordering::SeqCst) {
                return Err(MockError("Mock enter failure"));
            }
            Ok(n)
        }

        async fn close(&self, _session: Arc<usize>) -> Result<(), MockError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            if self.fail_close.load(Ordering::SeqCst) {
                return Err(MockError("Mock exit failure"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrent_entries_open_once() {
        let shared = RefCounted::new(MockProvider::default());
        let shared_ref = &shared;

        let use_session = || async move {
            let shared = shared_ref;
            shared.acquire().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            shared.release().await.unwrap();
        };
        tokio::join!(use_session(), use_session(), use_session());

        assert_eq!(shared.provider().opened.load(Ordering::SeqCst), 1);
        assert_eq!(shared.provider().closed.load(Ordering::SeqCst), 1);
        assert_eq!(shared.refcount().await, 0);
        assert!(shared.current().await.is_none());
    }

    #[tokio::test]
    async fn test_spawned_entries_share_session() {
        let shared = Arc::new(RefCounted::new(MockProvider::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    let session = shared.acquire().await.unwrap();
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    shared.release().await.unwrap();
                    *session
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        assert_eq!(shared.provider().opened.load(Ordering::SeqCst), 1);
        assert_eq!(shared.provider().closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_waits_for_last_release() {
        let shared = RefCounted::new(MockProvider::default());

        shared.acquire().await.unwrap();
        shared.acquire().await.unwrap();
        shared.release().await.unwrap();

        assert_eq!(shared.provider().closed.load(Ordering::SeqCst), 0);
        assert!(shared.current().await.is_some());

        shared.release().await.unwrap();
        assert_eq!(shared.provider().closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nested_entries() {
        let shared = RefCounted::new(MockProvider::default());

        let outer = shared.acquire().await.unwrap();
        assert_eq!(shared.refcount().await, 1);
        let middle = shared.acquire().await.unwrap();
        assert_eq!(shared.refcount().await, 2);
        let inner = shared.acquire().await.unwrap();
        assert_eq!(shared.refcount().await, 3);
        assert!(Arc::ptr_eq(&outer, &middle) && Arc::ptr_eq(&middle, &inner));

        for _ in 0..3 {
            shared.release().await.unwrap();
        }
        assert_eq!(shared.provider().opened.load(Ordering::SeqCst), 1);
        assert_eq!(shared.provider().closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_resets_state() {
        let shared = RefCounted::new(MockProvider::default());
        shared.provider().fail_open.store(true, Ordering::SeqCst);

        let err = shared.acquire().await.unwrap_err();
        assert!(matches!(err, SessionError::Open(_)));
        assert!(err.to_string().contains("Mock enter failure"));
        assert_eq!(shared.refcount().await, 0);
        assert!(shared.current().await.is_none());

        shared.provider().fail_open.store(false, Ordering::SeqCst);
        shared.acquire().await.unwrap();
        assert_eq!(shared.refcount().await, 1);
    }

    #[tokio::test]
    async fn test_close_failure_resets_state() {
        let shared = RefCounted::new(MockProvider::default());
        shared.provider().fail_close.store(true, Ordering::SeqCst);

        shared.acquire().await.unwrap();
        let err = shared.release().await.unwrap_err();

        assert!(matches!(err, SessionError::Close(_)));
        assert!(err.to_string().contains("Mock exit failure"));
        assert_eq!(shared.refcount().await, 0);
        assert!(shared.current().await.is_none());
    }

    #[tokio::test]
    async fn test_release_without_acquire() {
        let shared = RefCounted::new(MockProvider::default());

        let err = shared.release().await.unwrap_err();
        assert!(matches!(err, SessionError::UnbalancedRelease));
        assert_eq!(shared.provider().closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reopen_after_close() {
        let shared = RefCounted::new(MockProvider::default());

        let first = shared.acquire().await.unwrap();
        shared.release().await.unwrap();
        let second = shared.acquire().await.unwrap();
        shared.release().await.unwrap();

        assert_eq!((*first, *second), (1, 2));
        assert_eq!(shared.provider().closed.load(Ordering::SeqCst), 2);
    }
}
