//! Loading/data/error state for a single async request.
//!
//! Every `begin` issues a ticket from a monotonically increasing generation
//! counter. Only the newest ticket may complete the state, so a slow response
//! to an earlier request can never overwrite a later one.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::api::ApiError;

/// Proof that a request was started; hand it back to `complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    generation: u64,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            generation: 0,
        }
    }
}

impl<T> FetchState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request: clears data and error, sets `loading`.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.data = None;
        self.error = None;
        self.loading = true;
        Ticket(self.generation)
    }

    /// Settle the request. Returns `false` if the ticket was superseded.
    pub fn complete(&mut self, ticket: Ticket, result: Result<T, ApiError>) -> bool {
        if ticket.0 != self.generation {
            debug!(ticket = ticket.0, current = self.generation, "Discarding stale response");
            return false;
        }

        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(e) => {
                self.data = None;
                self.error = Some(e.message());
            }
        }
        self.loading = false;
        true
    }

    /// Back to idle. In-flight tickets become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.data = None;
        self.error = None;
        self.loading = false;
    }

    pub fn is_idle(&self) -> bool {
        !self.loading && self.data.is_none() && self.error.is_none()
    }
}

/// Shared `FetchState` for async callers.
#[derive(Debug)]
pub struct FetchHandle<T> {
    state: Arc<Mutex<FetchState<T>>>,
}

impl<T> Clone for FetchHandle<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for FetchHandle<T> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FetchState::default())),
        }
    }
}

impl<T: Clone> FetchHandle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op`, tracking it in the shared state. Returns the data on
    /// success, `None` on failure or if a newer call superseded this one.
    pub async fn execute<F, Fut>(&self, op: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let ticket = self.with_state(|s| s.begin())?;
        let result = op().await;
        let data = result.as_ref().ok().cloned();
        let applied = self.with_state(|s| s.complete(ticket, result))?;
        if applied {
            data
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> FetchState<T> {
        self.with_state(|s| s.clone()).unwrap_or_default()
    }

    pub fn reset(&self) {
        self.with_state(|s| s.reset());
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FetchState<T>) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut guard| f(&mut guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(message: &str) -> ApiError {
        ApiError::Status {
            status: 500,
            message: message.to_string(),
            errors: None,
        }
    }

    #[test]
    fn test_begin_sets_loading_and_clears() {
        let mut state: FetchState<u32> = FetchState::new();
        assert!(state.is_idle());

        let t = state.begin();
        state.complete(t, Ok(1));
        let _ = state.begin();
        assert!(state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_complete_sets_exactly_one_of_data_or_error() {
        let mut state: FetchState<u32> = FetchState::new();
        let t = state.begin();
        assert!(state.complete(t, Ok(5)));
        assert_eq!(state.data, Some(5));
        assert!(state.error.is_none());
        assert!(!state.loading);

        let t = state.begin();
        assert!(state.complete(t, Err(api_error("Server exploded"))));
        assert!(state.data.is_none());
        assert_eq!(state.error.as_deref(), Some("Server exploded"));
        assert!(!state.loading);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut state: FetchState<&str> = FetchState::new();
        let first = state.begin();
        let second = state.begin();

        assert!(state.complete(second, Ok("newer")));
        assert!(!state.complete(first, Ok("older")));
        assert_eq!(state.data, Some("newer"));
    }

    #[test]
    fn test_reset_invalidates_in_flight() {
        let mut state: FetchState<u8> = FetchState::new();
        let t = state.begin();
        state.reset();
        assert!(!state.complete(t, Ok(1)));
        assert!(state.is_idle());
    }

    #[tokio::test]
    async fn test_handle_execute_success_and_failure() {
        let handle: FetchHandle<Vec<i32>> = FetchHandle::new();

        let data = handle.execute(|| async { Ok(vec![1, 2]) }).await;
        assert_eq!(data, Some(vec![1, 2]));
        let snap = handle.snapshot();
        assert_eq!(snap.data, Some(vec![1, 2]));
        assert!(!snap.loading);

        let data = handle.execute(|| async { Err(api_error("Nope")) }).await;
        assert_eq!(data, None);
        let snap = handle.snapshot();
        assert_eq!(snap.error.as_deref(), Some("Nope"));
        assert!(snap.data.is_none());
    }

    #[tokio::test]
    async fn test_handle_loading_visible_during_request() {
        let handle: FetchHandle<u8> = FetchHandle::new();
        let observer = handle.clone();

        let data = handle
            .execute(|| async move {
                assert!(observer.snapshot().loading);
                Ok(9)
            })
            .await;
        assert_eq!(data, Some(9));
        assert!(!handle.snapshot().loading);
    }
}
