//! Keyed request cache backing the two data hooks.
//!
//! One entry per (record kind, username). At most one request per key is
//! in flight; a completed result, success or failure, stays fresh for
//! [`STALE_AFTER`] and is refetched on the first read after it expires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::models::{Repository, UserProfile};

/// How long a completed fetch stays fresh. There is no automatic retry,
/// so a cached failure also waits out the window.
pub const STALE_AFTER: Duration = Duration::from_secs(60);

/// What the presentation layer sees for one cache key.
#[derive(Debug, Clone)]
pub enum RequestState<T> {
    /// No request lifecycle for this key (or the key is empty).
    Idle,
    /// A request for this key is in flight.
    Pending,
    /// The fetch failed; the error is kept until the entry goes stale.
    Failed(Arc<FetchError>),
    /// A validated record, fresh within the staleness window.
    Ready(T),
}

enum Slot<T> {
    Pending,
    Failed { error: Arc<FetchError>, at: Instant },
    Ready { value: T, at: Instant },
}

pub struct Store<T> {
    ttl: Duration,
    slots: HashMap<String, Slot<T>>,
}

impl<T: Clone> Store<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: HashMap::new(),
        }
    }

    /// True when the caller must issue the fetch for this key: nothing is
    /// cached, or the cached completion has gone stale. Marks the key
    /// pending, so concurrent callers coalesce onto one in-flight request.
    pub fn begin(&mut self, key: &str) -> bool {
        let fresh = match self.slots.get(key) {
            Some(Slot::Pending) => true,
            Some(Slot::Failed { at, .. }) | Some(Slot::Ready { at, .. }) => {
                at.elapsed() < self.ttl
            }
            None => false,
        };
        if fresh {
            return false;
        }
        self.slots.insert(key.to_owned(), Slot::Pending);
        true
    }

    /// Records the outcome of the fetch issued after [`Store::begin`].
    pub fn complete(&mut self, key: &str, result: Result<T, FetchError>) {
        let slot = match result {
            Ok(value) => Slot::Ready {
                value,
                at: Instant::now(),
            },
            Err(error) => Slot::Failed {
                error: Arc::new(error),
                at: Instant::now(),
            },
        };
        self.slots.insert(key.to_owned(), slot);
    }

    /// Current state for a key. The empty key is the idle hook; an expired
    /// completion also reads as idle so the next `begin` refetches.
    pub fn state(&self, key: &str) -> RequestState<T> {
        if key.is_empty() {
            return RequestState::Idle;
        }
        match self.slots.get(key) {
            None => RequestState::Idle,
            Some(Slot::Pending) => RequestState::Pending,
            Some(Slot::Failed { error, at }) if at.elapsed() < self.ttl => {
                RequestState::Failed(error.clone())
            }
            Some(Slot::Ready { value, at }) if at.elapsed() < self.ttl => {
                RequestState::Ready(value.clone())
            }
            Some(_) => RequestState::Idle,
        }
    }

    /// Drops a cached completion so the next read refetches.
    #[allow(dead_code)] // manual invalidation; not wired to a UI action yet
    pub fn invalidate(&mut self, key: &str) {
        self.slots.remove(key);
    }
}

/// Both hooks share one cache, keyed by record kind then username.
pub struct RequestCache {
    pub users: Store<UserProfile>,
    pub repos: Store<Vec<Repository>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self {
            users: Store::new(STALE_AFTER),
            repos: Store::new(STALE_AFTER),
        }
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn store(ttl: Duration) -> Store<u32> {
        Store::new(ttl)
    }

    #[test]
    fn empty_key_reads_idle() {
        let s = store(STALE_AFTER);
        assert!(matches!(s.state(""), RequestState::Idle));
    }

    #[test]
    fn first_begin_issues_the_fetch_and_marks_pending() {
        let mut s = store(STALE_AFTER);
        assert!(s.begin("octocat"));
        assert!(matches!(s.state("octocat"), RequestState::Pending));
    }

    #[test]
    fn in_flight_requests_coalesce() {
        let mut s = store(STALE_AFTER);
        assert!(s.begin("octocat"));
        assert!(!s.begin("octocat"));
        assert!(!s.begin("octocat"));
    }

    #[test]
    fn fresh_success_is_not_refetched() {
        let mut s = store(STALE_AFTER);
        assert!(s.begin("octocat"));
        s.complete("octocat", Ok(7));
        assert!(!s.begin("octocat"));
        assert!(matches!(s.state("octocat"), RequestState::Ready(7)));
    }

    #[test]
    fn fresh_failure_is_not_retried() {
        let mut s = store(STALE_AFTER);
        assert!(s.begin("ghost"));
        s.complete(
            "ghost",
            Err(ValidationError::single("login", "missing").into()),
        );
        assert!(!s.begin("ghost"));
        assert!(matches!(s.state("ghost"), RequestState::Failed(_)));
    }

    #[test]
    fn stale_entries_are_refetched() {
        let mut s = store(Duration::ZERO);
        assert!(s.begin("octocat"));
        s.complete("octocat", Ok(7));
        assert!(matches!(s.state("octocat"), RequestState::Idle));
        assert!(s.begin("octocat"));
    }

    #[test]
    fn distinct_keys_have_independent_lifecycles() {
        let mut s = store(STALE_AFTER);
        assert!(s.begin("octocat"));
        s.complete("octocat", Ok(1));
        assert!(s.begin("torvalds"));
        assert!(matches!(s.state("octocat"), RequestState::Ready(1)));
        assert!(matches!(s.state("torvalds"), RequestState::Pending));
    }

    #[test]
    fn invalidate_forces_a_refetch() {
        let mut s = store(STALE_AFTER);
        assert!(s.begin("octocat"));
        s.complete("octocat", Ok(1));
        s.invalidate("octocat");
        assert!(matches!(s.state("octocat"), RequestState::Idle));
        assert!(s.begin("octocat"));
    }
}
