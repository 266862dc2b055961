//! View models: the state behind each storefront screen.
//!
//! Views own their state and mutate it through `&mut self` async methods.
//! Network failures never escape a view as errors; they land in a
//! [`FetchState::Failed`] or a [`Notice`] for the affected section only.
//! Dropping a view (or an in-flight future of one) abandons its requests.

pub mod catalog;
pub mod checkout;
pub mod product_detail;
pub mod product_editor;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::routes::Route;
use crate::state::Storefront;

/// How long success and error notices stay up.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Pause between a success notice and the navigation that follows it.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

// =============================================================================
// Request lifecycle
// =============================================================================

/// Lifecycle of one request feeding a section of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> FetchState<T> {
    /// `Loaded` on success, otherwise `Failed` with the message `on_error` picks.
    pub fn from_result<E>(result: Result<T, E>, on_error: impl FnOnce(&E) -> String) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(on_error(&e)),
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Notices and navigation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Transient banner that dismisses itself after [`NOTICE_TTL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub shown_at: Instant,
    pub ttl: Duration,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            shown_at: Instant::now(),
            ttl: NOTICE_TTL,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.ttl
    }
}

/// Drop `notice` once it has been visible for its full TTL.
pub(crate) fn clear_expired(notice: &mut Option<Notice>, now: Instant) {
    if notice.as_ref().is_some_and(|n| n.is_expired(now)) {
        *notice = None;
    }
}

/// A pending move to another screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: Route,
    pub after: Duration,
}

impl Navigation {
    #[must_use]
    pub const fn now(to: Route) -> Self {
        Self {
            to,
            after: Duration::ZERO,
        }
    }

    /// Navigate once the success notice has been visible for [`REDIRECT_DELAY`].
    #[must_use]
    pub const fn delayed(to: Route) -> Self {
        Self {
            to,
            after: REDIRECT_DELAY,
        }
    }
}

// =============================================================================
// Session binding
// =============================================================================

/// Shown when a view outlived the session it was built for.
pub const SESSION_ENDED_MESSAGE: &str = "Your session has ended. Please sign in again.";

/// The session generation a view was built for.
///
/// Any login or logout after that makes the binding stale. A stale view must
/// drop what it loaded and must not send further requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionBinding(u64);

impl SessionBinding {
    pub(crate) fn bind(storefront: &Storefront) -> Self {
        Self(storefront.snapshot().generation)
    }

    pub(crate) fn is_current(self, storefront: &Storefront) -> bool {
        storefront.snapshot().generation == self.0
    }
}

// =============================================================================
// Submission guard
// =============================================================================

/// Marks a submission as outstanding until dropped.
///
/// Only one guard per flag exists at a time, so a second submission while the
/// first is pending is refused. Dropping the guard, including by cancelling
/// the future holding it, re-enables submission.
#[derive(Debug)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }

    pub(crate) fn is_pending(flag: &AtomicBool) -> bool {
        flag.load(Ordering::Acquire)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_state_from_result() {
        let ok: FetchState<u8> = FetchState::from_result(Ok::<_, ()>(1), |_| String::new());
        assert_eq!(ok.loaded(), Some(&1));

        let failed: FetchState<u8> =
            FetchState::from_result(Err("boom"), |e| format!("failed: {e}"));
        assert_eq!(failed.error(), Some("failed: boom"));
        assert!(!failed.is_loading());
    }

    #[test]
    fn test_notice_expiry() {
        let notice = Notice::success("Saved");
        assert!(!notice.is_expired(notice.shown_at));
        assert!(!notice.is_expired(notice.shown_at + Duration::from_millis(2_999)));
        assert!(notice.is_expired(notice.shown_at + NOTICE_TTL));
    }

    #[test]
    fn test_in_flight_guard_is_exclusive() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = InFlight::acquire(&flag);
        assert!(guard.is_some());
        assert!(InFlight::is_pending(&flag));
        assert!(InFlight::acquire(&flag).is_none());

        drop(guard);
        assert!(!InFlight::is_pending(&flag));
        assert!(InFlight::acquire(&flag).is_some());
    }
}
