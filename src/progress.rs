//! Upload progress tracking.
//!
//! [`Progress`] is a shared percent counter. Within one request it only moves up,
//! it never reports 100 before the request has completed, and it returns to 0 when
//! the next request starts or the current one is settled.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type Observer = Box<dyn Fn(u8) + Send + Sync>;

#[derive(Default)]
struct Inner {
    percent: AtomicU8,
    observer: Mutex<Option<Observer>>,
}

/// Cheaply cloneable handle to the progress of the in-flight request.
#[derive(Clone, Default)]
pub struct Progress {
    inner: Arc<Inner>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current percent, 0 to 100.
    pub fn percent(&self) -> u8 {
        self.inner.percent.load(Ordering::SeqCst)
    }

    /// Registers a callback invoked every time the percent goes up.
    pub fn observe(&self, observer: impl Fn(u8) + Send + Sync + 'static) {
        *self.inner.observer.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(observer));
    }

    /// Removes the callback.
    pub fn clear_observer(&self) {
        *self.inner.observer.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Records `sent` of `total` bytes handed to the transport.
    ///
    /// Capped at 99: the last percent belongs to the response.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn advance(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        let percent = ((sent.min(total) as f64 / total as f64) * 100.0).round() as u8;
        self.raise(percent.min(99));
    }

    /// Marks the request as completed.
    pub fn complete(&self) {
        self.raise(100);
    }

    /// Returns to 0 without notifying the observer.
    pub fn reset(&self) {
        self.inner.percent.store(0, Ordering::SeqCst);
    }

    fn raise(&self, percent: u8) {
        let previous = self.inner.percent.fetch_max(percent, Ordering::SeqCst);
        if percent > previous
            && let Some(observer) = self.inner.observer.lock().unwrap_or_else(PoisonError::into_inner).as_ref()
        {
            observer(percent);
        }
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").field("percent", &self.percent()).finish()
    }
}
