//! Decode attempt lockout.
//!
//! A decode form gets [`MAX_DECODE_ATTEMPTS`] tries. Every failure costs one, a
//! success restores all of them, and running out locks the form for good: there is
//! no in-session way back from [`LockoutState::Locked`].

use tracing::{info, warn};

use crate::config::{DECODE_FALLBACK_ERROR, MAX_DECODE_ATTEMPTS};
use crate::error::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutState {
    /// Attempts left, always in `1..=MAX_DECODE_ATTEMPTS`.
    Active(u8),

    /// Terminal.
    Locked,
}

/// Read model for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptStatus {
    pub remaining: u8,
    pub locked: bool,
}

impl AttemptStatus {
    /// Whether an "N attempts remaining" hint should be shown.
    pub fn should_display(&self) -> bool {
        !self.locked && self.remaining < MAX_DECODE_ATTEMPTS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptLockoutPolicy {
    state: LockoutState,
}

impl Default for AttemptLockoutPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptLockoutPolicy {
    pub fn new() -> Self {
        Self { state: LockoutState::Active(MAX_DECODE_ATTEMPTS) }
    }

    #[inline]
    pub fn state(&self) -> LockoutState {
        self.state
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state == LockoutState::Locked
    }

    pub fn status(&self) -> AttemptStatus {
        match self.state {
            LockoutState::Active(remaining) => AttemptStatus { remaining, locked: false },
            LockoutState::Locked => AttemptStatus { remaining: 0, locked: true },
        }
    }

    /// Rejects a submission up front once the form is locked.
    pub fn check(&self) -> Result<(), TransferError> {
        if self.is_locked() { Err(TransferError::LockedOut) } else { Ok(()) }
    }

    /// A decode succeeded: all attempts are restored.
    pub fn record_success(&mut self) {
        if let LockoutState::Active(remaining) = self.state
            && remaining < MAX_DECODE_ATTEMPTS
        {
            info!("decode succeeded, attempts restored");
        }
        if !self.is_locked() {
            self.state = LockoutState::Active(MAX_DECODE_ATTEMPTS);
        }
    }

    /// A decode failed: costs one attempt, locking the form on the last one.
    ///
    /// Returns the error to surface, built from the server detail when there is one.
    pub fn record_failure(&mut self, detail: Option<&str>) -> TransferError {
        self.state = match self.state {
            LockoutState::Active(remaining) if remaining > 1 => LockoutState::Active(remaining - 1),
            LockoutState::Active(_) | LockoutState::Locked => LockoutState::Locked,
        };

        match self.state {
            LockoutState::Active(remaining) => {
                info!(remaining, "decode failed");
                let detail = detail.unwrap_or(DECODE_FALLBACK_ERROR);
                TransferError::Failed(format!("{detail} ({remaining} {} remaining)", if remaining == 1 { "attempt" } else { "attempts" }))
            }
            LockoutState::Locked => {
                warn!("decode attempts exhausted, form locked");
                TransferError::LockedOut
            }
        }
    }
}
