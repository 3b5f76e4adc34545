//! Debounced sensitive-text analysis.
//!
//! While a message is being composed, [`SensitiveTextAnalyzer`] sends it to the
//! service for a scan of sensitive patterns (card numbers, e-mail addresses, keys)
//! once the user pauses typing. The scan is advisory: failures clear the findings
//! and are otherwise invisible.
//!
//! Each edit bumps a generation counter, cancels the pending quiet-period timer and
//! starts a new one. When a timer fires, the call is detached from it so a later
//! edit cannot cancel a request mid-flight; instead, a result whose generation is no
//! longer current is dropped on arrival. Latest edit wins.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::{ANALYSIS_DEBOUNCE, ANALYSIS_MIN_CHARS};
use crate::service::StegoService;

/// One sensitive pattern detected in the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Category label, e.g. `email` or `credit_card`.
    #[serde(rename = "type")]
    pub kind: String,

    /// The matching substring.
    pub value: String,
}

struct Shared {
    generation: Mutex<u64>,
    findings: watch::Sender<Vec<Finding>>,
}

impl Shared {
    fn bump(&self) -> u64 {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        *generation
    }

    /// Replaces the findings if `generation` is still the latest one.
    fn apply(&self, generation: u64, findings: Vec<Finding>) -> bool {
        let current = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            return false;
        }
        self.findings.send_replace(findings);
        true
    }
}

/// Watches message edits and keeps the latest findings.
pub struct SensitiveTextAnalyzer<S> {
    service: Arc<S>,
    window: Duration,
    min_chars: usize,
    shared: Arc<Shared>,
    pending: Option<JoinHandle<()>>,
}

impl<S: StegoService + 'static> SensitiveTextAnalyzer<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_window(service, ANALYSIS_DEBOUNCE, ANALYSIS_MIN_CHARS)
    }

    pub fn with_window(service: Arc<S>, window: Duration, min_chars: usize) -> Self {
        let (findings, _) = watch::channel(Vec::new());
        Self { service, window, min_chars, shared: Arc::new(Shared { generation: Mutex::new(0), findings }), pending: None }
    }

    /// Schedules an analysis of `text` after the quiet period.
    ///
    /// Cancels whatever was scheduled before. Text below the minimum length is not
    /// sent anywhere and clears the findings right away. Must be called from within
    /// a tokio runtime.
    pub fn on_text_change(&mut self, text: &str) {
        self.cancel_pending();
        let generation = self.shared.bump();

        if text.chars().count() < self.min_chars {
            self.shared.apply(generation, Vec::new());
            return;
        }

        let service = Arc::clone(&self.service);
        let shared = Arc::clone(&self.shared);
        let window = self.window;
        let text = text.to_owned();

        trace!(generation, chars = text.len(), "analysis scheduled");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;

            // Detached from the timer: later edits discard the result instead of
            // cancelling the call.
            tokio::spawn(async move {
                let findings = match service.analyze(&text).await {
                    Ok(findings) => findings,
                    Err(err) => {
                        debug!(%err, "analysis unavailable");
                        Vec::new()
                    }
                };

                if shared.apply(generation, findings) {
                    trace!(generation, "analysis applied");
                } else {
                    trace!(generation, "stale analysis discarded");
                }
            });
        }));
    }

    /// The latest findings. Empty means nothing was found, or nothing to analyze.
    pub fn findings(&self) -> Vec<Finding> {
        self.shared.findings.borrow().clone()
    }

    /// Receiver notified every time the findings are replaced.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Finding>> {
        self.shared.findings.subscribe()
    }
}

impl<S> SensitiveTextAnalyzer<S> {
    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<S> Drop for SensitiveTextAnalyzer<S> {
    fn drop(&mut self) {
        self.cancel_pending();
        self.shared.bump();
    }
}
