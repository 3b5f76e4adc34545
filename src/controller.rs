//! Submission lifecycle for one form.
//!
//! [`TransferController`] runs a validated [`TransferRequest`] through the service:
//! it rejects re-entrant submits, tracks upload progress, and turns the service
//! reply into a [`TransferOutcome`] or a single user-facing [`TransferError`].
//!
//! Decode outcomes go through the controller's [`AttemptLockoutPolicy`]. The policy
//! is read and updated under the controller's lock at the moment a call settles,
//! never from a copy captured when the submit began.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::ENCODE_FALLBACK_ERROR;
use crate::error::{ServiceError, TransferError};
use crate::lockout::{AttemptLockoutPolicy, AttemptStatus};
use crate::progress::Progress;
use crate::request::TransferRequest;
use crate::service::{StegoService, TransferResponse};
use crate::types::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// An encoded carrier ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    file_name: String,
    bytes: Bytes,
}

impl EncodedArtifact {
    pub fn new(file_name: impl Into<String>, bytes: Bytes) -> Self {
        Self { file_name: file_name.into(), bytes }
    }

    /// Suggested download name, `encrypted_<input name>`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Writes the artifact under `dir` using its suggested name.
    pub async fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await.with_context(|| format!("failed to write output file: {}", path.display()))?;
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Encoded(EncodedArtifact),
    Decoded(String),
}

struct State {
    phase: TransferPhase,
    lockout: AttemptLockoutPolicy,
}

pub struct TransferController<S> {
    service: Arc<S>,
    progress: Progress,
    state: Mutex<State>,
}

/// Returns the controller to `Idle` if a submit is dropped before it settles.
struct InFlight<'a> {
    state: &'a Mutex<State>,
    progress: &'a Progress,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("submit abandoned before completion");
            self.state.lock().unwrap_or_else(PoisonError::into_inner).phase = TransferPhase::Idle;
            self.progress.reset();
        }
    }
}

impl<S: StegoService> TransferController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service, progress: Progress::new(), state: Mutex::new(State { phase: TransferPhase::Idle, lockout: AttemptLockoutPolicy::new() }) }
    }

    pub fn phase(&self) -> TransferPhase {
        self.lock().phase
    }

    #[inline]
    pub fn is_submitting(&self) -> bool {
        self.phase() == TransferPhase::Submitting
    }

    /// Remaining decode attempts.
    pub fn attempts(&self) -> AttemptStatus {
        self.lock().lockout.status()
    }

    pub fn is_locked(&self) -> bool {
        self.lock().lockout.is_locked()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Sends the request and waits for the outcome.
    ///
    /// # Errors
    ///
    /// - [`TransferError::LockedOut`] for a decode once attempts are exhausted, without
    ///   contacting the service.
    /// - [`TransferError::Busy`] while another submit is in flight.
    /// - [`TransferError::Failed`] with the server detail, or a fallback message.
    pub async fn submit(&self, request: TransferRequest) -> Result<TransferOutcome, TransferError> {
        {
            let mut state = self.lock();
            if request.operation() == Operation::Decode {
                state.lockout.check()?;
            }
            if state.phase == TransferPhase::Submitting {
                return Err(TransferError::Busy);
            }
            state.phase = TransferPhase::Submitting;
        }

        let mut in_flight = InFlight { state: &self.state, progress: &self.progress, settled: false };
        self.progress.reset();
        info!(route = request.route().name, file = request.file().name(), "submitting");

        let result = self.service.transfer(&request, &self.progress).await;
        in_flight.settled = true;

        let outcome = self.settle(&request, result);
        self.progress.reset();
        outcome
    }

    fn settle(&self, request: &TransferRequest, result: Result<TransferResponse, ServiceError>) -> Result<TransferOutcome, TransferError> {
        let operation = request.operation();
        let outcome = match (operation, result) {
            (Operation::Encode, Ok(TransferResponse::Carrier(bytes))) => Ok(TransferOutcome::Encoded(EncodedArtifact::new(request.file().output_name(), bytes))),
            (Operation::Decode, Ok(TransferResponse::Message(message))) => Ok(TransferOutcome::Decoded(message)),
            (_, Ok(_)) => Err(ServiceError::Malformed(format!("unexpected reply to {operation:?}"))),
            (_, Err(err)) => Err(err),
        };

        let mut state = self.lock();
        match outcome {
            Ok(outcome) => {
                self.progress.complete();
                state.phase = TransferPhase::Succeeded;
                if operation == Operation::Decode {
                    state.lockout.record_success();
                }
                info!(route = request.route().name, "transfer succeeded");
                Ok(outcome)
            }
            Err(err) => {
                state.phase = TransferPhase::Failed;
                warn!(route = request.route().name, %err, "transfer failed");
                Err(match operation {
                    Operation::Encode => TransferError::Failed(err.detail().unwrap_or(ENCODE_FALLBACK_ERROR).to_owned()),
                    Operation::Decode => state.lockout.record_failure(err.detail()),
                })
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;
    use crate::config::LOCKOUT_MESSAGE;
    use crate::file::CarrierFile;
    use crate::request::TransferRequestBuilder;
    use crate::secret::Password;
    use crate::service::fake::{FakeService, rejected};
    use crate::types::Medium;

    fn encode(name: &str) -> TransferRequest {
        TransferRequestBuilder::new(Operation::Encode, Medium::Image)
            .file(CarrierFile::new(name, vec![7u8; 1000]))
            .password(Password::new("hunter2"))
            .message("meet at dawn")
            .build()
            .unwrap()
    }

    fn decode(password: &str) -> TransferRequest {
        TransferRequestBuilder::new(Operation::Decode, Medium::Audio).file(CarrierFile::new("secret.wav", vec![1u8; 64])).password(Password::new(password)).build().unwrap()
    }

    #[tokio::test]
    async fn test_encode_success_names_artifact() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Ok(TransferResponse::Carrier(Bytes::from_static(b"stego"))));
        let controller = TransferController::new(Arc::clone(&service));

        let outcome = controller.submit(encode("photo.png")).await.unwrap();

        let TransferOutcome::Encoded(artifact) = outcome else { panic!("expected an artifact") };
        assert_eq!(artifact.file_name(), "encrypted_photo.png");
        assert_eq!(artifact.bytes().as_ref(), b"stego");
        assert_eq!(controller.phase(), TransferPhase::Succeeded);
        assert_eq!(service.transfers()[0].file_field, "image");
    }

    #[tokio::test]
    async fn test_progress_completes_then_resets() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Ok(TransferResponse::Carrier(Bytes::new())));
        let controller = TransferController::new(service);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.progress().observe(move |p| sink.lock().unwrap().push(p));

        controller.submit(encode("photo.png")).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(controller.progress().percent(), 0);
    }

    #[tokio::test]
    async fn test_encode_failure_uses_detail_or_fallback() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Err(rejected("Message too long for carrier")));
        service.push_transfer(Err(ServiceError::Status { status: 500, detail: None }));
        let controller = TransferController::new(service);

        let err = controller.submit(encode("photo.png")).await.unwrap_err();
        assert_eq!(err.to_string(), "Message too long for carrier");

        let err = controller.submit(encode("photo.png")).await.unwrap_err();
        assert_eq!(err.to_string(), ENCODE_FALLBACK_ERROR);
        assert_eq!(controller.phase(), TransferPhase::Failed);
        assert_eq!(controller.progress().percent(), 0);
    }

    #[tokio::test]
    async fn test_encode_failures_never_touch_attempts() {
        let service = Arc::new(FakeService::new());
        let controller = TransferController::new(service);

        for _ in 0..4 {
            controller.submit(encode("photo.png")).await.unwrap_err();
        }

        assert_eq!(controller.attempts(), AttemptStatus { remaining: 3, locked: false });
    }

    #[tokio::test]
    async fn test_decode_lockout_after_three_failures() {
        let service = Arc::new(FakeService::new());
        for _ in 0..3 {
            service.push_transfer(Err(rejected("Invalid password")));
        }
        let controller = TransferController::new(Arc::clone(&service));

        let err = controller.submit(decode("wrong")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid password (2 attempts remaining)");
        let err = controller.submit(decode("wrong")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid password (1 attempt remaining)");
        let err = controller.submit(decode("wrong")).await.unwrap_err();
        assert_eq!(err.to_string(), LOCKOUT_MESSAGE);

        let err = controller.submit(decode("right")).await.unwrap_err();
        assert!(matches!(err, TransferError::LockedOut));
        assert_eq!(service.transfers().len(), 3);
        assert!(controller.is_locked());
    }

    #[tokio::test]
    async fn test_decode_success_restores_attempts() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Err(rejected("Invalid password")));
        service.push_transfer(Ok(TransferResponse::Message("the eagle has landed".into())));
        let controller = TransferController::new(Arc::clone(&service));

        controller.submit(decode("wrong")).await.unwrap_err();
        assert_eq!(controller.attempts().remaining, 2);

        let outcome = controller.submit(decode("right")).await.unwrap();
        assert_eq!(outcome, TransferOutcome::Decoded("the eagle has landed".into()));
        assert_eq!(controller.attempts().remaining, 3);

        let sent = service.transfers();
        assert_eq!(sent[1].path, "/api/decode-audio");
        assert_eq!(sent[1].file_field, "audio");
        assert_eq!(sent[1].message, None);
    }

    #[tokio::test]
    async fn test_mismatched_reply_is_a_failure() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Ok(TransferResponse::Message("oops".into())));
        let controller = TransferController::new(service);

        let err = controller.submit(encode("photo.png")).await.unwrap_err();

        assert_eq!(err.to_string(), ENCODE_FALLBACK_ERROR);
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_rejected() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(FakeService::gated(Arc::clone(&gate)));
        service.push_transfer(Ok(TransferResponse::Carrier(Bytes::from_static(b"ok"))));
        let controller = TransferController::new(Arc::clone(&service));

        let first = controller.submit(encode("photo.png"));
        let second = async {
            while !controller.is_submitting() {
                tokio::task::yield_now().await;
            }
            let result = controller.submit(encode("other.png")).await;
            gate.notify_one();
            result
        };

        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(TransferError::Busy)));
        assert_eq!(service.transfers().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_submit_returns_to_idle() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(FakeService::gated(gate));
        let controller = TransferController::new(service);

        let result = tokio::time::timeout(Duration::from_millis(50), controller.submit(encode("photo.png"))).await;

        assert!(result.is_err());
        assert_eq!(controller.phase(), TransferPhase::Idle);
        assert_eq!(controller.progress().percent(), 0);
    }

    #[tokio::test]
    async fn test_save_in_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = EncodedArtifact::new("encrypted_photo.png", Bytes::from_static(b"png!"));

        let path = artifact.save_in(dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("encrypted_photo.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"png!");
    }
}
