//! Encode and decode forms.
//!
//! A form owns everything one screen needs: the selected carrier and its preview,
//! the typed fields, the last inline error, and its own [`TransferController`].
//! Nothing is shared between form instances; dropping a form revokes its preview
//! URL and cancels its pending analysis.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::analyzer::{Finding, SensitiveTextAnalyzer};
use crate::config::ENCODE_FALLBACK_ERROR;
use crate::controller::{EncodedArtifact, TransferController, TransferOutcome};
use crate::error::TransferError;
use crate::file::CarrierFile;
use crate::lockout::AttemptStatus;
use crate::preview::{ObjectUrlStore, PreviewResource, PreviewResourceManager};
use crate::progress::Progress;
use crate::request::TransferRequestBuilder;
use crate::secret::Password;
use crate::service::StegoService;
use crate::strength::PasswordStrength;
use crate::types::{Medium, Operation};

/// Hides a message inside a carrier.
pub struct EncodeForm<S> {
    medium: Medium,
    preview: PreviewResourceManager,
    message: String,
    password: Password,
    error: Option<String>,
    controller: TransferController<S>,
    analyzer: SensitiveTextAnalyzer<S>,
}

impl<S: StegoService + 'static> EncodeForm<S> {
    pub fn new(medium: Medium, service: Arc<S>, store: Arc<dyn ObjectUrlStore>) -> Self {
        Self::with_analyzer(medium, Arc::clone(&service), store, SensitiveTextAnalyzer::new(service))
    }

    pub fn with_analyzer(medium: Medium, service: Arc<S>, store: Arc<dyn ObjectUrlStore>, analyzer: SensitiveTextAnalyzer<S>) -> Self {
        Self {
            medium,
            preview: PreviewResourceManager::new(Operation::Encode, medium, store),
            message: String::new(),
            password: Password::default(),
            error: None,
            controller: TransferController::new(service),
            analyzer,
        }
    }

    pub fn select_file(&mut self, file: CarrierFile) -> &PreviewResource {
        self.preview.select(file)
    }

    /// Updates the message and schedules a sensitive-text scan.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.analyzer.on_text_change(&self.message);
    }

    pub fn set_password(&mut self, password: Password) {
        self.password = password;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn password_strength(&self) -> PasswordStrength {
        PasswordStrength::of(self.password.expose_secret())
    }

    pub fn preview(&self) -> Option<&PreviewResource> {
        self.preview.current()
    }

    /// Advisory warning about the selected carrier.
    pub fn warning(&self) -> Option<&str> {
        self.preview.warning()
    }

    /// Last inline error, cleared when a new submit starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.analyzer.findings()
    }

    pub fn subscribe_findings(&self) -> watch::Receiver<Vec<Finding>> {
        self.analyzer.subscribe()
    }

    pub fn progress(&self) -> &Progress {
        self.controller.progress()
    }

    pub fn can_submit(&self) -> bool {
        !self.controller.is_submitting() && self.preview.file().is_some_and(|file| !file.is_empty()) && !self.password.is_empty() && !self.message.is_empty()
    }

    /// Validates the fields and sends them for encoding.
    ///
    /// On success every field is cleared and the new carrier is returned. On failure
    /// the fields are kept for correction and the error is also kept for display.
    pub async fn submit(&mut self) -> Result<EncodedArtifact, TransferError> {
        self.error = None;
        let result = self.send().await;

        match &result {
            Ok(artifact) => {
                debug!(file = artifact.file_name(), "encode complete, clearing form");
                self.clear();
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        result
    }

    async fn send(&self) -> Result<EncodedArtifact, TransferError> {
        let mut builder = TransferRequestBuilder::new(Operation::Encode, self.medium).password(self.password.clone()).message(self.message.clone());
        if let Some(file) = self.preview.file() {
            builder = builder.file(file.clone());
        }
        let request = builder.build()?;

        match self.controller.submit(request).await? {
            TransferOutcome::Encoded(artifact) => Ok(artifact),
            TransferOutcome::Decoded(_) => Err(TransferError::Failed(ENCODE_FALLBACK_ERROR.to_owned())),
        }
    }

    fn clear(&mut self) {
        self.preview.release();
        self.password = Password::default();
        self.message.clear();
        self.analyzer.on_text_change("");
    }
}

/// Extracts a hidden message, under the attempt lockout.
pub struct DecodeForm<S> {
    medium: Medium,
    preview: PreviewResourceManager,
    password: Password,
    error: Option<String>,
    decoded: Option<String>,
    controller: TransferController<S>,
}

impl<S: StegoService> DecodeForm<S> {
    pub fn new(medium: Medium, service: Arc<S>, store: Arc<dyn ObjectUrlStore>) -> Self {
        Self {
            medium,
            preview: PreviewResourceManager::new(Operation::Decode, medium, store),
            password: Password::default(),
            error: None,
            decoded: None,
            controller: TransferController::new(service),
        }
    }

    pub fn select_file(&mut self, file: CarrierFile) -> &PreviewResource {
        self.preview.select(file)
    }

    pub fn set_password(&mut self, password: Password) {
        self.password = password;
    }

    pub fn preview(&self) -> Option<&PreviewResource> {
        self.preview.current()
    }

    pub fn warning(&self) -> Option<&str> {
        self.preview.warning()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The message extracted by the last successful submit.
    pub fn decoded(&self) -> Option<&str> {
        self.decoded.as_deref()
    }

    pub fn attempts(&self) -> AttemptStatus {
        self.controller.attempts()
    }

    pub fn is_locked(&self) -> bool {
        self.controller.is_locked()
    }

    pub fn progress(&self) -> &Progress {
        self.controller.progress()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_locked() && !self.controller.is_submitting() && self.preview.file().is_some_and(|file| !file.is_empty()) && !self.password.is_empty()
    }

    /// Sends the carrier and password for decoding.
    ///
    /// Once locked, every call fails with [`TransferError::LockedOut`] before any
    /// validation or network traffic.
    pub async fn submit(&mut self) -> Result<String, TransferError> {
        self.decoded = None;
        self.error = None;

        let result = self.send().await;
        match &result {
            Ok(message) => self.decoded = Some(message.clone()),
            Err(err) => self.error = Some(err.to_string()),
        }
        result
    }

    async fn send(&self) -> Result<String, TransferError> {
        if self.is_locked() {
            return Err(TransferError::LockedOut);
        }

        let mut builder = TransferRequestBuilder::new(Operation::Decode, self.medium).password(self.password.clone());
        if let Some(file) = self.preview.file() {
            builder = builder.file(file.clone());
        }
        let request = builder.build()?;

        match self.controller.submit(request).await? {
            TransferOutcome::Decoded(message) => Ok(message),
            TransferOutcome::Encoded(_) => Err(TransferError::Failed(crate::config::DECODE_FALLBACK_ERROR.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::config::LOCKOUT_MESSAGE;
    use crate::error::Field;
    use crate::preview::MemoryBlobStore;
    use crate::service::TransferResponse;
    use crate::service::fake::{FakeService, rejected};

    fn encode_form(service: &Arc<FakeService>, store: &Arc<MemoryBlobStore>) -> EncodeForm<FakeService> {
        EncodeForm::new(Medium::Image, Arc::clone(service), store.clone())
    }

    #[tokio::test]
    async fn test_scenario_encode_photo() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Ok(TransferResponse::Carrier(Bytes::from_static(b"\x89PNG stego"))));
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = encode_form(&service, &store);

        form.select_file(CarrierFile::new("photo.png", vec![0x89, b'P', b'N', b'G']));
        form.set_message("hello");
        form.set_password(Password::new("Secr3t!"));
        assert!(form.can_submit());

        let artifact = form.submit().await.unwrap();

        assert_eq!(artifact.file_name(), "encrypted_photo.png");
        assert_eq!(artifact.bytes().as_ref(), b"\x89PNG stego");

        let sent = service.transfers();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path, "/api/encode");
        assert_eq!(sent[0].file_field, "image");
        assert_eq!(sent[0].file_name, "photo.png");
        assert_eq!(sent[0].message.as_deref(), Some("hello"));
        assert_eq!(sent[0].password, "Secr3t!");

        assert!(form.preview().is_none());
        assert!(form.message().is_empty());
        assert_eq!(form.password_strength().score(), 0);
        assert!(!form.can_submit());
        assert_eq!(store.ledger().live(), 0);
    }

    #[tokio::test]
    async fn test_scenario_missing_message() {
        let service = Arc::new(FakeService::new());
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = encode_form(&service, &store);

        form.select_file(CarrierFile::new("photo.png", vec![1u8; 16]));
        form.set_password(Password::new("Secr3t!"));
        assert!(!form.can_submit());

        let err = form.submit().await.unwrap_err();

        let TransferError::Validation(validation) = &err else { panic!("expected a validation error, got {err:?}") };
        assert_eq!(validation.missing(), &[Field::Message]);
        assert_eq!(form.error(), Some("Please provide the missing field: message."));
        assert!(service.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_encode_failure_keeps_fields() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Err(rejected("Message too long for this image")));
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = encode_form(&service, &store);

        form.select_file(CarrierFile::new("tiny.png", vec![1u8; 16]));
        form.set_message("a rather long message");
        form.set_password(Password::new("pw"));

        form.submit().await.unwrap_err();

        assert_eq!(form.error(), Some("Message too long for this image"));
        assert_eq!(form.message(), "a rather long message");
        assert!(form.preview().is_some());
        assert!(form.can_submit());
    }

    #[tokio::test]
    async fn test_format_mismatch_is_only_a_warning() {
        let service = Arc::new(FakeService::new());
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = encode_form(&service, &store);

        form.select_file(CarrierFile::new("notes.txt", b"plain".to_vec()));

        assert!(form.warning().is_some());
        assert!(form.preview().is_some());
    }

    #[tokio::test]
    async fn test_dropping_form_revokes_preview() {
        let service = Arc::new(FakeService::new());
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = encode_form(&service, &store);

        form.select_file(CarrierFile::new("a.png", vec![1u8; 4]));
        form.select_file(CarrierFile::new("b.png", vec![2u8; 4]));
        assert_eq!(store.ledger().live(), 1);

        drop(form);

        assert_eq!(store.ledger().created(), 2);
        assert_eq!(store.ledger().live(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_edits_surface_findings() {
        let service = Arc::new(FakeService::new());
        service.push_analysis(Duration::ZERO, Ok(vec![Finding { kind: "email".into(), value: "me@x.io".into() }]));
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = encode_form(&service, &store);

        form.set_message("reach me at me@x.io");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(form.findings().len(), 1);
    }

    #[tokio::test]
    async fn test_scenario_decode_lockout() {
        let service = Arc::new(FakeService::new());
        for _ in 0..3 {
            service.push_transfer(Err(rejected("Invalid password or no hidden message")));
        }
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = DecodeForm::new(Medium::Audio, Arc::clone(&service), store.clone());

        form.select_file(CarrierFile::new("secret.wav", vec![b'R', b'I', b'F', b'F']));
        form.set_password(Password::new("wrong"));
        assert!(form.preview().unwrap().url().is_none());

        form.submit().await.unwrap_err();
        assert_eq!(form.error(), Some("Invalid password or no hidden message (2 attempts remaining)"));
        assert!(form.attempts().should_display());

        form.submit().await.unwrap_err();
        let err = form.submit().await.unwrap_err();
        assert!(matches!(err, TransferError::LockedOut));
        assert!(form.attempts().locked);
        assert!(!form.can_submit());

        let err = form.submit().await.unwrap_err();
        assert!(matches!(err, TransferError::LockedOut));
        assert_eq!(form.error(), Some(LOCKOUT_MESSAGE));
        assert_eq!(service.transfers().len(), 3);
    }

    #[tokio::test]
    async fn test_locked_form_skips_validation() {
        let service = Arc::new(FakeService::new());
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = DecodeForm::new(Medium::Image, Arc::clone(&service), store);

        form.select_file(CarrierFile::new("x.png", vec![1u8; 4]));
        form.set_password(Password::new("nope"));
        for _ in 0..3 {
            form.submit().await.unwrap_err();
        }

        form.set_password(Password::default());
        let err = form.submit().await.unwrap_err();

        assert!(matches!(err, TransferError::LockedOut));
    }

    #[tokio::test]
    async fn test_decode_success_shows_message_and_keeps_fields() {
        let service = Arc::new(FakeService::new());
        service.push_transfer(Err(rejected("Invalid password")));
        service.push_transfer(Ok(TransferResponse::Message("hello".into())));
        let store = Arc::new(MemoryBlobStore::new());
        let mut form = DecodeForm::new(Medium::Image, Arc::clone(&service), store);

        form.select_file(CarrierFile::new("encrypted_photo.png", vec![1u8; 4]));
        form.set_password(Password::new("wrong"));
        form.submit().await.unwrap_err();

        form.set_password(Password::new("Secr3t!"));
        assert_eq!(form.submit().await.unwrap(), "hello");

        assert_eq!(form.decoded(), Some("hello"));
        assert_eq!(form.error(), None);
        assert_eq!(form.attempts().remaining, 3);
        assert!(form.can_submit());
        assert_eq!(service.transfers()[1].path, "/api/decode");
    }
}
