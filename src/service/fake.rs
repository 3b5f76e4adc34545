use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::{StegoService, TransferResponse};
use crate::analyzer::Finding;
use crate::error::ServiceError;
use crate::progress::Progress;
use crate::request::TransferRequest;

/// What the fake saw of a transfer.
#[derive(Debug, Clone)]
pub struct RecordedTransfer {
    pub path: &'static str,
    pub file_field: &'static str,
    pub file_name: String,
    pub message: Option<String>,
    pub password: String,
}

type Scripted<T> = VecDeque<(Duration, Result<T, ServiceError>)>;

/// Scripted [`StegoService`] for tests.
///
/// Unscripted transfers fail with a 500 without detail; unscripted analyses find nothing.
#[derive(Default)]
pub struct FakeService {
    transfers: Mutex<Scripted<TransferResponse>>,
    analyses: Mutex<Scripted<Vec<Finding>>>,
    transfer_log: Mutex<Vec<RecordedTransfer>>,
    analysis_log: Mutex<Vec<(Instant, String)>>,
    gate: Option<Arc<Notify>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers wait on `gate` before answering.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::default() }
    }

    pub fn push_transfer(&self, result: Result<TransferResponse, ServiceError>) {
        self.transfers.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn push_analysis(&self, delay: Duration, result: Result<Vec<Finding>, ServiceError>) {
        self.analyses.lock().unwrap().push_back((delay, result));
    }

    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.transfer_log.lock().unwrap().clone()
    }

    pub fn analysis_calls(&self) -> Vec<(Instant, String)> {
        self.analysis_log.lock().unwrap().clone()
    }
}

pub fn rejected(detail: &str) -> ServiceError {
    ServiceError::Status { status: 400, detail: Some(detail.to_owned()) }
}

#[async_trait]
impl StegoService for FakeService {
    async fn transfer(&self, request: &TransferRequest, progress: &Progress) -> Result<TransferResponse, ServiceError> {
        let route = request.route();
        self.transfer_log.lock().unwrap().push(RecordedTransfer {
            path: route.path,
            file_field: route.file_field,
            file_name: request.file().name().to_owned(),
            message: request.message().map(str::to_owned),
            password: request.password().expose_secret().to_owned(),
        });

        let total = request.file().len();
        progress.advance(total / 2, total);
        progress.advance(total, total);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let scripted = self.transfers.lock().unwrap().pop_front();
        scripted.map_or(Err(ServiceError::Status { status: 500, detail: None }), |(_, result)| result)
    }

    async fn analyze(&self, text: &str) -> Result<Vec<Finding>, ServiceError> {
        self.analysis_log.lock().unwrap().push((Instant::now(), text.to_owned()));

        let scripted = self.analyses.lock().unwrap().pop_front();
        let (delay, result) = scripted.unwrap_or((Duration::ZERO, Ok(Vec::new())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
