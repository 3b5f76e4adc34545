//! The remote encode/decode/analyze service.
//!
//! The service is the only network boundary. Forms never talk HTTP directly; they
//! go through [`StegoService`], which [`HttpService`] implements over reqwest and
//! tests replace with a scripted fake.

use async_trait::async_trait;
use bytes::Bytes;

use crate::analyzer::Finding;
use crate::error::ServiceError;
use crate::progress::Progress;
use crate::request::TransferRequest;

mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpService;

/// Successful service reply to a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResponse {
    /// Encode: the new carrier file.
    Carrier(Bytes),

    /// Decode: the extracted message.
    Message(String),
}

#[async_trait]
pub trait StegoService: Send + Sync {
    /// Sends an encode or decode request, reporting upload progress as it goes.
    async fn transfer(&self, request: &TransferRequest, progress: &Progress) -> Result<TransferResponse, ServiceError>;

    /// Scans text for sensitive patterns.
    async fn analyze(&self, text: &str) -> Result<Vec<Finding>, ServiceError>;
}
