//! Error taxonomy for the transfer workflow.
//!
//! - [`ValidationError`]: a required field is missing; detected locally, never reaches the network.
//! - [`TransferError`]: what a form surfaces to the user after a submit.
//! - [`ServiceError`]: raw failure at the HTTP boundary, before it is turned into user text.
//!
//! Analysis failures have no variant of their own: they are swallowed by the analyzer.

use std::fmt::{Display, Formatter};

use strum::IntoStaticStr;
use thiserror::Error;

use crate::config::LOCKOUT_MESSAGE;

/// A user-editable field of a transfer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    File,
    Password,
    Message,
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}

/// One or more required fields were absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    missing: Vec<Field>,
}

impl ValidationError {
    pub(crate) fn new(missing: Vec<Field>) -> Self {
        Self { missing }
    }

    /// The fields that were missing, in form order.
    pub fn missing(&self) -> &[Field] {
        &self.missing
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.missing.iter().map(|field| field.into()).collect();
        write!(f, "Please provide the missing {}: {}.", if names.len() == 1 { "field" } else { "fields" }, names.join(", "))
    }
}

/// Failure of a submit, as shown to the user.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network or service failure; the string is the single user-facing message.
    #[error("{0}")]
    Failed(String),

    /// Decode attempts are exhausted for the lifetime of the form.
    #[error("{}", LOCKOUT_MESSAGE)]
    LockedOut,

    /// A transfer is already in flight on this form.
    #[error("a transfer is already in progress")]
    Busy,
}

/// Failure at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status, with the `{error}` body when the service sent one.
    #[error("service responded with status {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// The server-provided error string, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail: Some(detail), .. } if !detail.trim().is_empty() => Some(detail),
            _ => None,
        }
    }
}
