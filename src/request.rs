//! Transfer request construction.
//!
//! [`TransferRequestBuilder`] collects the form fields and turns them into a
//! [`TransferRequest`] only when everything the operation needs is present. It is
//! pure: no network, no resources.

use crate::error::{Field, ValidationError};
use crate::file::CarrierFile;
use crate::secret::Password;
use crate::types::{Medium, Operation, Route};

/// A validated, ready-to-send transfer.
///
/// Built fresh per submission and dropped once the call resolves.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    operation: Operation,
    medium: Medium,
    file: CarrierFile,
    password: Password,
    message: Option<String>,
}

impl TransferRequest {
    #[inline]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    #[inline]
    pub fn medium(&self) -> Medium {
        self.medium
    }

    #[inline]
    pub fn route(&self) -> Route {
        Route::of(self.operation, self.medium)
    }

    #[inline]
    pub fn file(&self) -> &CarrierFile {
        &self.file
    }

    #[inline]
    pub fn password(&self) -> &Password {
        &self.password
    }

    /// The message to hide. Always `Some` for encode, always `None` for decode.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Collects fields for a [`TransferRequest`].
#[derive(Debug)]
pub struct TransferRequestBuilder {
    operation: Operation,
    medium: Medium,
    file: Option<CarrierFile>,
    password: Option<Password>,
    message: Option<String>,
}

impl TransferRequestBuilder {
    pub fn new(operation: Operation, medium: Medium) -> Self {
        Self { operation, medium, file: None, password: None, message: None }
    }

    #[must_use]
    pub fn file(mut self, file: CarrierFile) -> Self {
        self.file = Some(file);
        self
    }

    #[must_use]
    pub fn password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    /// Sets the message. Ignored for decode.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Validates the collected fields and builds the request.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every missing field when the file
    /// (absent or zero bytes), the password, or, for encode, the message is empty.
    pub fn build(self) -> Result<TransferRequest, ValidationError> {
        let mut missing = Vec::new();

        let file = self.file.filter(|file| !file.is_empty() && !file.name().is_empty());
        if file.is_none() {
            missing.push(Field::File);
        }

        let password = self.password.filter(|password| !password.is_empty());
        if password.is_none() {
            missing.push(Field::Password);
        }

        let message = if self.operation.needs_message() {
            let message = self.message.filter(|message| !message.is_empty());
            if message.is_none() {
                missing.push(Field::Message);
            }
            message
        } else {
            None
        };

        match (file, password) {
            (Some(file), Some(password)) if missing.is_empty() => Ok(TransferRequest { operation: self.operation, medium: self.medium, file, password, message }),
            _ => Err(ValidationError::new(missing)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> CarrierFile {
        CarrierFile::new("photo.png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn test_encode_request_is_built() {
        let request = TransferRequestBuilder::new(Operation::Encode, Medium::Image).file(photo()).password(Password::new("Secr3t!")).message("hello").build().unwrap();

        assert_eq!(request.route().name, "encode-image");
        assert_eq!(request.route().file_field, "image");
        assert_eq!(request.message(), Some("hello"));
        assert_eq!(request.password().expose_secret(), "Secr3t!");
    }

    #[test]
    fn test_empty_message_is_rejected_for_encode() {
        let err = TransferRequestBuilder::new(Operation::Encode, Medium::Image).file(photo()).password(Password::new("Secr3t!")).message("").build().unwrap_err();

        assert_eq!(err.missing(), &[Field::Message]);
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn test_every_missing_field_is_named() {
        let err = TransferRequestBuilder::new(Operation::Encode, Medium::Audio).build().unwrap_err();
        assert_eq!(err.missing(), &[Field::File, Field::Password, Field::Message]);
    }

    #[test]
    fn test_zero_byte_file_counts_as_missing() {
        let err = TransferRequestBuilder::new(Operation::Decode, Medium::Image).file(CarrierFile::new("photo.png", Vec::new())).password(Password::new("pw")).build().unwrap_err();
        assert_eq!(err.missing(), &[Field::File]);
    }

    #[test]
    fn test_decode_does_not_need_or_carry_a_message() {
        let request = TransferRequestBuilder::new(Operation::Decode, Medium::Audio)
            .file(CarrierFile::new("secret.wav", vec![1]))
            .password(Password::new("wrong"))
            .message("ignored")
            .build()
            .unwrap();

        assert_eq!(request.route().name, "decode-audio");
        assert_eq!(request.message(), None);
    }
}
