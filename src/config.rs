//! Global Configuration Constants
//!
//! This module contains the parameters that shape the transfer workflow: the
//! lockout ceiling, the analysis debounce cadence, the service defaults, and the
//! user-facing fallback strings. The only value that may change at runtime is the
//! service base address, carried by [`ServiceConfig`].

use std::time::Duration;

/// Application name used in user interfaces and the banner.
pub const APP_NAME: &str = "hushbox";

/// Environment variable consulted for the service base address.
pub const SERVICE_URL_ENV: &str = "HUSHBOX_SERVER_URL";

/// Base address of the encode/decode service when none is configured.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Upper bound for a single encode or decode round trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for one analysis round trip.
pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(5);

/// Size of the slices the carrier is streamed in.
///
/// Every slice handed to the socket advances the upload progress, so this also
/// sets the progress granularity.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

// === Decode Lockout ===

/// Number of decode attempts a form starts with, and returns to after a success.
pub const MAX_DECODE_ATTEMPTS: u8 = 3;

/// Message shown once the decode attempts are exhausted.
pub const LOCKOUT_MESSAGE: &str = "Maximum attempts reached. Please restart to try again.";

/// Detail used when a failed decode carries no server-provided error.
pub const DECODE_FALLBACK_ERROR: &str = "An unknown error occurred.";

/// Detail used when a failed encode carries no server-provided error.
pub const ENCODE_FALLBACK_ERROR: &str = "An error occurred during encoding.";

// === Sensitive Text Analysis ===

/// Quiet period after the last edit before the message is sent for analysis.
pub const ANALYSIS_DEBOUNCE: Duration = Duration::from_millis(500);

/// Messages shorter than this (in characters) are never analyzed.
pub const ANALYSIS_MIN_CHARS: usize = 8;

// === Output ===

/// Prefix of the file name the encoded carrier is saved under. Files carrying it are
/// not offered again as encode input.
pub const OUTPUT_PREFIX: &str = "encrypted_";

// === Carrier Discovery ===

/// File and directory patterns skipped when listing candidate carriers.
pub const EXCLUDED_PATTERNS: &[&str] = &[
    "target",       // Rust build artifacts
    "vendor",       // Go/Cargo dependencies
    "node_modules", // Node.js dependencies
    ".git",         // Git repository metadata
    ".cache",       // Application cache files
    ".ssh",         // SSH keys and configuration
    ".gnupg",       // GPG keys and configuration
];

/// Runtime settings for the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base address, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout for encode and decode.
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Creates a configuration for the given base address.
    ///
    /// A trailing slash is stripped so endpoint paths can be appended verbatim.
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), timeout: REQUEST_TIMEOUT }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins an endpoint path onto the base address.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_stripped() {
        let config = ServiceConfig::new("http://stego.local:5000//");
        assert_eq!(config.base_url, "http://stego.local:5000");
        assert_eq!(config.url("/api/encode"), "http://stego.local:5000/api/encode");
    }

    #[test]
    fn test_default_points_at_local_service() {
        let config = ServiceConfig::default();
        assert_eq!(config.base_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.timeout, REQUEST_TIMEOUT);
    }

    #[test]
    fn test_with_timeout_overrides() {
        let config = ServiceConfig::default().with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
