use secrecy::{ExposeSecret, SecretString};

/// The password a carrier is locked with.
///
/// Wraps [`SecretString`] so the value is zeroized on drop and never shows up in
/// `Debug` output or logs.
pub struct Password {
    inner: SecretString,
}

impl Password {
    pub fn new(password: &str) -> Self {
        Self { inner: SecretString::from(password.to_owned()) }
    }

    pub fn from_string(password: String) -> Self {
        Self { inner: SecretString::from(password) }
    }

    pub fn expose_secret(&self) -> &str {
        self.inner.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl Default for Password {
    fn default() -> Self {
        Self::new("")
    }
}

impl Clone for Password {
    fn clone(&self) -> Self {
        Self::new(self.expose_secret())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}
