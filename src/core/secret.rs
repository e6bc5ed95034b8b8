use std::fmt;

/// Wraps secret material (passwords, raw tokens) so it cannot leak through
/// `Debug`, `Display` or log output.
///
/// The value is only reachable through [`expose_secret`](Self::expose_secret).
/// `Secret` is intentionally not `Clone`; share it behind an `Arc` when several
/// owners need it.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

// Must stay "[REDACTED]" unconditionally.
impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
