//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for results carrying an [`ErrorEnvelope`].
pub trait ResultExt<T> {
    /// Attach a metadata entry to the error, if any.
    fn with_metadata(self, key: &str, value: impl Into<String>) -> Result<T>;

    /// Attach metadata computed lazily, only on the error path.
    fn with_metadata_lazy<F>(self, key: &str, value: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_metadata(self, key: &str, value: impl Into<String>) -> Result<T> {
        self.map_err(|error| error.with_metadata(key, value))
    }

    fn with_metadata_lazy<F>(self, key: &str, value: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|error| error.with_metadata(key, value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn with_metadata_only_touches_errors() {
        let ok: Result<u8> = Ok(1);
        assert!(matches!(ok.with_metadata("path", "a"), Ok(1)));

        let err: Result<u8> = Err(ErrorEnvelope::expected(ErrorCode::not_found(), "gone"));
        let err = err.with_metadata("path", "src/a.py");
        assert!(matches!(
            err,
            Err(ref error) if error.metadata.get("path").map(String::as_str) == Some("src/a.py")
        ));
    }

    #[test]
    fn lazy_metadata_is_not_evaluated_on_success() {
        let ok: Result<u8> = Ok(2);
        let value = ok.with_metadata_lazy("path", || unreachable!("not evaluated"));
        assert!(matches!(value, Ok(2)));
    }
}
