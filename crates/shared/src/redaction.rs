//! Secret detection for structured log fields.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a field name likely refers to a secret.
///
/// ```
/// use sourceset_shared::is_secret_key;
///
/// assert!(is_secret_key("apiToken"));
/// assert!(!is_secret_key("specPath"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    const MARKERS: [&str; 6] = ["KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH"];
    let key = key.to_ascii_uppercase();
    MARKERS.iter().any(|marker| key.contains(marker))
}
