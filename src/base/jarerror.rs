use thiserror::Error;

/// Errors raised by the suffix database, the cookie store and its persistence.
///
/// Struct variants carry plain strings so the enum stays `Clone + Eq`;
/// the underlying `io::Error` is flattened into `message`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum JarError {
    // Rule list
    #[error("Public suffix list at {path} could not be read: {message}")]
    RuleListUnreadable { path: String, message: String },
    #[error("Ambiguous suffix rules for {host}: {labels:?} tie on label count")]
    AmbiguousSuffixRule { host: String, labels: Vec<String> },

    // Cookie validation
    #[error("Host {host} is a public suffix")]
    CookiePublicSuffix { host: String },
    #[error("Host {host} is not within registrable domain {registrable}")]
    CookieHostMismatch { host: String, registrable: String },
    #[error("URL {url} has no DNS host")]
    CookieHostNotDomain { url: String },

    // Persistence
    #[error("Cookie store {operation} failed: {message}")]
    CookieStoreIo {
        operation: &'static str,
        message: String,
    },
    #[error("Cookie data truncated: expected {expected} bytes, {available} available")]
    CookieDataTruncated { expected: u32, available: usize },
    #[error("Cookie record of {len} bytes exceeds the persisted record limit")]
    CookieRecordTooLarge { len: usize },
    #[error("Invalid cookie data: {reason}")]
    CookieInvalidData { reason: String },

    // Configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl JarError {
    /// Create a rule list unreadable error.
    pub fn rule_list_unreadable(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        JarError::RuleListUnreadable {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a persistence I/O error for the named operation ("load" or "save").
    pub fn cookie_store_io(operation: &'static str, err: impl std::fmt::Display) -> Self {
        JarError::CookieStoreIo {
            operation,
            message: err.to_string(),
        }
    }

    /// Create an invalid data error.
    pub fn cookie_invalid_data(reason: impl Into<String>) -> Self {
        JarError::CookieInvalidData {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(err: impl std::fmt::Display) -> Self {
        JarError::InvalidConfig {
            message: err.to_string(),
        }
    }

    /// Whether the error came from the cookie validation path rather than I/O.
    pub fn is_validation_rejection(&self) -> bool {
        matches!(
            self,
            JarError::CookiePublicSuffix { .. }
                | JarError::CookieHostMismatch { .. }
                | JarError::CookieHostNotDomain { .. }
        )
    }
}

impl From<serde_json::Error> for JarError {
    fn from(err: serde_json::Error) -> Self {
        JarError::invalid_config(err)
    }
}
