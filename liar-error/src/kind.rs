//! Error kinds for liar game operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on the kind to decide how to react, e.g. the CLI exits
/// with a configuration hint on `ConfigInvalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration or game settings
    ConfigInvalid,

    /// Invalid argument passed to a function
    InvalidArgument,

    // =========================================================================
    // Game errors
    // =========================================================================
    /// Too many consecutive rounds ended without a single valid vote
    RoundVoid,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// The model call failed or returned no content
    InferenceFailed,

    /// Provider not reachable or not serving
    ProviderUnavailable,

    /// Rate limit or quota exceeded
    RateLimited,

    /// Credentials missing or rejected
    AuthenticationFailed,

    /// Unknown model identifier
    ModelNotFound,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Failed to parse input, e.g. a provider response body
    ParseFailed,

    /// Serialization/deserialization failed
    SerializationFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            ErrorKind::RoundVoid => "RoundVoid",

            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::ModelNotFound => "ModelNotFound",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
                | ErrorKind::RoundVoid
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ConfigInvalid.to_string(), "ConfigInvalid");
        assert_eq!(ErrorKind::RoundVoid.to_string(), "RoundVoid");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::ConfigInvalid.is_retryable());
        assert!(!ErrorKind::AuthenticationFailed.is_retryable());
        assert!(ErrorKind::RoundVoid.is_retryable());
    }
}
