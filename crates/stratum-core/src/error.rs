//! Unified application error types for Stratum.
//!
//! Every crate maps its internal failures into [`AppError`]. An error carries
//! two messages: the diagnostic `message`, which stays server-side, and an
//! optional `public_message` that is safe to show to callers.

use std::fmt;
use thiserror::Error;

/// Generic user-facing text for failures whose details must stay internal.
pub const INTERNAL_ERROR_MESSAGE: &str = "service temporarily unavailable";

/// Top-level error kind categorization used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested document was not found.
    NotFound,
    /// The caller identity is missing or invalid.
    Authentication,
    /// Input validation failed, including ownership mismatches.
    Validation,
    /// The operation conflicts with existing state.
    Conflict,
    /// An internal server error occurred.
    Internal,
    /// The persistence layer failed.
    Database,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// The external storage coordinator or its channel failed.
    ExternalService,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// The unified application error used throughout Stratum.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// Diagnostic message. Never rendered to callers for internal kinds.
    pub message: String,
    /// Sanitized message for callers, if it differs from the kind default.
    pub public_message: Option<String>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            public_message: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            public_message: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach the message shown to callers.
    pub fn with_public(mut self, message: impl Into<String>) -> Self {
        self.public_message = Some(message.into());
        self
    }

    /// The message that may be rendered to a caller.
    pub fn public_message(&self) -> &str {
        if let Some(msg) = &self.public_message {
            return msg;
        }
        match self.kind {
            ErrorKind::NotFound => "not found",
            ErrorKind::Authentication => "authentication error",
            ErrorKind::Validation | ErrorKind::Conflict => &self.message,
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Serialization
            | ErrorKind::Configuration
            | ErrorKind::ExternalService
            | ErrorKind::ServiceUnavailable => INTERNAL_ERROR_MESSAGE,
        }
    }

    /// Whether this error hides its details from callers.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self.kind,
            ErrorKind::NotFound
                | ErrorKind::Authentication
                | ErrorKind::Validation
                | ErrorKind::Conflict
        )
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create the ownership-mismatch error.
    pub fn wrong_user() -> Self {
        Self::new(ErrorKind::Validation, "userID is not equal").with_public("wrong user")
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            public_message: self.public_message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_kinds_hide_diagnostics() {
        let err = AppError::database("connection reset by peer");
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
        assert!(err.is_internal());

        let err = AppError::external("redis: broken pipe");
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn wrong_user_has_sanitized_text() {
        let err = AppError::wrong_user();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.public_message(), "wrong user");
        assert_eq!(err.message, "userID is not equal");
    }

    #[test]
    fn clone_drops_source_but_keeps_messages() {
        let io = std::io::Error::other("disk");
        let err = AppError::with_source(ErrorKind::Internal, "boom", io).with_public("later");
        let cloned = err.clone();
        assert!(cloned.source.is_none());
        assert_eq!(cloned.public_message(), "later");
    }
}
