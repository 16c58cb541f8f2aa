//! Error types for apiv7.

use derive_more::{Display, Error, From};

use crate::{Dialect, OptionKey};

/// Main error type for apiv7 operations.
///
/// Validation failures (`OperationNotSupported`, `UnsupportedByDialect`,
/// `Configuration`) are returned synchronously by `execute`, before any
/// transport interaction. Transport failures surface through the call
/// returned by the transport.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A query option was used on an action that disables it.
    #[display("action `{action}` does not support the `{operation}` operation")]
    #[from(skip)]
    OperationNotSupported {
        /// The rejected option.
        operation: OptionKey,
        /// Name of the action that rejected it.
        action: String,
    },

    /// The dialect cannot express a requested query option.
    #[display("the {dialect} dialect cannot translate the `{operation}` operation")]
    #[from(skip)]
    UnsupportedByDialect {
        /// The untranslatable option.
        operation: OptionKey,
        /// Dialect in use.
        dialect: Dialect,
    },

    /// Malformed query option or declaration.
    #[display("configuration error: {_0}")]
    #[from(skip)]
    Configuration(#[error(not(source))] String),

    /// No translator is known for this dialect tag.
    #[display("unknown dialect: {_0}")]
    #[from(skip)]
    UnknownDialect(#[error(not(source))] String),

    /// The endpoint does not declare this action.
    #[display("unknown action: {_0}")]
    #[from(skip)]
    UnknownAction(#[error(not(source))] String),

    /// The response body does not have the shape the action declares.
    #[display("response to `{action}` should be {expected} but was {actual}")]
    #[from(skip)]
    ShapeMismatch {
        /// Action name.
        action: String,
        /// Expected JSON shape.
        expected: &'static str,
        /// Actual JSON shape.
        actual: &'static str,
    },

    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The prepared request could not be built.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "items[2].name").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an operation-not-supported error.
    #[must_use]
    pub fn operation_not_supported(operation: OptionKey, action: impl Into<String>) -> Self {
        Self::OperationNotSupported {
            operation,
            action: action.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an HTTP error with an optional body.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>, body: Option<bytes::Bytes>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body,
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns `true` if a disabled operation was rejected.
    #[must_use]
    pub const fn is_operation_not_supported(&self) -> bool {
        matches!(self, Self::OperationNotSupported { .. })
    }

    /// Returns `true` for errors raised before the transport was reached.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::OperationNotSupported { .. }
                | Self::UnsupportedByDialect { .. }
                | Self::Configuration(_)
                | Self::UnknownDialect(_)
                | Self::UnknownAction(_)
        )
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_not_supported_display() {
        let err = Error::operation_not_supported(OptionKey::Sort, "remove");
        assert_eq!(
            err.to_string(),
            "action `remove` does not support the `sort` operation"
        );
        assert!(err.is_operation_not_supported());
        assert!(err.is_validation());
    }

    #[test]
    fn unsupported_by_dialect_display() {
        let err = Error::UnsupportedByDialect {
            operation: OptionKey::Batch,
            dialect: Dialect::Iceberg,
        };
        assert_eq!(
            err.to_string(),
            "the iceberg dialect cannot translate the `batch` operation"
        );
        assert!(err.is_validation());
        assert!(!err.is_operation_not_supported());
    }

    #[test]
    fn transport_errors_are_not_validation() {
        assert!(!Error::Timeout.is_validation());
        assert!(Error::Timeout.is_timeout());

        let err = Error::http(404, "Not Found", Some(bytes::Bytes::from("missing")));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.body(), Some(&bytes::Bytes::from("missing")));
        assert!(!err.is_validation());
    }

    #[test]
    fn shape_mismatch_display() {
        let err = Error::ShapeMismatch {
            action: "query".to_string(),
            expected: "an array",
            actual: "an object",
        };
        assert_eq!(
            err.to_string(),
            "response to `query` should be an array but was an object"
        );
    }
}
