//! Error types for the Tenant Assistant client.
//!
//! Library crates use [`TenantChatError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Popup text for failures that carry no user-facing message of their own.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

/// Top-level error type for all Tenant Assistant operations.
#[derive(Debug, thiserror::Error)]
pub enum TenantChatError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP transport error talking to a webhook or the tenant table.
    #[error("network error: {0}")]
    Network(String),

    /// Response body or stored value could not be interpreted.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Session database error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Internal data validation error (bad endpoint URL, malformed key, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// User input rejected before any network call was made.
    #[error("{message}")]
    Form { message: String },

    /// The remote side answered, but refused the request.
    #[error("{message}")]
    Rejected { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TenantChatError>;

impl TenantChatError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a form error; the message is shown to the user verbatim.
    pub fn form(msg: impl Into<String>) -> Self {
        Self::Form {
            message: msg.into(),
        }
    }

    /// Create a rejection; the message is shown to the user verbatim.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Text suitable for an error popup.
    pub fn user_message(&self) -> String {
        match self {
            Self::Form { message } | Self::Rejected { message } => message.clone(),
            _ => UNEXPECTED_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TenantChatError::config("missing anon key");
        assert_eq!(err.to_string(), "config error: missing anon key");

        let err = TenantChatError::form("Please enter your email");
        assert_eq!(err.to_string(), "Please enter your email");
    }

    #[test]
    fn user_message_hides_internal_errors() {
        let err = TenantChatError::Network("connection refused".into());
        assert_eq!(err.user_message(), UNEXPECTED_ERROR);

        let err = TenantChatError::rejected("Invalid OTP. Please check the code and try again.");
        assert_eq!(
            err.user_message(),
            "Invalid OTP. Please check the code and try again."
        );
    }
}
