// src/error.rs

//! Unified error handling for the watcher.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network or timeout failure reaching a provider site
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Expected page structure was absent
    #[error("Parse error for {context}: {message}")]
    Parse { context: String, message: String },

    /// A provider plugin does not satisfy the scraper contract
    #[error("Contract violation by provider '{provider}': {message}")]
    Contract { provider: String, message: String },

    /// Snapshot read/write failed
    #[error("Persistence error at {path}: {message}")]
    Persistence { path: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a contract violation for a provider.
    pub fn contract(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Contract {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error for a snapshot location.
    pub fn persistence(path: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Short category label used in logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "transport",
            Self::Parse { .. } | Self::Selector { .. } | Self::Url(_) => "parse",
            Self::Contract { .. } => "contract",
            Self::Persistence { .. } | Self::Io(_) | Self::Json(_) => "persistence",
            Self::Toml(_) | Self::Config(_) | Self::Validation(_) => "config",
            Self::Notify(_) => "notify",
        }
    }
}

/// Render an error together with every `source()` beneath it.
///
/// A cause already spelled out by the line above it is skipped.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut previous = error.to_string();
    let mut out = previous.clone();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !previous.contains(&text) {
            out.push_str("\n  caused by: ");
            out.push_str(&text);
        }
        previous = text;
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(AppError::parse("page", "missing list").kind(), "parse");
        assert_eq!(AppError::contract("X", "no id").kind(), "contract");
        assert_eq!(
            AppError::persistence("a/b.json", "denied").kind(),
            "persistence"
        );
    }

    #[test]
    fn test_error_chain_skips_repeated_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = AppError::Io(io);
        assert_eq!(error_chain(&err), "I/O error: disk full");
    }

    #[derive(Debug, Error)]
    #[error("write to snapshot failed")]
    struct Wrapper(#[source] AppError);

    #[test]
    fn test_error_chain_keeps_new_information() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Wrapper(AppError::Io(io));
        assert_eq!(
            error_chain(&err),
            "write to snapshot failed\n  caused by: I/O error: disk full"
        );
    }

    #[test]
    fn test_contract_message() {
        let err = AppError::contract("Acme", "no scraper registered");
        assert_eq!(
            err.to_string(),
            "Contract violation by provider 'Acme': no scraper registered"
        );
    }
}
