//! Unified application error types for Quartermaster.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] taxonomy is what
//! callers branch on: business-rule failures are turned into user-facing
//! messages, transport failures are retried or surfaced, malformed payloads
//! are dropped.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No valid session token or user when identity is required.
    AuthRequired,
    /// The current user's role does not allow the operation.
    Authorization,
    /// Transport-level failure: no response, refused connection, timeout.
    Network,
    /// Not enough stock to approve or issue a request.
    StockInsufficient,
    /// The requested status transition is not legal from the current state.
    InvalidTransition,
    /// A push event or response body could not be parsed.
    MalformedPayload,
    /// Input validation failed.
    Validation,
    /// The requested resource was not found.
    NotFound,
    /// The server reported a conflicting concurrent change.
    Conflict,
    /// A configuration error occurred.
    Configuration,
    /// The backend answered with an unexpected failure.
    ExternalService,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Return the kind as an upper-case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::Authorization => "AUTHORIZATION",
            Self::Network => "NETWORK",
            Self::StockInsufficient => "STOCK_INSUFFICIENT",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::MalformedPayload => "MALFORMED_PAYLOAD",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Configuration => "CONFIGURATION",
            Self::ExternalService => "EXTERNAL_SERVICE",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout Quartermaster.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
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
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication-required error.
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthRequired, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Create a stock-insufficient error.
    pub fn stock_insufficient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StockInsufficient, message)
    }

    /// Create an invalid-transition error.
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTransition, message)
    }

    /// Create a malformed-payload error.
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedPayload, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the caller can reasonably retry or adjust and try again.
    ///
    /// `InvalidTransition` is a race or programming error and
    /// `MalformedPayload` will not parse on a second attempt, so neither
    /// counts.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Network
                | ErrorKind::StockInsufficient
                | ErrorKind::Conflict
                | ErrorKind::ExternalService
                | ErrorKind::AuthRequired
        )
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::AuthRequired => "Your session has ended. Please log in again.".to_string(),
            ErrorKind::Network => {
                "The server could not be reached. Please try again later.".to_string()
            }
            ErrorKind::StockInsufficient => format!("Not enough stock: {}", self.message),
            ErrorKind::InvalidTransition => {
                format!("This action is no longer possible: {}", self.message)
            }
            _ => self.message.clone(),
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::MalformedPayload,
            format!("JSON decoding error: {err}"),
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
