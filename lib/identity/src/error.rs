//! Error types for identity operations.
//!
//! Errors are designed for layered context using rootcause: fallible
//! operations return `Result<T, Report<IdentityError>>`, and callers add
//! layer-appropriate context as errors propagate up the stack.

use rootcause::Report;
use std::fmt;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = IdentityError> = std::result::Result<T, Report<C>>;

/// Errors from identity-provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Configuration error (invalid URLs, missing settings).
    Configuration { reason: String },
    /// Failed to discover provider metadata.
    Discovery { reason: String },
    /// Token exchange with the provider failed.
    TokenExchange { reason: String },
    /// A token in the session could not be decoded.
    InvalidToken { reason: String },
    /// A required session entry is absent.
    MissingSessionItem { key: String },
    /// The stored user profile could not be decoded.
    ProfileDecode { reason: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "identity configuration error: {reason}")
            }
            Self::Discovery { reason } => {
                write!(f, "provider discovery failed: {reason}")
            }
            Self::TokenExchange { reason } => {
                write!(f, "token exchange failed: {reason}")
            }
            Self::InvalidToken { reason } => {
                write!(f, "invalid token: {reason}")
            }
            Self::MissingSessionItem { key } => {
                write!(f, "session entry '{key}' is not set")
            }
            Self::ProfileDecode { reason } => {
                write!(f, "failed to decode user profile: {reason}")
            }
        }
    }
}

impl std::error::Error for IdentityError {}
