//! Crate-wide error taxonomy.
//!
//! Callers (HTTP handlers, CLI) need to branch on a kind, not just a
//! message, so every public operation returns one of four closed variants:
//! not-found, validation, authorization, internal.

use thiserror::Error;

/// The four stable error kinds every public operation returns.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Referenced id or lookup key does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A business rule was violated. Message text is part of the contract:
    /// tests assert on substrings such as "cycle" or "already exists".
    #[error("{0}")]
    Validation(String),

    /// Caller's principal is not allowed to perform this operation.
    #[error("{0}")]
    Authorization(String),

    /// Anything else: store I/O failure, probe transport error, bug.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        RegistryError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        RegistryError::Validation(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        RegistryError::Authorization(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        RegistryError::Internal(msg.into())
    }

    /// HTTP status code this error kind maps to, per the registry's `{status, message}`
    /// error body contract.
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::NotFound(_) => 404,
            RegistryError::Validation(_) => 400,
            RegistryError::Authorization(_) => 403,
            RegistryError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Internal(e.to_string())
    }
}

impl From<serde_yaml::Error> for RegistryError {
    fn from(e: serde_yaml::Error) -> Self {
        RegistryError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_error_body_contract() {
        assert_eq!(RegistryError::not_found("x").status_code(), 404);
        assert_eq!(RegistryError::validation("x").status_code(), 400);
        assert_eq!(RegistryError::authorization("x").status_code(), 403);
        assert_eq!(RegistryError::internal("x").status_code(), 500);
    }

    #[test]
    fn display_preserves_message_text_for_substring_assertions() {
        let err = RegistryError::validation("would introduce a cycle");
        assert!(err.to_string().contains("cycle"));
    }
}
