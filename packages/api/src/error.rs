//! Backend error type shared by the identity and database boundaries.
//!
//! Every failure coming out of the hosted backend is flattened into a
//! [`BackendError`]: a human-readable message plus the optional SQLSTATE
//! code reported by the database layer. Callers pattern-match the code
//! through [`BackendError::is_unique_violation`] /
//! [`BackendError::is_foreign_key_violation`] to rewrite constraint
//! failures into domain-specific messages.

use serde::Deserialize;
use thiserror::Error;

/// SQLSTATE for a unique-constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for a foreign-key violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// A failure surfaced by the identity provider or the database boundary.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct BackendError {
    /// SQLSTATE (or provider-specific) error code, when the backend reported one.
    pub code: Option<String>,
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code.as_deref() == Some(UNIQUE_VIOLATION)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.code.as_deref() == Some(FOREIGN_KEY_VIOLATION)
    }
}

/// Error body shapes returned by the hosted backend.
///
/// PostgREST reports `{code, message, details, hint}`; the auth endpoints
/// report `{error, error_description}` or `{msg}` depending on the route.
/// All fields are optional so a single type covers every endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: Option<serde_json::Value>,
    pub message: Option<String>,
    pub msg: Option<String>,
    pub error_description: Option<String>,
}

impl ErrorBody {
    /// Flatten the body into a [`BackendError`], falling back to `raw`
    /// when no recognisable message field is present.
    pub fn into_backend_error(self, raw: &str) -> BackendError {
        let message = self
            .message
            .or(self.error_description)
            .or(self.msg)
            .unwrap_or_else(|| raw.to_string());
        // PostgREST sends the SQLSTATE as a string, auth endpoints as a number.
        let code = self.code.map(|c| match c {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        BackendError { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postgrest_error_body() {
        let raw = r#"{"code":"23505","details":"Key (cpf)=(12345678901) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"ag_clientes_cpf_key\""}"#;
        let body: ErrorBody = serde_json::from_str(raw).unwrap();
        let err = body.into_backend_error(raw);
        assert!(err.is_unique_violation());
        assert!(err.message.contains("ag_clientes_cpf_key"));
    }

    #[test]
    fn parses_auth_error_body() {
        let raw = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let body: ErrorBody = serde_json::from_str(raw).unwrap();
        let err = body.into_backend_error(raw);
        assert_eq!(err.message, "Invalid login credentials");
        assert!(err.code.is_none());
    }

    #[test]
    fn falls_back_to_raw_text() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        let err = body.into_backend_error("upstream said no");
        assert_eq!(err.message, "upstream said no");
    }
}
