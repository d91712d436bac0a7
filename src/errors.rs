//! Update engine error types
//!
//! Error codes:
//! - AERO_UPDATE_VALIDATION_FAILED (REJECT)
//! - AERO_UPDATE_OPERATOR_INVALID (REJECT)
//! - AERO_UPDATE_TYPE_MISMATCH (REJECT)
//! - AERO_UPDATE_UNKNOWN_OPERATOR (REJECT)
//! - AERO_UPDATE_INVALID_RULE (REJECT)
//! - AERO_UPDATE_PATH_CONFLICT (REJECT)
//! - AERO_UPDATE_CONFIG_ERROR (ERROR)
//!
//! Every error aborts the current `apply` call. The caller-visible record is
//! never partially mutated.

use thiserror::Error;

/// Result type for update engine operations
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Errors raised while parsing or applying an update document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    /// A rule check rejected the operand being written
    #[error("Validation failed for field '{field}' on rule {rule}: {message}")]
    Validation {
        field: String,
        rule: String,
        message: String,
    },

    /// Malformed operand or operator applied to an unusable value
    #[error("Operator {operator} failed on field '{field}': {reason}")]
    Operator {
        operator: String,
        field: String,
        reason: String,
    },

    /// Operator family does not match the field's declared type
    #[error("Operator {operator} cannot be applied to field '{field}' declared as {declared_type}")]
    TypeMismatch {
        operator: String,
        field: String,
        declared_type: String,
    },

    /// Operator key is not part of the closed operator set
    #[error("Unknown update operator: {operator}")]
    UnknownOperator { operator: String },

    /// Rule definition could not be parsed
    #[error("Invalid rule {rule} for field '{field}': {reason}")]
    InvalidRule {
        field: String,
        rule: String,
        reason: String,
    },

    /// Dotted path walks through a value that is not a container
    #[error("Path '{path}' cannot be resolved: {reason}")]
    Path { path: String, reason: String },

    /// Engine configuration is unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl UpdateError {
    pub fn validation(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        UpdateError::Validation {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn operator(
        operator: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        UpdateError::Operator {
            operator: operator.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(
        operator: impl Into<String>,
        field: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        UpdateError::TypeMismatch {
            operator: operator.into(),
            field: field.into(),
            declared_type: declared_type.into(),
        }
    }

    pub fn unknown_operator(operator: impl Into<String>) -> Self {
        UpdateError::UnknownOperator {
            operator: operator.into(),
        }
    }

    pub fn invalid_rule(
        field: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        UpdateError::InvalidRule {
            field: field.into(),
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    pub fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        UpdateError::Path {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            UpdateError::Validation { .. } => "AERO_UPDATE_VALIDATION_FAILED",
            UpdateError::Operator { .. } => "AERO_UPDATE_OPERATOR_INVALID",
            UpdateError::TypeMismatch { .. } => "AERO_UPDATE_TYPE_MISMATCH",
            UpdateError::UnknownOperator { .. } => "AERO_UPDATE_UNKNOWN_OPERATOR",
            UpdateError::InvalidRule { .. } => "AERO_UPDATE_INVALID_RULE",
            UpdateError::Path { .. } => "AERO_UPDATE_PATH_CONFLICT",
            UpdateError::Config(_) => "AERO_UPDATE_CONFIG_ERROR",
        }
    }

    /// Whether the error was caused by the caller's input rather than the host
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UpdateError::Config(_))
    }

    /// Whether this is a rule rejection
    pub fn is_validation(&self) -> bool {
        matches!(self, UpdateError::Validation { .. })
    }
}
