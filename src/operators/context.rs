//! Per-invocation context handed to operator implementations

use serde_json::Value;

use super::kind::UpdateOperator;
use super::operand::Operand;
use crate::errors::UpdateError;
use crate::path::value_kind;
use crate::schema::FieldKind;

/// Identifies the operator invocation for error reporting
#[derive(Debug, Clone, Copy)]
pub struct OpContext<'a> {
    pub operator: UpdateOperator,
    pub field: &'a str,
    pub declared: Option<&'a FieldKind>,
}

impl<'a> OpContext<'a> {
    pub fn new(operator: UpdateOperator, field: &'a str, declared: Option<&'a FieldKind>) -> Self {
        Self {
            operator,
            field,
            declared,
        }
    }

    /// Builds an `UpdateError::Operator` for this invocation
    pub fn error(&self, reason: impl Into<String>) -> UpdateError {
        UpdateError::operator(self.operator.as_str(), self.field, reason)
    }

    /// The JSON operand, rejecting mapper operands
    pub fn json<'o>(&self, operand: &'o Operand) -> Result<&'o Value, UpdateError> {
        operand
            .as_value()
            .ok_or_else(|| self.error(format!("expected a JSON operand, got {}", operand.describe())))
    }

    /// Error for a stored value of the wrong kind
    pub fn stored_mismatch(&self, expected: &str, found: &Value) -> UpdateError {
        self.error(format!(
            "stored value is {}, expected {}",
            value_kind(found),
            expected
        ))
    }

    /// Error for an operand of the wrong kind
    pub fn operand_mismatch(&self, expected: &str, found: &Value) -> UpdateError {
        self.error(format!(
            "operand is {}, expected {}",
            value_kind(found),
            expected
        ))
    }
}
