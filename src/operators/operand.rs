//! Operands carried by update document entries

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Key transform for `$mapKeys`
pub type KeyMapper = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Value transform for `$mapValues`
pub type ValueMapper = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// The argument of one (operator, field) entry
#[derive(Clone)]
pub enum Operand {
    /// Plain JSON operand
    Value(Value),
    /// Key transform for `$mapKeys`
    KeyMapper(KeyMapper),
    /// Value transform for `$mapValues`
    ValueMapper(ValueMapper),
}

impl Operand {
    pub fn key_mapper<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Operand::KeyMapper(Arc::new(f))
    }

    pub fn value_mapper<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Operand::ValueMapper(Arc::new(f))
    }

    /// The JSON operand, if this is not a mapper
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Operand::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self {
            Operand::Value(v) => v.to_string(),
            Operand::KeyMapper(_) => "<key mapper>".to_string(),
            Operand::ValueMapper(_) => "<value mapper>".to_string(),
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Operand::KeyMapper(_) => f.write_str("KeyMapper(<fn>)"),
            Operand::ValueMapper(_) => f.write_str("ValueMapper(<fn>)"),
        }
    }
}
