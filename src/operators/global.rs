//! Global and boolean operators
//!
//! These never consult rule validation. `$clear` is the only one that reads
//! the declared field kind.

use serde_json::{Map, Value};

use super::context::OpContext;
use super::kind::UpdateOperator;
use crate::errors::UpdateResult;
use crate::schema::FieldKind;
use crate::value::is_truthy;

pub(crate) fn apply(ctx: &OpContext<'_>, current: Option<&Value>, operand: &Value) -> UpdateResult<Value> {
    match ctx.operator {
        UpdateOperator::Set => Ok(operand.clone()),
        UpdateOperator::Unset => Ok(Value::Null),
        UpdateOperator::Clear => match ctx.declared {
            Some(FieldKind::Object { .. }) => Ok(Value::Object(Map::new())),
            Some(FieldKind::Array { .. }) => Ok(Value::Array(Vec::new())),
            Some(kind) => Err(ctx.error(format!(
                "cannot clear a field declared as {}",
                kind.type_name()
            ))),
            None => Err(ctx.error("cannot clear an undeclared field")),
        },
        UpdateOperator::Toggle => Ok(Value::Bool(!current.map_or(false, is_truthy))),
        other => Err(ctx.error(format!("{} is not a global operator", other))),
    }
}
