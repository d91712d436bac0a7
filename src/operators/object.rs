//! Object operators
//!
//! An absent or null stored value is treated as an empty object.

use serde_json::{Map, Value};

use super::context::OpContext;
use super::kind::UpdateOperator;
use super::operand::Operand;
use crate::errors::UpdateResult;
use crate::path::value_kind;

pub(crate) fn apply(ctx: &OpContext<'_>, current: Option<&Value>, operand: &Operand) -> UpdateResult<Value> {
    let stored = stored_object(ctx, current)?;

    let result = match ctx.operator {
        UpdateOperator::Omit => omit(ctx, stored, ctx.json(operand)?)?,
        UpdateOperator::Merge => {
            let partial = ctx.json(operand)?;
            let partial = partial
                .as_object()
                .ok_or_else(|| ctx.operand_mismatch("object", partial))?;
            let mut merged = stored;
            deep_merge(&mut merged, partial);
            merged
        }
        UpdateOperator::MapKeys => map_keys(ctx, stored, operand)?,
        UpdateOperator::MapValues => match operand {
            Operand::ValueMapper(mapper) => stored.into_iter().map(|(k, v)| (k, mapper(&v))).collect(),
            other => return Err(ctx.error(format!("expected a value mapper, got {}", other.describe()))),
        },
        UpdateOperator::Invert => invert(ctx, stored)?,
        other => return Err(ctx.error(format!("{} is not an object operator", other))),
    };

    Ok(Value::Object(result))
}

fn stored_object(ctx: &OpContext<'_>, current: Option<&Value>) -> UpdateResult<Map<String, Value>> {
    match current {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(ctx.stored_mismatch("object", other)),
    }
}

fn omit(ctx: &OpContext<'_>, mut stored: Map<String, Value>, operand: &Value) -> UpdateResult<Map<String, Value>> {
    let keys: Vec<&str> = match operand {
        Value::String(key) => vec![key.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| ctx.error(format!("keys must be strings, got {}", value_kind(item))))
            })
            .collect::<UpdateResult<_>>()?,
        other => return Err(ctx.operand_mismatch("array of keys", other)),
    };

    for key in keys {
        stored.shift_remove(key);
    }
    Ok(stored)
}

/// Recursively merges `partial` into `target`. Nested objects merge; any
/// other value overwrites.
pub(crate) fn deep_merge(target: &mut Map<String, Value>, partial: &Map<String, Value>) {
    for (key, incoming) in partial {
        match (target.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Renames keys with a mapper, or with a `{old: new}` table where unlisted
/// keys keep their names. Later keys win when two map to the same name.
fn map_keys(ctx: &OpContext<'_>, stored: Map<String, Value>, operand: &Operand) -> UpdateResult<Map<String, Value>> {
    match operand {
        Operand::KeyMapper(mapper) => Ok(stored.into_iter().map(|(k, v)| (mapper(&k), v)).collect()),
        Operand::Value(Value::Object(table)) => {
            let mut renamed = Map::new();
            for (key, value) in stored {
                let new_key = match table.get(&key) {
                    None => key,
                    Some(Value::String(name)) => name.clone(),
                    Some(other) => {
                        return Err(ctx.error(format!("rename target for '{}' must be a string, got {}", key, other)))
                    }
                };
                renamed.insert(new_key, value);
            }
            Ok(renamed)
        }
        other => Err(ctx.error(format!("expected a key mapper or rename table, got {}", other.describe()))),
    }
}

/// Swaps keys and values. Values become keys by their text form; on
/// collision the last key seen wins.
fn invert(ctx: &OpContext<'_>, stored: Map<String, Value>) -> UpdateResult<Map<String, Value>> {
    let mut inverted = Map::new();
    for (key, value) in stored {
        let new_key = match &value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(ctx.error(format!(
                    "cannot invert key '{}' holding {}",
                    key,
                    value_kind(other)
                )))
            }
        };
        inverted.shift_remove(&new_key);
        inverted.insert(new_key, Value::String(key));
    }
    Ok(inverted)
}
