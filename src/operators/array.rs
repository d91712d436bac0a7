//! Array operators
//!
//! An absent or null stored value is treated as an empty array.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::context::OpContext;
use super::kind::UpdateOperator;
use super::string::slice_bounds;
use crate::errors::UpdateResult;
use crate::value::{compare_values, values_equal};

/// `$pull` comparators in priority order
const PULL_COMPARATORS: [&str; 9] = ["$in", "$nin", "$position", "$eq", "$ne", "$lt", "$gt", "$lte", "$gte"];

pub(crate) fn apply(ctx: &OpContext<'_>, current: Option<&Value>, operand: &Value) -> UpdateResult<Value> {
    let stored = stored_array(ctx, current)?;

    let result = match ctx.operator {
        UpdateOperator::Push => push(ctx, stored, operand)?,
        UpdateOperator::Pop => pop(stored, operand),
        UpdateOperator::Pull => pull(ctx, stored, operand)?,
        UpdateOperator::AddToSet => add_to_set(ctx, stored, operand)?,
        UpdateOperator::SliceArray => {
            let (begin, end) = slice_bounds(ctx, operand, stored.len())?;
            stored[begin..end].to_vec()
        }
        UpdateOperator::Concat => {
            let tail = operand
                .as_array()
                .ok_or_else(|| ctx.operand_mismatch("array", operand))?;
            let mut joined = stored;
            joined.extend(tail.iter().cloned());
            joined
        }
        other => return Err(ctx.error(format!("{} is not an array operator", other))),
    };

    Ok(Value::Array(result))
}

fn stored_array(ctx: &OpContext<'_>, current: Option<&Value>) -> UpdateResult<Vec<Value>> {
    match current {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(ctx.stored_mismatch("array", other)),
    }
}

/// The `$each` list of a modifier operand, if the operand is one
fn each_list<'o>(ctx: &OpContext<'_>, operand: &'o Value) -> UpdateResult<Option<(&'o Vec<Value>, &'o Map<String, Value>)>> {
    let modifiers = match operand.as_object() {
        Some(modifiers) if modifiers.contains_key("$each") => modifiers,
        _ => return Ok(None),
    };
    match modifiers.get("$each") {
        Some(Value::Array(items)) => Ok(Some((items, modifiers))),
        Some(other) => Err(ctx.operand_mismatch("array for $each", other)),
        None => Ok(None),
    }
}

fn push(ctx: &OpContext<'_>, mut stored: Vec<Value>, operand: &Value) -> UpdateResult<Vec<Value>> {
    let (items, modifiers) = match each_list(ctx, operand)? {
        Some(found) => found,
        None => {
            stored.push(operand.clone());
            return Ok(stored);
        }
    };

    let mut items = items.clone();
    match modifiers.get("$sort") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {}
        Some(Value::Bool(true)) => items.sort_by(compare_values),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => items.sort_by(compare_values),
            Some(-1) => items.sort_by(|a, b| compare_values(b, a)),
            Some(0) => {}
            _ => return Err(ctx.error(format!("$sort must be 1, -1 or a boolean, got {}", n))),
        },
        Some(other) => return Err(ctx.error(format!("$sort must be 1, -1 or a boolean, got {}", other))),
    }

    match modifiers.get("$position") {
        None | Some(Value::Null) => stored.extend(items),
        Some(position) => {
            let position = position
                .as_f64()
                .filter(|p| p.fract() == 0.0)
                .map(|p| p as i64)
                .ok_or_else(|| ctx.error(format!("$position must be an integer, got {}", position)))?;
            let len = stored.len() as i64;
            let index = if position < 0 {
                (len + position).max(0)
            } else {
                position.min(len)
            } as usize;
            stored.splice(index..index, items);
        }
    }
    Ok(stored)
}

/// `1` drops the last element, `-1` the first; anything else is a no-op
fn pop(mut stored: Vec<Value>, operand: &Value) -> Vec<Value> {
    match operand.as_i64() {
        Some(1) => {
            stored.pop();
        }
        Some(-1) if !stored.is_empty() => {
            stored.remove(0);
        }
        _ => {}
    }
    stored
}

fn pull(ctx: &OpContext<'_>, stored: Vec<Value>, operand: &Value) -> UpdateResult<Vec<Value>> {
    let comparator = operand.as_object().and_then(|modifiers| {
        PULL_COMPARATORS
            .iter()
            .find_map(|key| modifiers.get(*key).map(|arg| (*key, arg)))
    });

    let (key, arg) = match comparator {
        Some(found) => found,
        None => return Ok(stored.into_iter().filter(|item| !values_equal(item, operand)).collect()),
    };

    if key == "$position" {
        let index = arg
            .as_u64()
            .ok_or_else(|| ctx.error(format!("$position must be a non-negative integer, got {}", arg)))?
            as usize;
        let mut stored = stored;
        if index < stored.len() {
            stored.remove(index);
        }
        return Ok(stored);
    }

    let list = match key {
        "$in" | "$nin" => Some(
            arg.as_array()
                .ok_or_else(|| ctx.error(format!("{} must be an array, got {}", key, arg)))?,
        ),
        _ => None,
    };

    let remove = |item: &Value| -> bool {
        match key {
            "$in" => list.map_or(false, |l| l.iter().any(|x| values_equal(x, item))),
            "$nin" => list.map_or(false, |l| !l.iter().any(|x| values_equal(x, item))),
            "$eq" => values_equal(item, arg),
            "$ne" => !values_equal(item, arg),
            "$lt" => ordered(item, arg) == Some(Ordering::Less),
            "$gt" => ordered(item, arg) == Some(Ordering::Greater),
            "$lte" => matches!(ordered(item, arg), Some(Ordering::Less | Ordering::Equal)),
            "$gte" => matches!(ordered(item, arg), Some(Ordering::Greater | Ordering::Equal)),
            _ => false,
        }
    };

    Ok(stored.into_iter().filter(|item| !remove(item)).collect())
}

/// Ordering between two values of the same comparable kind
fn ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
            Some(compare_values(a, b))
        }
        _ => None,
    }
}

/// Union of the stored array with the operand, first occurrence kept
fn add_to_set(ctx: &OpContext<'_>, stored: Vec<Value>, operand: &Value) -> UpdateResult<Vec<Value>> {
    let additions: Vec<Value> = match each_list(ctx, operand)? {
        Some((items, _)) => items.clone(),
        None => vec![operand.clone()],
    };

    let mut unique: Vec<Value> = Vec::with_capacity(stored.len() + additions.len());
    for item in stored.into_iter().chain(additions) {
        if !unique.iter().any(|seen| values_equal(seen, &item)) {
            unique.push(item);
        }
    }
    Ok(unique)
}
