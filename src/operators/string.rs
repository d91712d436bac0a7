//! String operators
//!
//! An absent or null stored value is treated as the empty string. All
//! positions and lengths are measured in characters, not bytes.

use serde_json::{Map, Value};

use super::context::OpContext;
use super::kind::UpdateOperator;
use crate::errors::UpdateResult;

pub(crate) fn apply(ctx: &OpContext<'_>, current: Option<&Value>, operand: &Value) -> UpdateResult<Value> {
    use UpdateOperator::*;

    let text = stored_string(ctx, current)?;

    let result = match ctx.operator {
        Append => format!("{}{}", text, operand_string(ctx, operand)?),
        Prepend => format!("{}{}", operand_string(ctx, operand)?, text),
        Replace => replace(ctx, text, operand)?,
        Trim => text.trim().to_string(),
        Substr => substr(ctx, text, operand)?,
        Capitalize => capitalize(text),
        Reverse => text.chars().rev().collect(),
        Slice => slice(ctx, text, operand)?,
        Lowercase => text.to_lowercase(),
        Uppercase => text.to_uppercase(),
        Camelcase => camel_case(text),
        Kebabcase => join_words(text, "-"),
        Snakecase => join_words(text, "_"),
        Titlecase => title_case(text),
        other => return Err(ctx.error(format!("{} is not a string operator", other))),
    };

    Ok(Value::String(result))
}

fn stored_string<'v>(ctx: &OpContext<'_>, current: Option<&'v Value>) -> UpdateResult<&'v str> {
    match current {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ctx.stored_mismatch("string", other)),
    }
}

fn operand_string<'o>(ctx: &OpContext<'_>, operand: &'o Value) -> UpdateResult<&'o str> {
    operand
        .as_str()
        .ok_or_else(|| ctx.operand_mismatch("string", operand))
}

/// Replaces the first literal occurrence of `$searchValue`
fn replace(ctx: &OpContext<'_>, text: &str, operand: &Value) -> UpdateResult<String> {
    let fields = operand
        .as_object()
        .ok_or_else(|| ctx.operand_mismatch("{$searchValue, $replaceValue}", operand))?;

    let search = required_string(ctx, fields, "$searchValue")?;
    let replacement = required_string(ctx, fields, "$replaceValue")?;
    Ok(text.replacen(search, replacement, 1))
}

fn required_string<'o>(ctx: &OpContext<'_>, fields: &'o Map<String, Value>, key: &str) -> UpdateResult<&'o str> {
    match fields.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ctx.error(format!("{} must be a string, got {}", key, other))),
        None => Err(ctx.error(format!("missing {}", key))),
    }
}

/// Characters from `offset` to the end; negative offsets count from the end
fn substr(ctx: &OpContext<'_>, text: &str, operand: &Value) -> UpdateResult<String> {
    let offset = operand
        .as_f64()
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64)
        .ok_or_else(|| ctx.operand_mismatch("integer offset", operand))?;

    let len = text.chars().count() as i64;
    let start = if offset < 0 {
        (len + offset).max(0)
    } else {
        offset.min(len)
    };
    Ok(text.chars().skip(start as usize).collect())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn slice(ctx: &OpContext<'_>, text: &str, operand: &Value) -> UpdateResult<String> {
    let chars: Vec<char> = text.chars().collect();
    let (begin, end) = slice_bounds(ctx, operand, chars.len())?;
    Ok(chars[begin..end].iter().collect())
}

/// Resolves `{$begin, $end}` against a length.
///
/// `$begin` is clamped to >= 0 and `$end` to <= `len`; both default to the
/// full range. Supplying both with `$begin > $end` is an error, as is a
/// non-numeric bound.
pub(crate) fn slice_bounds(ctx: &OpContext<'_>, operand: &Value, len: usize) -> UpdateResult<(usize, usize)> {
    let fields = operand
        .as_object()
        .ok_or_else(|| ctx.operand_mismatch("{$begin, $end}", operand))?;

    let bound = |key: &str| -> UpdateResult<Option<i64>> {
        match fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(|n| Some(n.trunc() as i64))
                .ok_or_else(|| ctx.error(format!("{} must be a number, got {}", key, v))),
        }
    };

    let begin = bound("$begin")?;
    let end = bound("$end")?;

    if let (Some(b), Some(e)) = (begin, end) {
        if b > e {
            return Err(ctx.error(format!("$begin ({}) is greater than $end ({})", b, e)));
        }
    }

    let len = len as i64;
    let begin = begin.unwrap_or(0).clamp(0, len);
    let end = end.unwrap_or(len).clamp(begin, len);
    Ok((begin as usize, end as usize))
}

/// Splits text into words on non-alphanumeric characters and lower-to-upper
/// case boundaries (`"fooBar baz"` -> `["foo", "Bar", "baz"]`).
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn camel_case(text: &str) -> String {
    words(text)
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let lower = w.to_lowercase();
            if i == 0 {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect()
}

fn join_words(text: &str, separator: &str) -> String {
    words(text)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

fn title_case(text: &str) -> String {
    words(text)
        .iter()
        .map(|w| capitalize(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}
