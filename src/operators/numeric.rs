//! Numeric operators
//!
//! Binary operators combine the stored value with the operand; an absent or
//! null stored value counts as 0. Unary operators and the formatting
//! operators need a stored number. Integer arithmetic stays exact when both
//! sides are integers and the result fits in an i64.

use rand::{Rng, RngCore};
use serde_json::Value;

use super::context::OpContext;
use super::kind::UpdateOperator;
use crate::errors::UpdateResult;
use crate::value::number_value;

const MAX_FORMAT_DIGITS: i64 = 100;
const MAX_ROUND_DIGITS: i64 = 15;

pub(crate) fn apply(
    ctx: &OpContext<'_>,
    current: Option<&Value>,
    operand: &Value,
    rng: &mut dyn RngCore,
) -> UpdateResult<Value> {
    use UpdateOperator::*;

    match ctx.operator {
        Inc => binary(ctx, current, operand, i64::checked_add, |a, b| Ok(a + b)),
        Dec => binary(ctx, current, operand, i64::checked_sub, |a, b| Ok(a - b)),
        Mul => binary(ctx, current, operand, i64::checked_mul, |a, b| Ok(a * b)),
        Div => binary(ctx, current, operand, |_, _| None, |a, b| {
            if b == 0.0 {
                Err(ctx.error("division by zero"))
            } else {
                Ok(a / b)
            }
        }),
        Mod => binary(
            ctx,
            current,
            operand,
            |a, b| if b == 0 { None } else { a.checked_rem(b) },
            |a, b| {
                if b == 0.0 {
                    Err(ctx.error("modulo by zero"))
                } else {
                    Ok(a % b)
                }
            },
        ),
        Pow => binary(ctx, current, operand, |_, _| None, |a, b| Ok(a.powf(b))),
        Min | Max => extremum(ctx, current, operand),

        Sqrt => unary(ctx, current, f64::sqrt),
        Floor => unary(ctx, current, f64::floor),
        Ceil => unary(ctx, current, f64::ceil),
        Abs => unary(ctx, current, f64::abs),
        Trunc => unary(ctx, current, f64::trunc),
        Round => {
            let digits = round_digits(operand);
            let scale = 10f64.powi(digits);
            unary(ctx, current, |n| (n * scale).round() / scale)
        }

        Random => finite(ctx, rng.gen::<f64>()),

        ToFixed => {
            let value = stored_number(ctx, current)?;
            let digits = format_digits(ctx, operand, 0)?;
            Ok(Value::String(to_fixed(value, digits)))
        }
        ToExponential => {
            let value = stored_number(ctx, current)?;
            let digits = format_digits(ctx, operand, 0)?;
            Ok(Value::String(to_exponential(value, digits)))
        }
        ToPrecision => {
            let value = stored_number(ctx, current)?;
            let digits = format_digits(ctx, operand, 1)?;
            Ok(Value::String(to_precision(value, digits)))
        }

        other => Err(ctx.error(format!("{} is not a numeric operator", other))),
    }
}

fn binary<I, F>(
    ctx: &OpContext<'_>,
    current: Option<&Value>,
    operand: &Value,
    int_op: I,
    float_op: F,
) -> UpdateResult<Value>
where
    I: Fn(i64, i64) -> Option<i64>,
    F: Fn(f64, f64) -> UpdateResult<f64>,
{
    let rhs = operand_number(ctx, operand)?;
    let zero = Value::from(0);
    let lhs = match current {
        None | Some(Value::Null) => &zero,
        Some(v) if v.is_number() => v,
        Some(other) => return Err(ctx.stored_mismatch("number", other)),
    };

    if let (Some(a), Some(b)) = (lhs.as_i64(), operand.as_i64()) {
        if let Some(result) = int_op(a, b) {
            return Ok(Value::from(result));
        }
    }

    let a = lhs.as_f64().unwrap_or(0.0);
    finite(ctx, float_op(a, rhs)?)
}

fn extremum(ctx: &OpContext<'_>, current: Option<&Value>, operand: &Value) -> UpdateResult<Value> {
    operand_number(ctx, operand)?;
    let stored = match current {
        None | Some(Value::Null) => return Ok(operand.clone()),
        Some(v) => v,
    };
    let a = stored
        .as_f64()
        .ok_or_else(|| ctx.stored_mismatch("number", stored))?;
    let b = operand.as_f64().unwrap_or(a);

    let keep_stored = match ctx.operator {
        UpdateOperator::Min => a <= b,
        _ => a >= b,
    };
    Ok(if keep_stored {
        stored.clone()
    } else {
        operand.clone()
    })
}

fn unary<F>(ctx: &OpContext<'_>, current: Option<&Value>, op: F) -> UpdateResult<Value>
where
    F: Fn(f64) -> f64,
{
    let n = stored_number(ctx, current)?;
    finite(ctx, op(n))
}

fn stored_number(ctx: &OpContext<'_>, current: Option<&Value>) -> UpdateResult<f64> {
    match current {
        None | Some(Value::Null) => Err(ctx.error("field has no numeric value")),
        Some(v) => v.as_f64().ok_or_else(|| ctx.stored_mismatch("number", v)),
    }
}

fn operand_number(ctx: &OpContext<'_>, operand: &Value) -> UpdateResult<f64> {
    operand
        .as_f64()
        .ok_or_else(|| ctx.operand_mismatch("number", operand))
}

fn finite(ctx: &OpContext<'_>, n: f64) -> UpdateResult<Value> {
    number_value(n).ok_or_else(|| ctx.error(format!("result {} is not a finite number", n)))
}

/// Decimal places for `$round`; anything other than a small integer means 0
fn round_digits(operand: &Value) -> i32 {
    operand
        .as_i64()
        .filter(|d| (0..=MAX_ROUND_DIGITS).contains(d))
        .map_or(0, |d| d as i32)
}

fn format_digits(ctx: &OpContext<'_>, operand: &Value, min: i64) -> UpdateResult<usize> {
    let digits = operand
        .as_f64()
        .filter(|d| d.fract() == 0.0)
        .map(|d| d as i64)
        .ok_or_else(|| ctx.operand_mismatch("integer digit count", operand))?;

    if digits < min || digits > MAX_FORMAT_DIGITS {
        return Err(ctx.error(format!(
            "digit count {} outside {}..={}",
            digits, min, MAX_FORMAT_DIGITS
        )));
    }
    Ok(digits as usize)
}

/// Fixed-point notation with `digits` decimals
pub fn to_fixed(value: f64, digits: usize) -> String {
    format!("{:.*}", digits, value)
}

/// Exponential notation with `digits` decimals and a signed exponent (`1.50e+3`)
pub fn to_exponential(value: f64, digits: usize) -> String {
    signed_exponent(&format!("{:.*e}", digits, value))
}

/// `digits` significant digits, switching to exponential notation for very
/// large or very small magnitudes
pub fn to_precision(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return format!("{:.*}", digits.saturating_sub(1), 0.0);
    }

    let exp_form = format!("{:.*e}", digits - 1, value);
    let exponent: i64 = exp_form
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exponent < -6 || exponent >= digits as i64 {
        signed_exponent(&exp_form)
    } else {
        let decimals = (digits as i64 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, value)
    }
}

fn signed_exponent(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn run(op: UpdateOperator, current: Option<Value>, operand: Value) -> UpdateResult<Value> {
        let ctx = OpContext::new(op, "n", None);
        let mut rng = StdRng::seed_from_u64(7);
        apply(&ctx, current.as_ref(), &operand, &mut rng)
    }

    #[test]
    fn test_inc_dec_mul_keep_integers() {
        assert_eq!(run(UpdateOperator::Inc, Some(json!(5)), json!(3)).unwrap(), json!(8));
        assert_eq!(run(UpdateOperator::Dec, Some(json!(5)), json!(3)).unwrap(), json!(2));
        assert_eq!(run(UpdateOperator::Mul, Some(json!(5)), json!(3)).unwrap(), json!(15));
        assert_eq!(run(UpdateOperator::Inc, Some(json!(1.5)), json!(1)).unwrap(), json!(2.5));
    }

    #[test]
    fn test_integer_overflow_stays_float() {
        let out = run(UpdateOperator::Mul, Some(json!(1i64 << 62)), json!(2)).unwrap();
        assert!(out.is_f64());
        assert_eq!(out.as_f64(), Some(9_223_372_036_854_775_808.0));
    }

    #[test]
    fn test_absent_counts_as_zero() {
        assert_eq!(run(UpdateOperator::Inc, None, json!(4)).unwrap(), json!(4));
        assert_eq!(run(UpdateOperator::Mul, Some(Value::Null), json!(4)).unwrap(), json!(0));
    }

    #[test]
    fn test_div_and_mod() {
        assert_eq!(run(UpdateOperator::Div, Some(json!(10)), json!(4)).unwrap(), json!(2.5));
        assert_eq!(run(UpdateOperator::Div, Some(json!(10)), json!(5)).unwrap(), json!(2));
        assert!(run(UpdateOperator::Div, Some(json!(10)), json!(0)).is_err());
        assert_eq!(run(UpdateOperator::Mod, Some(json!(10)), json!(3)).unwrap(), json!(1));
        assert_eq!(run(UpdateOperator::Mod, Some(json!(-7)), json!(3)).unwrap(), json!(-1));
        assert!(run(UpdateOperator::Mod, Some(json!(10)), json!(0)).is_err());
    }

    #[test]
    fn test_min_max() {
        assert_eq!(run(UpdateOperator::Min, Some(json!(5)), json!(3)).unwrap(), json!(3));
        assert_eq!(run(UpdateOperator::Min, Some(json!(2)), json!(3)).unwrap(), json!(2));
        assert_eq!(run(UpdateOperator::Max, Some(json!(5)), json!(9)).unwrap(), json!(9));
        assert_eq!(run(UpdateOperator::Max, None, json!(9)).unwrap(), json!(9));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(run(UpdateOperator::Sqrt, Some(json!(16)), json!(true)).unwrap(), json!(4));
        assert_eq!(run(UpdateOperator::Floor, Some(json!(2.7)), json!(1)).unwrap(), json!(2));
        assert_eq!(run(UpdateOperator::Ceil, Some(json!(2.1)), json!(1)).unwrap(), json!(3));
        assert_eq!(run(UpdateOperator::Abs, Some(json!(-4)), json!(1)).unwrap(), json!(4));
        assert_eq!(run(UpdateOperator::Trunc, Some(json!(-2.7)), json!(1)).unwrap(), json!(-2));
        assert_eq!(run(UpdateOperator::Round, Some(json!(2.5)), json!(true)).unwrap(), json!(3));
        assert_eq!(run(UpdateOperator::Round, Some(json!(3.14159)), json!(2)).unwrap(), json!(3.14));
    }

    #[test]
    fn test_unary_needs_stored_number() {
        assert!(run(UpdateOperator::Sqrt, None, json!(1)).is_err());
        assert!(run(UpdateOperator::Sqrt, Some(json!(-1)), json!(1)).is_err());
        assert!(run(UpdateOperator::Abs, Some(json!("x")), json!(1)).is_err());
    }

    #[test]
    fn test_pow() {
        assert_eq!(run(UpdateOperator::Pow, Some(json!(2)), json!(10)).unwrap(), json!(1024));
        assert_eq!(run(UpdateOperator::Pow, Some(json!(9)), json!(0.5)).unwrap(), json!(3));
    }

    #[test]
    fn test_non_numeric_operand_rejected() {
        let err = run(UpdateOperator::Inc, Some(json!(1)), json!("2")).unwrap_err();
        assert_eq!(err.code(), "AERO_UPDATE_OPERATOR_INVALID");
        assert!(run(UpdateOperator::Inc, Some(json!("1")), json!(2)).is_err());
    }

    #[test]
    fn test_random_in_unit_interval() {
        for _ in 0..20 {
            let v = run(UpdateOperator::Random, Some(json!(42)), json!(null)).unwrap();
            let n = v.as_f64().unwrap();
            assert!((0.0..1.0).contains(&n));
        }
    }

    #[test]
    fn test_formatting_operators() {
        assert_eq!(run(UpdateOperator::ToFixed, Some(json!(3.14159)), json!(2)).unwrap(), json!("3.14"));
        assert_eq!(run(UpdateOperator::ToFixed, Some(json!(7)), json!(0)).unwrap(), json!("7"));
        assert_eq!(
            run(UpdateOperator::ToExponential, Some(json!(123456)), json!(2)).unwrap(),
            json!("1.23e+5")
        );
        assert_eq!(
            run(UpdateOperator::ToExponential, Some(json!(0.00015)), json!(1)).unwrap(),
            json!("1.5e-4")
        );
        assert_eq!(run(UpdateOperator::ToPrecision, Some(json!(123.456)), json!(4)).unwrap(), json!("123.5"));
        assert_eq!(run(UpdateOperator::ToPrecision, Some(json!(123456)), json!(2)).unwrap(), json!("1.2e+5"));
        assert_eq!(run(UpdateOperator::ToPrecision, Some(json!(0)), json!(3)).unwrap(), json!("0.00"));
    }

    #[test]
    fn test_formatting_rejects_bad_inputs() {
        assert!(run(UpdateOperator::ToFixed, Some(json!("3.1")), json!(2)).is_err());
        assert!(run(UpdateOperator::ToFixed, Some(json!(3.1)), json!("2")).is_err());
        assert!(run(UpdateOperator::ToFixed, None, json!(2)).is_err());
        assert!(run(UpdateOperator::ToPrecision, Some(json!(3.1)), json!(0)).is_err());
        assert!(run(UpdateOperator::ToFixed, Some(json!(3.1)), json!(101)).is_err());
    }
}
