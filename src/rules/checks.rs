//! Individual rule checks
//!
//! Each check inspects the operand being written and returns a failure
//! message when the rule rejects it. A rule applied to an operand of the
//! wrong JSON kind fails.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use super::types::Rule;
use crate::path::value_kind;
use crate::value::values_equal;

const EPSILON: f64 = 1e-9;

/// Evaluates a leaf rule against `value`.
///
/// Normalizers and logical combinators are handled by the validator and
/// always pass here.
pub(crate) fn evaluate(rule: &Rule, value: &Value) -> Result<(), String> {
    match rule {
        Rule::Default(_) | Rule::Required | Rule::Trim => Ok(()),
        Rule::LogicalOr(_) | Rule::LogicalNot(_) => Ok(()),

        Rule::LessThan(bound) => expect(number(value)? < *bound, || format!("expected value < {}", bound)),
        Rule::GreaterThan(bound) => expect(number(value)? > *bound, || format!("expected value > {}", bound)),
        Rule::LessThanOrEqual(bound) => {
            expect(number(value)? <= *bound, || format!("expected value <= {}", bound))
        }
        Rule::GreaterThanOrEqual(bound) => {
            expect(number(value)? >= *bound, || format!("expected value >= {}", bound))
        }
        Rule::Range { min, max } => {
            let n = number(value)?;
            expect(n >= *min && n <= *max, || format!("expected value in [{}, {}]", min, max))
        }
        Rule::MultipleOf(divisor) => {
            let ratio = number(value)? / divisor;
            expect((ratio - ratio.round()).abs() < EPSILON, || {
                format!("expected a multiple of {}", divisor)
            })
        }
        Rule::Positive => expect(number(value)? > 0.0, || "expected a positive number".into()),
        Rule::Negative => expect(number(value)? < 0.0, || "expected a negative number".into()),
        Rule::Integer => expect(number(value)?.fract() == 0.0, || "expected an integer".into()),
        Rule::Float => expect(number(value)?.fract() != 0.0, || "expected a non-integral number".into()),
        Rule::Even => {
            let n = integer(value)?;
            expect(n % 2 == 0, || "expected an even integer".into())
        }
        Rule::Odd => {
            let n = integer(value)?;
            expect(n % 2 != 0, || "expected an odd integer".into())
        }
        Rule::Prime => expect(is_prime(integer(value)?), || "expected a prime number".into()),
        Rule::Perfect => expect(is_perfect(integer(value)?), || "expected a perfect number".into()),
        Rule::Fibonacci => expect(is_fibonacci(integer(value)?), || "expected a Fibonacci number".into()),
        Rule::PowerOfTwo => expect(is_power_of(number(value)?, 2.0), || "expected a power of 2".into()),
        Rule::PowerOfTen => expect(is_power_of(number(value)?, 10.0), || "expected a power of 10".into()),
        Rule::PowerOf(base) => {
            expect(is_power_of(number(value)?, *base), || format!("expected a power of {}", base))
        }
        Rule::Finite => expect(number(value)?.is_finite(), || "expected a finite number".into()),
        Rule::Infinite => expect(!number(value)?.is_finite(), || "expected an infinite number".into()),
        Rule::Palindrome => expect(is_palindrome(value)?, || "expected a palindrome".into()),
        Rule::Harshad => expect(is_harshad(integer(value)?), || "expected a Harshad number".into()),
        Rule::EpochTime => expect(is_epoch_time(value), || "expected a valid timestamp".into()),
        Rule::Angle { unit, min, max } => {
            let n = number(value)?;
            expect(n >= *min && n <= *max, || {
                format!("expected an angle in [{}, {}] {:?}", min, max, unit).to_lowercase()
            })
        }

        Rule::ExactLength(len) => {
            let count = string(value)?.chars().count();
            expect(count == *len, || format!("expected length {}, got {}", len, count))
        }
        Rule::MinLength(len) => {
            let count = string(value)?.chars().count();
            expect(count >= *len, || format!("expected length >= {}, got {}", len, count))
        }
        Rule::MaxLength(len) => {
            let count = string(value)?.chars().count();
            expect(count <= *len, || format!("expected length <= {}, got {}", len, count))
        }
        Rule::AlphaNumeric => {
            let s = string(value)?;
            expect(!s.is_empty() && s.chars().all(char::is_alphanumeric), || {
                "expected only letters and digits".into()
            })
        }
        Rule::Contains(needle) => {
            expect(string(value)?.contains(needle.as_str()), || format!("expected to contain '{}'", needle))
        }
        Rule::StartsWith(prefix) => {
            expect(string(value)?.starts_with(prefix.as_str()), || format!("expected to start with '{}'", prefix))
        }
        Rule::EndsWith(suffix) => {
            expect(string(value)?.ends_with(suffix.as_str()), || format!("expected to end with '{}'", suffix))
        }
        Rule::Exclude(banned) => {
            let s = string(value)?;
            match banned.iter().find(|b| s.contains(b.as_str())) {
                Some(found) => Err(format!("must not contain '{}'", found)),
                None => Ok(()),
            }
        }
        Rule::NoWhitespace => {
            expect(!string(value)?.chars().any(char::is_whitespace), || "must not contain whitespace".into())
        }
        Rule::OnlySpecialChars => {
            let s = string(value)?;
            expect(!s.is_empty() && s.chars().all(is_special), || "expected only special characters".into())
        }
        Rule::NoSpecialChars => {
            expect(!string(value)?.chars().any(is_special), || "must not contain special characters".into())
        }
        Rule::Alpha => {
            let s = string(value)?;
            expect(!s.is_empty() && s.chars().all(char::is_alphabetic), || "expected only letters".into())
        }
        Rule::Numeric => {
            let s = string(value)?;
            expect(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit()), || "expected only digits".into())
        }
        Rule::Match(regex) => {
            expect(regex.is_match(string(value)?), || format!("expected to match /{}/", regex.as_str()))
        }
        Rule::ValidEmail => expect(email_regex().is_match(string(value)?), || "expected an email address".into()),
        Rule::ValidUrl => expect(url_regex().is_match(string(value)?), || "expected a URL".into()),
        Rule::ValidIp => expect(string(value)?.parse::<IpAddr>().is_ok(), || "expected an IP address".into()),
        Rule::ValidIpv4 => {
            expect(string(value)?.parse::<Ipv4Addr>().is_ok(), || "expected an IPv4 address".into())
        }
        Rule::ValidIpv6 => {
            expect(string(value)?.parse::<Ipv6Addr>().is_ok(), || "expected an IPv6 address".into())
        }
        Rule::ValidCreditCard => {
            expect(is_credit_card(string(value)?), || "expected a credit card number".into())
        }

        Rule::MustBeTrue => expect(value == &Value::Bool(true), || "expected true".into()),
        Rule::MustBeFalse => expect(value == &Value::Bool(false), || "expected false".into()),

        Rule::Enum(allowed) => expect(allowed.iter().any(|a| values_equal(a, value)), || {
            format!("expected one of {}", Value::Array(allowed.clone()))
        }),
        Rule::Unique(taken) => expect(!taken.iter().any(|t| values_equal(t, value)), || {
            format!("value {} is already taken", value)
        }),
        Rule::Custom(custom) => expect((custom.0)(value), || "custom predicate rejected value".into()),
    }
}

fn expect(ok: bool, message: impl FnOnce() -> String) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(message())
    }
}

fn number(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("expected a number, got {}", value_kind(value)))
}

fn integer(value: &Value) -> Result<i64, String> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(format!("expected an integer, got {}", value_kind(value))),
    }
}

fn string(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected a string, got {}", value_kind(value)))
}

fn is_special(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Deterministic Miller-Rabin; these bases are exact for every 64-bit input.
fn is_prime(n: i64) -> bool {
    const BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    let n = n as u64;
    for &p in &BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &BASES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Every perfect number that fits in an i64. No odd perfect number exists
/// in this range, and the even ones are `2^(p-1) * (2^p - 1)` for Mersenne
/// primes `2^p - 1`.
const PERFECT_NUMBERS: [i64; 8] = [
    6,
    28,
    496,
    8_128,
    33_550_336,
    8_589_869_056,
    137_438_691_328,
    2_305_843_008_139_952_128,
];

fn is_perfect(n: i64) -> bool {
    PERFECT_NUMBERS.contains(&n)
}

fn is_fibonacci(n: i64) -> bool {
    if n < 0 {
        return false;
    }
    let (mut a, mut b): (i64, i64) = (0, 1);
    while a < n {
        let next = match a.checked_add(b) {
            Some(next) => next,
            None => return false,
        };
        a = b;
        b = next;
    }
    a == n
}

fn is_power_of(n: f64, base: f64) -> bool {
    if n <= 0.0 || base <= 0.0 || base == 1.0 {
        return false;
    }
    let exponent = n.ln() / base.ln();
    (exponent - exponent.round()).abs() < EPSILON
}

fn is_palindrome(value: &Value) -> Result<bool, String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(format!("expected a number or string, got {}", value_kind(other))),
    };
    Ok(text.chars().eq(text.chars().rev()))
}

fn is_harshad(n: i64) -> bool {
    if n <= 0 {
        return false;
    }
    let digit_sum: i64 = n
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(i64::from)
        .sum();
    n % digit_sum == 0
}

fn is_epoch_time(value: &Value) -> bool {
    match value {
        Value::Number(_) => match integer(value) {
            Ok(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
                .map_or(false, |dt| dt.timestamp_millis() == ms),
            Err(_) => false,
        },
        Value::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
        _ => false,
    }
}

fn is_credit_card(s: &str) -> bool {
    let digits: Vec<u32> = s
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();

    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    // Luhn checksum
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                *d
            }
        })
        .sum();
    sum % 10 == 0
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r"^(https?|ftp)://[^\s/?#]+\.[^\s/?#]+(:\d+)?([/?#]\S*)?$")
            .expect("url pattern is valid")
    })
}
