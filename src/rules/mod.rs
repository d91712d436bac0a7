//! Per-field validation rules
//!
//! Rules gate numeric and string operators: the operand is checked before the
//! mutation runs, and a rejection aborts the whole update.
//!
//! # Rule families
//!
//! - Numeric: bounds, ranges, divisibility, number classes, timestamps, angles
//! - String: length, character classes, substrings, regex, formats
//! - Boolean: `$mustBeTrue`, `$mustBeFalse`
//! - Cross-type: `$enum`, `$unique`, `$required`, `$custom`, `$logicalOr`,
//!   `$logicalNot`, `$default`, `$trim`

mod checks;
mod types;
mod validator;

pub use types::{AngleUnit, CustomRule, FieldRules, Predicate, Rule, RuleSet};
pub use validator::{RuleValidator, ValidationPolicy};
