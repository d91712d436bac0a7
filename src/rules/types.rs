//! Rule definitions
//!
//! A `RuleSet` maps a field path to the `FieldRules` checked before a value is
//! written to it. Rules are parsed from their JSON form
//! (`{"age": {"$lessThan": 130, "$integer": true}}`) or built in code.
//! `$custom` predicates can only be built in code.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::errors::{UpdateError, UpdateResult};

/// Compiled-size cap for `$match` patterns
const MATCH_SIZE_LIMIT: usize = 1024 * 1024;

/// Caller-supplied predicate for `$custom`
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Wrapper giving `$custom` predicates a `Debug` impl
#[derive(Clone)]
pub struct CustomRule(pub Predicate);

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(<predicate>)")
    }
}

/// Unit for `$angle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    Degrees,
    Radians,
}

impl AngleUnit {
    /// Full-turn range used when `$range` is omitted
    pub fn full_turn(&self) -> (f64, f64) {
        match self {
            AngleUnit::Degrees => (0.0, 360.0),
            AngleUnit::Radians => (0.0, 2.0 * PI),
        }
    }
}

/// A single validation rule
#[derive(Debug, Clone)]
pub enum Rule {
    // Normalization
    Default(Value),
    Required,
    Trim,

    // Numeric
    LessThan(f64),
    GreaterThan(f64),
    LessThanOrEqual(f64),
    GreaterThanOrEqual(f64),
    Range { min: f64, max: f64 },
    MultipleOf(f64),
    Positive,
    Negative,
    Integer,
    Float,
    Even,
    Odd,
    Prime,
    Perfect,
    Fibonacci,
    PowerOfTwo,
    PowerOfTen,
    PowerOf(f64),
    Finite,
    Infinite,
    Palindrome,
    Harshad,
    EpochTime,
    Angle { unit: AngleUnit, min: f64, max: f64 },

    // String
    ExactLength(usize),
    MinLength(usize),
    MaxLength(usize),
    AlphaNumeric,
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Exclude(Vec<String>),
    NoWhitespace,
    OnlySpecialChars,
    NoSpecialChars,
    Alpha,
    Numeric,
    Match(Regex),
    ValidEmail,
    ValidUrl,
    ValidIp,
    ValidIpv4,
    ValidIpv6,
    ValidCreditCard,

    // Boolean
    MustBeTrue,
    MustBeFalse,

    // Cross-type
    Enum(Vec<Value>),
    Unique(Vec<Value>),
    Custom(CustomRule),
    LogicalOr(Vec<FieldRules>),
    LogicalNot(Box<FieldRules>),
}

impl Rule {
    /// Rule keyword as written in rule definitions
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Default(_) => "$default",
            Rule::Required => "$required",
            Rule::Trim => "$trim",
            Rule::LessThan(_) => "$lessThan",
            Rule::GreaterThan(_) => "$greaterThan",
            Rule::LessThanOrEqual(_) => "$lessThanOrEqual",
            Rule::GreaterThanOrEqual(_) => "$greaterThanOrEqual",
            Rule::Range { .. } => "$range",
            Rule::MultipleOf(_) => "$multipleOf",
            Rule::Positive => "$positive",
            Rule::Negative => "$negative",
            Rule::Integer => "$integer",
            Rule::Float => "$float",
            Rule::Even => "$even",
            Rule::Odd => "$odd",
            Rule::Prime => "$prime",
            Rule::Perfect => "$perfect",
            Rule::Fibonacci => "$fibonacci",
            Rule::PowerOfTwo => "$powerOfTwo",
            Rule::PowerOfTen => "$powerOfTen",
            Rule::PowerOf(_) => "$powerOf",
            Rule::Finite => "$finite",
            Rule::Infinite => "$infinite",
            Rule::Palindrome => "$palindrome",
            Rule::Harshad => "$harshad",
            Rule::EpochTime => "$epochTime",
            Rule::Angle { .. } => "$angle",
            Rule::ExactLength(_) => "$exactLength",
            Rule::MinLength(_) => "$minLength",
            Rule::MaxLength(_) => "$maxLength",
            Rule::AlphaNumeric => "$alphaNumeric",
            Rule::Contains(_) => "$contains",
            Rule::StartsWith(_) => "$startsWith",
            Rule::EndsWith(_) => "$endsWith",
            Rule::Exclude(_) => "$exclude",
            Rule::NoWhitespace => "$noWhitespace",
            Rule::OnlySpecialChars => "$onlySpecialChars",
            Rule::NoSpecialChars => "$noSpecialChars",
            Rule::Alpha => "$alpha",
            Rule::Numeric => "$numeric",
            Rule::Match(_) => "$match",
            Rule::ValidEmail => "$validEmail",
            Rule::ValidUrl => "$validURL",
            Rule::ValidIp => "$validIP",
            Rule::ValidIpv4 => "$validIPv4",
            Rule::ValidIpv6 => "$validIPv6",
            Rule::ValidCreditCard => "$validCreditCard",
            Rule::MustBeTrue => "$mustBeTrue",
            Rule::MustBeFalse => "$mustBeFalse",
            Rule::Enum(_) => "$enum",
            Rule::Unique(_) => "$unique",
            Rule::Custom(_) => "$custom",
            Rule::LogicalOr(_) => "$logicalOr",
            Rule::LogicalNot(_) => "$logicalNot",
        }
    }

    /// Position in the fixed evaluation order
    pub fn rank(&self) -> u8 {
        match self {
            Rule::Default(_) => 0,
            Rule::Required => 1,
            Rule::Trim => 2,
            Rule::LessThan(_) => 10,
            Rule::GreaterThan(_) => 11,
            Rule::LessThanOrEqual(_) => 12,
            Rule::GreaterThanOrEqual(_) => 13,
            Rule::Range { .. } => 14,
            Rule::MultipleOf(_) => 15,
            Rule::Positive => 16,
            Rule::Negative => 17,
            Rule::Integer => 18,
            Rule::Float => 19,
            Rule::Even => 20,
            Rule::Odd => 21,
            Rule::Prime => 22,
            Rule::Perfect => 23,
            Rule::Fibonacci => 24,
            Rule::PowerOfTwo => 25,
            Rule::PowerOfTen => 26,
            Rule::PowerOf(_) => 27,
            Rule::Finite => 28,
            Rule::Infinite => 29,
            Rule::Palindrome => 30,
            Rule::Harshad => 31,
            Rule::EpochTime => 32,
            Rule::Angle { .. } => 33,
            Rule::ExactLength(_) => 40,
            Rule::MinLength(_) => 41,
            Rule::MaxLength(_) => 42,
            Rule::AlphaNumeric => 43,
            Rule::Contains(_) => 44,
            Rule::StartsWith(_) => 45,
            Rule::EndsWith(_) => 46,
            Rule::Exclude(_) => 47,
            Rule::NoWhitespace => 48,
            Rule::OnlySpecialChars => 49,
            Rule::NoSpecialChars => 50,
            Rule::Alpha => 51,
            Rule::Numeric => 52,
            Rule::Match(_) => 53,
            Rule::ValidEmail => 54,
            Rule::ValidUrl => 55,
            Rule::ValidIp => 56,
            Rule::ValidIpv4 => 57,
            Rule::ValidIpv6 => 58,
            Rule::ValidCreditCard => 59,
            Rule::MustBeTrue => 70,
            Rule::MustBeFalse => 71,
            Rule::Enum(_) => 80,
            Rule::Unique(_) => 81,
            Rule::Custom(_) => 82,
            Rule::LogicalOr(_) => 83,
            Rule::LogicalNot(_) => 84,
        }
    }

    /// Wraps a closure as a `$custom` rule
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Rule::Custom(CustomRule(Arc::new(predicate)))
    }
}

/// Rules for one field, kept in evaluation order
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: Vec<Rule>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, builder style
    pub fn with(mut self, rule: Rule) -> Self {
        self.push(rule);
        self
    }

    /// Adds a rule at its place in the evaluation order
    pub fn push(&mut self, rule: Rule) {
        let rank = rule.rank();
        let index = self.rules.partition_point(|r| r.rank() <= rank);
        self.rules.insert(index, rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The `$default` value, if declared
    pub fn default_value(&self) -> Option<&Value> {
        self.rules.iter().find_map(|r| match r {
            Rule::Default(v) => Some(v),
            _ => None,
        })
    }

    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required))
    }

    /// Parses one field's rule object
    pub fn from_json(field: &str, value: &Value) -> UpdateResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| UpdateError::invalid_rule(field, "<rules>", "rule set must be an object"))?;

        let mut rules = FieldRules::new();
        for (name, param) in obj {
            if let Some(rule) = parse_rule(field, name, param)? {
                rules.push(rule);
            }
        }
        Ok(rules)
    }
}

/// Per-field rules for one entity
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: HashMap<String, FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rules for a field, builder style
    pub fn with(mut self, field: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.insert(field.into(), rules);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, rules: FieldRules) {
        self.fields.insert(field.into(), rules);
    }

    pub fn get(&self, field: &str) -> Option<&FieldRules> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a rule set from `{field: {rule: param}}`
    pub fn from_json(value: &Value) -> UpdateResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| UpdateError::invalid_rule("<root>", "<rules>", "rule set must be an object"))?;

        let mut set = RuleSet::new();
        for (field, rules) in obj {
            set.insert(field.clone(), FieldRules::from_json(field, rules)?);
        }
        Ok(set)
    }
}

/// Parses a single rule. Boolean flags set to `false` yield `None`.
fn parse_rule(field: &str, name: &str, param: &Value) -> UpdateResult<Option<Rule>> {
    let p = RuleParam { field, name, param };

    let rule = match name {
        "$default" => Rule::Default(param.clone()),
        "$required" => return p.flag(Rule::Required),
        "$trim" => return p.flag(Rule::Trim),

        "$lessThan" => Rule::LessThan(p.number()?),
        "$greaterThan" => Rule::GreaterThan(p.number()?),
        "$lessThanOrEqual" => Rule::LessThanOrEqual(p.number()?),
        "$greaterThanOrEqual" => Rule::GreaterThanOrEqual(p.number()?),
        "$range" => {
            let obj = p.object()?;
            let min = p.number_key(obj, "$min")?;
            let max = p.number_key(obj, "$max")?;
            if min > max {
                return Err(p.invalid("$min must not exceed $max"));
            }
            Rule::Range { min, max }
        }
        "$multipleOf" => {
            let n = p.number()?;
            if n == 0.0 {
                return Err(p.invalid("divisor must be non-zero"));
            }
            Rule::MultipleOf(n)
        }
        "$positive" => return p.flag(Rule::Positive),
        "$negative" => return p.flag(Rule::Negative),
        "$integer" => return p.flag(Rule::Integer),
        "$float" => return p.flag(Rule::Float),
        "$even" => return p.flag(Rule::Even),
        "$odd" => return p.flag(Rule::Odd),
        "$prime" => return p.flag(Rule::Prime),
        "$perfect" => return p.flag(Rule::Perfect),
        "$fibonacci" => return p.flag(Rule::Fibonacci),
        "$powerOfTwo" => return p.flag(Rule::PowerOfTwo),
        "$powerOfTen" => return p.flag(Rule::PowerOfTen),
        "$powerOf" => {
            let base = p.number()?;
            if base <= 0.0 || base == 1.0 {
                return Err(p.invalid("base must be positive and not 1"));
            }
            Rule::PowerOf(base)
        }
        "$finite" => return p.flag(Rule::Finite),
        "$infinite" => return p.flag(Rule::Infinite),
        "$palindrome" => return p.flag(Rule::Palindrome),
        "$harshad" => return p.flag(Rule::Harshad),
        "$epochTime" => return p.flag(Rule::EpochTime),
        "$angle" => parse_angle(&p)?,

        "$exactLength" => Rule::ExactLength(p.length()?),
        "$minLength" => Rule::MinLength(p.length()?),
        "$maxLength" => Rule::MaxLength(p.length()?),
        "$alphaNumeric" => return p.flag(Rule::AlphaNumeric),
        "$contains" => Rule::Contains(p.string()?),
        "$startsWith" => Rule::StartsWith(p.string()?),
        "$endsWith" => Rule::EndsWith(p.string()?),
        "$exclude" => Rule::Exclude(p.strings()?),
        "$noWhitespace" => return p.flag(Rule::NoWhitespace),
        "$onlySpecialChars" => return p.flag(Rule::OnlySpecialChars),
        "$noSpecialChars" => return p.flag(Rule::NoSpecialChars),
        "$alpha" => return p.flag(Rule::Alpha),
        "$numeric" => return p.flag(Rule::Numeric),
        "$match" => {
            let pattern = p.string()?;
            let regex = RegexBuilder::new(&pattern)
                .size_limit(MATCH_SIZE_LIMIT)
                .build()
                .map_err(|e| p.invalid(e.to_string()))?;
            Rule::Match(regex)
        }
        "$validEmail" => return p.flag(Rule::ValidEmail),
        "$validURL" => return p.flag(Rule::ValidUrl),
        "$validIP" => return p.flag(Rule::ValidIp),
        "$validIPv4" => return p.flag(Rule::ValidIpv4),
        "$validIPv6" => return p.flag(Rule::ValidIpv6),
        "$validCreditCard" => return p.flag(Rule::ValidCreditCard),

        "$mustBeTrue" => return p.flag(Rule::MustBeTrue),
        "$mustBeFalse" => return p.flag(Rule::MustBeFalse),

        "$enum" => Rule::Enum(p.array()?.clone()),
        "$unique" => match param {
            Value::Array(items) => Rule::Unique(items.clone()),
            other => Rule::Unique(vec![other.clone()]),
        },
        "$custom" => {
            return Err(p.invalid("custom predicates must be registered in code"));
        }
        "$logicalOr" => {
            let branches = p
                .array()?
                .iter()
                .map(|branch| FieldRules::from_json(field, branch))
                .collect::<UpdateResult<Vec<_>>>()?;
            if branches.is_empty() {
                return Err(p.invalid("at least one branch is required"));
            }
            Rule::LogicalOr(branches)
        }
        "$logicalNot" => Rule::LogicalNot(Box::new(FieldRules::from_json(field, param)?)),

        other => {
            return Err(UpdateError::invalid_rule(field, other, "unknown rule"));
        }
    };

    Ok(Some(rule))
}

fn parse_angle(p: &RuleParam<'_>) -> UpdateResult<Rule> {
    let obj = p.object()?;
    let unit = match obj.get("$unit").and_then(Value::as_str) {
        None | Some("degrees") => AngleUnit::Degrees,
        Some("radians") => AngleUnit::Radians,
        Some(other) => return Err(p.invalid(format!("unknown unit '{}'", other))),
    };

    let (min, max) = match obj.get("$range") {
        None => unit.full_turn(),
        Some(Value::Object(range)) => (p.number_key(range, "$min")?, p.number_key(range, "$max")?),
        Some(Value::Array(bounds)) if bounds.len() == 2 => {
            match (bounds[0].as_f64(), bounds[1].as_f64()) {
                (Some(min), Some(max)) => (min, max),
                _ => return Err(p.invalid("$range bounds must be numbers")),
            }
        }
        Some(_) => return Err(p.invalid("$range must be {$min, $max} or [min, max]")),
    };

    if min > max {
        return Err(p.invalid("$range minimum exceeds maximum"));
    }
    Ok(Rule::Angle { unit, min, max })
}

/// Typed accessors over one rule's parameter
struct RuleParam<'a> {
    field: &'a str,
    name: &'a str,
    param: &'a Value,
}

impl<'a> RuleParam<'a> {
    fn invalid(&self, reason: impl Into<String>) -> UpdateError {
        UpdateError::invalid_rule(self.field, self.name, reason)
    }

    fn flag(&self, rule: Rule) -> UpdateResult<Option<Rule>> {
        match self.param {
            Value::Bool(true) => Ok(Some(rule)),
            Value::Bool(false) => Ok(None),
            _ => Err(self.invalid("expected true or false")),
        }
    }

    fn number(&self) -> UpdateResult<f64> {
        self.param
            .as_f64()
            .ok_or_else(|| self.invalid("expected a number"))
    }

    fn number_key(&self, obj: &Map<String, Value>, key: &str) -> UpdateResult<f64> {
        obj.get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| self.invalid(format!("{} must be a number", key)))
    }

    fn length(&self) -> UpdateResult<usize> {
        self.param
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| self.invalid("expected a non-negative integer"))
    }

    fn string(&self) -> UpdateResult<String> {
        self.param
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid("expected a string"))
    }

    fn strings(&self) -> UpdateResult<Vec<String>> {
        match self.param {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid("expected strings"))
                })
                .collect(),
            _ => Err(self.invalid("expected a string or an array of strings")),
        }
    }

    fn array(&self) -> UpdateResult<&'a Vec<Value>> {
        self.param
            .as_array()
            .ok_or_else(|| self.invalid("expected an array"))
    }

    fn object(&self) -> UpdateResult<&'a Map<String, Value>> {
        self.param
            .as_object()
            .ok_or_else(|| self.invalid("expected an object"))
    }
}
