//! Rule validator
//!
//! Evaluates one field's rules against the operand about to be written.
//!
//! Evaluation order:
//! 1. `$default` replaces an absent operand (the default is not re-validated)
//! 2. `$required` rejects an absent operand
//! 3. The skip policy may short-circuit on absent/falsy operands
//! 4. `$trim` normalizes strings for the remaining checks
//! 5. Numeric, string, boolean and cross-type checks, in declaration rank
//!
//! The validator returns the normalized operand. It never reads the value
//! already stored in the record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::checks;
use super::types::{FieldRules, Rule, RuleSet};
use crate::errors::{UpdateError, UpdateResult};
use crate::value::is_truthy;

/// Which operands bypass rule checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Only null operands skip validation
    #[default]
    SkipAbsent,
    /// Null, `0`, `false` and `""` all skip validation
    SkipFalsy,
}

impl ValidationPolicy {
    fn skips(&self, value: &Value) -> bool {
        match self {
            ValidationPolicy::SkipAbsent => value.is_null(),
            ValidationPolicy::SkipFalsy => !is_truthy(value),
        }
    }
}

/// Checks operands against per-field rule sets
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator {
    policy: ValidationPolicy,
}

impl RuleValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Validates `candidate` for `field` and returns the normalized value.
    ///
    /// Fields without rules pass unchanged.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::Validation` naming the field and the first rule
    /// that rejected the operand.
    pub fn validate(&self, field: &str, rules: &RuleSet, candidate: &Value) -> UpdateResult<Value> {
        match rules.get(field) {
            Some(field_rules) => self.validate_field(field, field_rules, candidate),
            None => Ok(candidate.clone()),
        }
    }

    /// Validates against an explicit rule list
    pub fn validate_field(
        &self,
        field: &str,
        rules: &FieldRules,
        candidate: &Value,
    ) -> UpdateResult<Value> {
        if candidate.is_null() {
            if let Some(default) = rules.default_value() {
                return Ok(default.clone());
            }
            if rules.is_required() {
                return Err(UpdateError::validation(field, "$required", "value is required"));
            }
        }

        if self.policy.skips(candidate) {
            return Ok(candidate.clone());
        }

        let mut value = candidate.clone();
        for rule in rules.iter() {
            match rule {
                Rule::Default(_) | Rule::Required => {}
                Rule::Trim => {
                    if let Value::String(s) = &value {
                        value = Value::String(s.trim().to_string());
                    }
                }
                Rule::LogicalOr(branches) => {
                    let any = branches
                        .iter()
                        .any(|branch| self.validate_field(field, branch, &value).is_ok());
                    if !any {
                        return Err(UpdateError::validation(
                            field,
                            rule.name(),
                            "no alternative accepted the value",
                        ));
                    }
                }
                Rule::LogicalNot(inner) => {
                    if self.validate_field(field, inner, &value).is_ok() {
                        return Err(UpdateError::validation(
                            field,
                            rule.name(),
                            "negated rules accepted the value",
                        ));
                    }
                }
                leaf => {
                    checks::evaluate(leaf, &value)
                        .map_err(|message| UpdateError::validation(field, leaf.name(), message))?;
                }
            }
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: Value) -> RuleSet {
        RuleSet::from_json(&value).unwrap()
    }

    #[test]
    fn test_field_without_rules_passes() {
        let validator = RuleValidator::default();
        let set = rules(json!({"age": {"$lessThan": 0}}));

        let out = validator.validate("name", &set, &json!("anything")).unwrap();
        assert_eq!(out, json!("anything"));
    }

    #[test]
    fn test_failure_names_field_and_rule() {
        let validator = RuleValidator::default();
        let set = rules(json!({"age": {"$lessThan": 0}}));

        let err = validator.validate("age", &set, &json!(1)).unwrap_err();
        match err {
            UpdateError::Validation { field, rule, .. } => {
                assert_eq!(field, "age");
                assert_eq!(rule, "$lessThan");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_first_failing_rule_in_fixed_order() {
        let validator = RuleValidator::default();
        let set = rules(json!({"n": {"$even": true, "$lessThan": 0}}));

        let err = validator.validate("n", &set, &json!(3)).unwrap_err();
        assert!(matches!(err, UpdateError::Validation { ref rule, .. } if rule == "$lessThan"));
    }

    #[test]
    fn test_skip_absent_still_checks_zero() {
        let validator = RuleValidator::new(ValidationPolicy::SkipAbsent);
        let set = rules(json!({"n": {"$positive": true}}));

        assert!(validator.validate("n", &set, &json!(0)).is_err());
        assert!(validator.validate("n", &set, &Value::Null).is_ok());
    }

    #[test]
    fn test_skip_falsy_bypasses_zero_false_and_empty() {
        let validator = RuleValidator::new(ValidationPolicy::SkipFalsy);
        let set = rules(json!({
            "n": {"$positive": true},
            "s": {"$minLength": 3},
            "b": {"$mustBeTrue": true}
        }));

        assert!(validator.validate("n", &set, &json!(0)).is_ok());
        assert!(validator.validate("s", &set, &json!("")).is_ok());
        assert!(validator.validate("b", &set, &json!(false)).is_ok());
        assert!(validator.validate("n", &set, &json!(-1)).is_err());
    }

    #[test]
    fn test_default_fills_absent_without_revalidation() {
        let validator = RuleValidator::default();
        let set = rules(json!({"role": {"$default": "guest", "$enum": ["admin", "user"]}}));

        let out = validator.validate("role", &set, &Value::Null).unwrap();
        assert_eq!(out, json!("guest"));
    }

    #[test]
    fn test_required_rejects_null() {
        let validator = RuleValidator::new(ValidationPolicy::SkipFalsy);
        let set = rules(json!({"email": {"$required": true}}));

        let err = validator.validate("email", &set, &Value::Null).unwrap_err();
        assert!(matches!(err, UpdateError::Validation { ref rule, .. } if rule == "$required"));
    }

    #[test]
    fn test_trim_normalizes_before_checks() {
        let validator = RuleValidator::default();
        let set = rules(json!({"code": {"$trim": true, "$exactLength": 3, "$noWhitespace": true}}));

        let out = validator.validate("code", &set, &json!("  abc ")).unwrap();
        assert_eq!(out, json!("abc"));
    }

    #[test]
    fn test_logical_or() {
        let validator = RuleValidator::default();
        let set = rules(json!({
            "id": {"$logicalOr": [{"$validEmail": true}, {"$numeric": true}]}
        }));

        assert!(validator.validate("id", &set, &json!("a@b.io")).is_ok());
        assert!(validator.validate("id", &set, &json!("12345")).is_ok());
        let err = validator.validate("id", &set, &json!("nope")).unwrap_err();
        assert!(matches!(err, UpdateError::Validation { ref rule, .. } if rule == "$logicalOr"));
    }

    #[test]
    fn test_logical_not() {
        let validator = RuleValidator::default();
        let set = rules(json!({"name": {"$logicalNot": {"$contains": "admin"}}}));

        assert!(validator.validate("name", &set, &json!("alice")).is_ok());
        assert!(validator.validate("name", &set, &json!("admin1")).is_err());
    }

    #[test]
    fn test_custom_predicate() {
        let validator = RuleValidator::default();
        let set = RuleSet::new().with(
            "qty",
            FieldRules::new().with(Rule::custom(|v| v.as_i64().map_or(false, |n| n % 5 == 0))),
        );

        assert!(validator.validate("qty", &set, &json!(10)).is_ok());
        assert!(validator.validate("qty", &set, &json!(11)).is_err());
    }
}
