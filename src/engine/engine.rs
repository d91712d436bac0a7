//! The update engine
//!
//! `apply` works on a private scratch copy of the base record and returns
//! it only when every entry succeeds. A failure discards the scratch copy,
//! so the caller's base record is never partially updated.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::config::EngineConfig;
use super::document::UpdateDocument;
use crate::errors::{UpdateError, UpdateResult};
use crate::observability::{log_event_with_fields, EngineMetrics, Event, Logger, Severity};
use crate::operators::{Operand, OperatorDispatcher, UpdateOperator, WrittenOperand};
use crate::path::{PathResolver, Record};
use crate::rules::{RuleSet, RuleValidator};
use crate::schema::FieldTypeMap;

#[derive(Debug)]
pub struct UpdateEngine {
    config: EngineConfig,
    validator: RuleValidator,
    dispatcher: OperatorDispatcher,
    metrics: EngineMetrics,
    /// Present only when `random_seed` is configured
    seeded_rng: Option<Mutex<StdRng>>,
}

impl Default for UpdateEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl UpdateEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            validator: RuleValidator::new(config.validation_policy),
            dispatcher: OperatorDispatcher::new(PathResolver::new(config.max_path_depth)),
            metrics: EngineMetrics::new(),
            seeded_rng: config.random_seed.map(|seed| Mutex::new(StdRng::seed_from_u64(seed))),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Applies `update` to a copy of `base`.
    ///
    /// Entries run in document order. Numeric and string operands are
    /// validated against `rules` first; every non-global operator is gated
    /// on `types`. The first error aborts the whole update.
    pub fn apply(
        &self,
        base: &Record,
        update: &UpdateDocument,
        rules: &RuleSet,
        types: &FieldTypeMap,
    ) -> UpdateResult<Record> {
        self.metrics.increment_applies_started();
        let entries = update.len().to_string();
        log_event_with_fields(Event::ApplyStart, &[("entries", entries.as_str())]);

        let mut scratch = base.clone();
        let outcome = match &self.seeded_rng {
            Some(rng) => {
                // A panic mid-apply cannot leave the RNG in an invalid state
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                self.apply_entries(&mut scratch, update, rules, types, &mut *rng)
            }
            None => self.apply_entries(&mut scratch, update, rules, types, &mut rand::thread_rng()),
        };

        match outcome {
            Ok(()) => {
                self.metrics.increment_applies_committed();
                log_event_with_fields(Event::ApplyCommit, &[("entries", entries.as_str())]);
                Ok(scratch)
            }
            Err(err) => {
                self.metrics.increment_applies_rejected();
                let message = err.to_string();
                if err.is_validation() {
                    self.metrics.increment_validation_failures();
                    log_event_with_fields(Event::RuleValidationFailed, &[("message", message.as_str())]);
                }
                log_event_with_fields(
                    Event::ApplyRejected,
                    &[("code", err.code()), ("message", message.as_str())],
                );
                Err(err)
            }
        }
    }

    fn apply_entries(
        &self,
        scratch: &mut Record,
        update: &UpdateDocument,
        rules: &RuleSet,
        types: &FieldTypeMap,
        rng: &mut dyn RngCore,
    ) -> UpdateResult<()> {
        for (operator, path, operand) in update.entries() {
            let normalized = self.validate_operand(operator, path, rules, operand)?;
            let operand = normalized.as_ref().unwrap_or(operand);

            self.dispatcher.dispatch(scratch, operator, path, operand, types, rng)?;
            self.metrics.increment_operators_executed();

            if Logger::enabled(Severity::Trace) {
                log_event_with_fields(
                    Event::OperatorApplied,
                    &[("operator", operator.as_str()), ("path", path)],
                );
            }
        }
        Ok(())
    }

    /// Validates the written part of `operand` against the field's rules.
    ///
    /// Returns the operand to dispatch instead when normalization changed it
    /// and normalized operands are enabled.
    fn validate_operand(
        &self,
        operator: UpdateOperator,
        path: &str,
        rules: &RuleSet,
        operand: &Operand,
    ) -> UpdateResult<Option<Operand>> {
        let candidate = match operand {
            Operand::Value(value) => value,
            _ => return Ok(None),
        };

        let normalized = match operator.written_operand() {
            WrittenOperand::Whole => self.validator.validate(path, rules, candidate)?,
            WrittenOperand::Member(key) => match candidate.get(key) {
                Some(member) => {
                    let value = self.validator.validate(path, rules, member)?;
                    let mut rebuilt = candidate.clone();
                    if let Some(fields) = rebuilt.as_object_mut() {
                        fields.insert(key.to_string(), value);
                    }
                    rebuilt
                }
                None => return Ok(None),
            },
            WrittenOperand::NotWritten => return Ok(None),
        };

        if self.config.apply_normalized_operands && normalized != *candidate {
            Ok(Some(Operand::Value(normalized)))
        } else {
            Ok(None)
        }
    }
}

/// Applies `update` with a default engine
pub fn apply(
    base: &Record,
    update: &UpdateDocument,
    rules: &RuleSet,
    types: &FieldTypeMap,
) -> Result<Record, UpdateError> {
    UpdateEngine::default().apply(base, update, rules, types)
}
