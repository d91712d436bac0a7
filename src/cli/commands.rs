//! CLI command implementations
//!
//! Each command returns the `data` payload of its response. `run` wraps it
//! in the response envelope, or writes the error envelope on failure.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::engine::{EngineConfig, UpdateDocument, UpdateEngine};
use crate::observability::Logger;
use crate::operators::{OperatorFamily, UpdateOperator};
use crate::rules::{RuleSet, RuleValidator};
use crate::schema::FieldTypeMap;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_json, read_object, write_error, write_response};

const FAMILIES: [OperatorFamily; 6] = [
    OperatorFamily::Global,
    OperatorFamily::Numeric,
    OperatorFamily::Boolean,
    OperatorFamily::String,
    OperatorFamily::Object,
    OperatorFamily::Array,
];

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    match run_command(cli.command) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Apply {
            record,
            update,
            rules,
            types,
            config,
        } => apply(
            &record,
            &update,
            rules.as_deref(),
            types.as_deref(),
            config.as_deref(),
        ),
        Command::Validate {
            field,
            value,
            rules,
            config,
        } => validate(&field, &value, &rules, config.as_deref()),
        Command::Operators => Ok(operators()),
    }
}

/// Apply an update document to a record
pub fn apply(
    record_path: &Path,
    update_path: &Path,
    rules_path: Option<&Path>,
    types_path: Option<&Path>,
    config_path: Option<&Path>,
) -> CliResult<Value> {
    let config = load_config(config_path)?;

    let record = read_object(record_path)?;
    let update = UpdateDocument::from_json(&read_json(update_path)?)?;
    let rules = match rules_path {
        Some(path) => RuleSet::from_json(&read_json(path)?)?,
        None => RuleSet::new(),
    };
    let types = match types_path {
        Some(path) => FieldTypeMap::from_json(&read_json(path)?)?,
        None => FieldTypeMap::new(),
    };

    let engine = UpdateEngine::new(config);
    let updated = engine.apply(&record, &update, &rules, &types)?;
    Ok(Value::Object(updated))
}

/// Validate one candidate value against a field's rules
pub fn validate(field: &str, value: &str, rules_path: &Path, config_path: Option<&Path>) -> CliResult<Value> {
    let config = load_config(config_path)?;

    let candidate: Value = serde_json::from_str(value)
        .map_err(|e| CliError::invalid_input(format!("--value is not valid JSON: {}", e)))?;
    let rules = RuleSet::from_json(&read_json(rules_path)?)?;

    let normalized = RuleValidator::new(config.validation_policy).validate(field, &rules, &candidate)?;
    Ok(json!({
        "field": field,
        "value": normalized,
    }))
}

/// The closed operator set grouped by family
pub fn operators() -> Value {
    let mut families = Map::new();
    for family in FAMILIES {
        let names: Vec<Value> = UpdateOperator::ALL
            .iter()
            .filter(|op| op.family() == family)
            .map(|op| Value::from(op.as_str()))
            .collect();
        families.insert(family.as_str().to_string(), Value::Array(names));
    }
    Value::Object(families)
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Logger::set_min_severity(config.log_level);
    Ok(config)
}
