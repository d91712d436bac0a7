//! aero-update - A declarative document update engine
//!
//! Applies MongoDB-style update documents (`$set`, `$inc`, `$push`, ...) to
//! JSON records, validating operands against per-field rules and gating
//! operators on declared field types.

pub mod cli;
pub mod engine;
pub mod errors;
pub mod observability;
pub mod operators;
pub mod path;
pub mod rules;
pub mod schema;
pub mod value;

pub use engine::{apply, EngineConfig, UpdateDocument, UpdateEngine};
pub use errors::{UpdateError, UpdateResult};
pub use operators::{Operand, OperatorDispatcher, OperatorFamily, UpdateOperator};
pub use path::{PathResolver, Record};
pub use rules::{FieldRules, Rule, RuleSet, RuleValidator, ValidationPolicy};
pub use schema::{FieldKind, FieldTypeMap};
