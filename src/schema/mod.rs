//! Declared field types for update gating
//!
//! The persistence layer derives a `FieldTypeMap` from schema metadata once and
//! hands it to the engine. Operators are gated on these declarations.

mod types;

pub use types::{FieldKind, FieldTypeMap};
