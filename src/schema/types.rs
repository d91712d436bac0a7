//! Declared field kinds used to gate update operators
//!
//! Supported kinds:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - date: RFC 3339 string or epoch milliseconds
//! - object: Nested object with field declarations
//! - array: Array with a declared element kind
//!
//! Kinds come from schema metadata supplied by the caller. They are never
//! inferred from the runtime shape of a stored value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{UpdateError, UpdateResult};

/// Declared kind of a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Timestamp
    Date,
    /// Nested object with its own field declarations
    Object {
        #[serde(default)]
        fields: HashMap<String, FieldKind>,
    },
    /// Array with a single element kind
    Array {
        element_type: Box<FieldKind>,
    },
}

impl FieldKind {
    /// Returns the kind name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Date => "date",
            FieldKind::Object { .. } => "object",
            FieldKind::Array { .. } => "array",
        }
    }

    /// Object kind without nested declarations
    pub fn object() -> Self {
        FieldKind::Object {
            fields: HashMap::new(),
        }
    }

    /// Object kind with nested declarations
    pub fn object_with(fields: impl IntoIterator<Item = (impl Into<String>, FieldKind)>) -> Self {
        FieldKind::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Array kind with the given element kind
    pub fn array(element_type: FieldKind) -> Self {
        FieldKind::Array {
            element_type: Box::new(element_type),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Int | FieldKind::Float)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, FieldKind::Object { .. } | FieldKind::Array { .. })
    }

    /// Resolves the kind of a child segment.
    ///
    /// Objects resolve by declared field name, arrays by numeric index.
    fn child(&self, segment: &str) -> Option<&FieldKind> {
        match self {
            FieldKind::Object { fields } => fields.get(segment),
            FieldKind::Array { element_type } => {
                segment.parse::<usize>().ok().map(|_| element_type.as_ref())
            }
            _ => None,
        }
    }
}

/// Declared kinds for every field of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTypeMap {
    fields: HashMap<String, FieldKind>,
}

impl FieldTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a top-level field, builder style
    pub fn with(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(field.into(), kind);
        self
    }

    /// Declares a top-level field
    pub fn declare(&mut self, field: impl Into<String>, kind: FieldKind) {
        self.fields.insert(field.into(), kind);
    }

    /// Parses a type map from its JSON form
    pub fn from_json(value: &serde_json::Value) -> UpdateResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| UpdateError::Config(format!("Invalid field type map: {}", e)))
    }

    pub fn get(&self, field: &str) -> Option<&FieldKind> {
        self.fields.get(field)
    }

    /// Resolves the declared kind at a dotted path.
    ///
    /// A full-path declaration (`"a.b"` registered verbatim) wins over walking
    /// the nested object declarations.
    pub fn resolve(&self, path: &str) -> Option<&FieldKind> {
        if let Some(kind) = self.fields.get(path) {
            return Some(kind);
        }

        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
