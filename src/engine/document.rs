//! Update documents
//!
//! An update document is an ordered list of operator groups. Each group
//! holds ordered `(path, operand)` entries. Both orders are observable: a
//! `$set` followed by an `$inc` on the same field composes.

use serde_json::Value;

use crate::errors::{UpdateError, UpdateResult};
use crate::operators::{Operand, UpdateOperator};

/// Label used in errors about the document shape itself
const DOCUMENT: &str = "update";

#[derive(Debug, Clone, Default)]
pub struct UpdateDocument {
    groups: Vec<(UpdateOperator, Vec<(String, Operand)>)>,
}

impl UpdateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`UpdateDocument::push`]
    pub fn with(mut self, operator: UpdateOperator, path: impl Into<String>, operand: impl Into<Operand>) -> Self {
        self.push(operator, path, operand);
        self
    }

    /// Appends an entry. A repeated operator joins its existing group, so
    /// group order is the order operators were first seen.
    pub fn push(&mut self, operator: UpdateOperator, path: impl Into<String>, operand: impl Into<Operand>) {
        let entry = (path.into(), operand.into());
        match self.groups.iter_mut().find(|(op, _)| *op == operator) {
            Some((_, entries)) => entries.push(entry),
            None => self.groups.push((operator, vec![entry])),
        }
    }

    /// Operator groups in document order
    pub fn groups(&self) -> impl Iterator<Item = (UpdateOperator, &[(String, Operand)])> {
        self.groups.iter().map(|(op, entries)| (*op, entries.as_slice()))
    }

    /// Every `(operator, path, operand)` entry in application order
    pub fn entries(&self) -> impl Iterator<Item = (UpdateOperator, &str, &Operand)> {
        self.groups.iter().flat_map(|(op, entries)| {
            entries
                .iter()
                .map(move |(path, operand)| (*op, path.as_str(), operand))
        })
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses `{"$op": {"path": operand, ...}, ...}`.
    ///
    /// `$mapKeys` operands stay JSON rename tables; `$mapValues` needs a
    /// mapper and can only be built in code.
    pub fn from_json(value: &Value) -> UpdateResult<Self> {
        let root = value.as_object().ok_or_else(|| {
            UpdateError::operator(DOCUMENT, "", "update document must be a JSON object")
        })?;

        let mut document = UpdateDocument::new();
        for (name, group) in root {
            let operator: UpdateOperator = name.parse()?;
            let fields = group.as_object().ok_or_else(|| {
                UpdateError::operator(name.as_str(), "", "operator group must map field paths to operands")
            })?;
            for (path, operand) in fields {
                document.push(operator, path.as_str(), operand.clone());
            }
        }
        Ok(document)
    }
}
