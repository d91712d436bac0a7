//! Operator dispatch
//!
//! Resolves the operator family, gates it against the declared field kind
//! and routes the family transform through `PathResolver::update`.

use rand::RngCore;

use super::context::OpContext;
use super::kind::{OperatorFamily, UpdateOperator};
use super::operand::Operand;
use super::{array, global, numeric, object, string};
use crate::errors::{UpdateError, UpdateResult};
use crate::path::{PathResolver, Record};
use crate::schema::{FieldKind, FieldTypeMap};

/// Declared type reported for paths missing from the type map
pub const UNDECLARED: &str = "undeclared";

/// Applies single operator entries to a record
#[derive(Debug, Clone, Default)]
pub struct OperatorDispatcher {
    resolver: PathResolver,
}

impl OperatorDispatcher {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Checks that `operator` may target `path` under `types`.
    ///
    /// Returns the declared kind, if any. Global operators accept any path.
    pub fn gate<'t>(
        &self,
        operator: UpdateOperator,
        path: &str,
        types: &'t FieldTypeMap,
    ) -> UpdateResult<Option<&'t FieldKind>> {
        let declared = types.resolve(path);
        let family = operator.family();
        if family == OperatorFamily::Global {
            return Ok(declared);
        }

        match declared {
            None => Err(UpdateError::type_mismatch(operator.as_str(), path, UNDECLARED)),
            Some(kind) if !family.accepts(kind) => Err(UpdateError::type_mismatch(
                operator.as_str(),
                path,
                kind.type_name(),
            )),
            Some(kind) => Ok(Some(kind)),
        }
    }

    /// Applies `operator` with `operand` at `path`, mutating `record` in place.
    ///
    /// On error the leaf is left untouched, though intermediate objects on a
    /// dotted path may already have been created.
    pub fn dispatch(
        &self,
        record: &mut Record,
        operator: UpdateOperator,
        path: &str,
        operand: &Operand,
        types: &FieldTypeMap,
        rng: &mut dyn RngCore,
    ) -> UpdateResult<()> {
        let declared = self.gate(operator, path, types)?;
        let ctx = OpContext::new(operator, path, declared);

        self.resolver.update(record, path, |current| match operator.family() {
            OperatorFamily::Global | OperatorFamily::Boolean => global::apply(&ctx, current, ctx.json(operand)?),
            OperatorFamily::Numeric => numeric::apply(&ctx, current, ctx.json(operand)?, rng),
            OperatorFamily::String => string::apply(&ctx, current, ctx.json(operand)?),
            OperatorFamily::Object => object::apply(&ctx, current, operand),
            OperatorFamily::Array => array::apply(&ctx, current, ctx.json(operand)?),
        })
    }
}
