//! Update operators
//!
//! The operator set is closed: 47 operators across six families.
//!
//! Design points:
//! - Every operator is a pure transform `(current leaf, operand) -> new leaf`
//! - Non-global families are gated on the declared field kind
//! - Only the written part of an operand passes rule validation
//! - Dotted paths route through `PathResolver::update`

mod array;
mod context;
mod dispatcher;
mod global;
mod kind;
mod numeric;
mod object;
mod operand;
mod string;

pub use context::OpContext;
pub use dispatcher::{OperatorDispatcher, UNDECLARED};
pub use kind::{OperatorFamily, UpdateOperator, WrittenOperand};
pub use numeric::{to_exponential, to_fixed, to_precision};
pub use operand::{KeyMapper, Operand, ValueMapper};
