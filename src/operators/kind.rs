//! The closed update operator set
//!
//! Every operator belongs to exactly one family. The family decides which
//! declared field kinds the operator may target. The operator itself decides
//! which part of its operand, if any, is written into the field and so goes
//! through rule validation first.

use std::fmt;
use std::str::FromStr;

use crate::errors::UpdateError;
use crate::schema::FieldKind;

/// Operator type family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    Global,
    Numeric,
    Boolean,
    String,
    Object,
    Array,
}

impl OperatorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorFamily::Global => "global",
            OperatorFamily::Numeric => "numeric",
            OperatorFamily::Boolean => "boolean",
            OperatorFamily::String => "string",
            OperatorFamily::Object => "object",
            OperatorFamily::Array => "array",
        }
    }

    /// Whether a field of the given declared kind may be targeted
    pub fn accepts(&self, kind: &FieldKind) -> bool {
        match self {
            OperatorFamily::Global => true,
            OperatorFamily::Numeric => kind.is_numeric(),
            OperatorFamily::Boolean => matches!(kind, FieldKind::Bool),
            OperatorFamily::String => matches!(kind, FieldKind::String),
            OperatorFamily::Object => matches!(kind, FieldKind::Object { .. }),
            OperatorFamily::Array => matches!(kind, FieldKind::Array { .. }),
        }
    }
}

impl fmt::Display for OperatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of an operand that ends up in the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrittenOperand {
    /// The whole operand (`$inc: 5`, `$append: "x"`)
    Whole,
    /// One member of an object operand (`$replaceValue`)
    Member(&'static str),
    /// The operand only parameterises the transform (`$slice`, `$sqrt`)
    NotWritten,
}

/// Update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    // Global
    Set,
    Unset,
    Clear,

    // Numeric
    Inc,
    Dec,
    Mul,
    Div,
    Min,
    Max,
    Sqrt,
    Floor,
    Ceil,
    Abs,
    Round,
    Trunc,
    Pow,
    Mod,
    Random,
    ToFixed,
    ToExponential,
    ToPrecision,

    // Boolean
    Toggle,

    // String
    Append,
    Prepend,
    Replace,
    Trim,
    Substr,
    Capitalize,
    Reverse,
    Slice,
    Lowercase,
    Uppercase,
    Camelcase,
    Kebabcase,
    Snakecase,
    Titlecase,

    // Object
    Omit,
    Merge,
    MapKeys,
    MapValues,
    Invert,

    // Array
    Push,
    Pop,
    Pull,
    AddToSet,
    SliceArray,
    Concat,
}

impl UpdateOperator {
    /// Every operator, grouped by family
    pub const ALL: [UpdateOperator; 47] = [
        UpdateOperator::Set,
        UpdateOperator::Unset,
        UpdateOperator::Clear,
        UpdateOperator::Inc,
        UpdateOperator::Dec,
        UpdateOperator::Mul,
        UpdateOperator::Div,
        UpdateOperator::Min,
        UpdateOperator::Max,
        UpdateOperator::Sqrt,
        UpdateOperator::Floor,
        UpdateOperator::Ceil,
        UpdateOperator::Abs,
        UpdateOperator::Round,
        UpdateOperator::Trunc,
        UpdateOperator::Pow,
        UpdateOperator::Mod,
        UpdateOperator::Random,
        UpdateOperator::ToFixed,
        UpdateOperator::ToExponential,
        UpdateOperator::ToPrecision,
        UpdateOperator::Toggle,
        UpdateOperator::Append,
        UpdateOperator::Prepend,
        UpdateOperator::Replace,
        UpdateOperator::Trim,
        UpdateOperator::Substr,
        UpdateOperator::Capitalize,
        UpdateOperator::Reverse,
        UpdateOperator::Slice,
        UpdateOperator::Lowercase,
        UpdateOperator::Uppercase,
        UpdateOperator::Camelcase,
        UpdateOperator::Kebabcase,
        UpdateOperator::Snakecase,
        UpdateOperator::Titlecase,
        UpdateOperator::Omit,
        UpdateOperator::Merge,
        UpdateOperator::MapKeys,
        UpdateOperator::MapValues,
        UpdateOperator::Invert,
        UpdateOperator::Push,
        UpdateOperator::Pop,
        UpdateOperator::Pull,
        UpdateOperator::AddToSet,
        UpdateOperator::SliceArray,
        UpdateOperator::Concat,
    ];

    /// Operator keyword as written in update documents
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::Set => "$set",
            UpdateOperator::Unset => "$unset",
            UpdateOperator::Clear => "$clear",
            UpdateOperator::Inc => "$inc",
            UpdateOperator::Dec => "$dec",
            UpdateOperator::Mul => "$mul",
            UpdateOperator::Div => "$div",
            UpdateOperator::Min => "$min",
            UpdateOperator::Max => "$max",
            UpdateOperator::Sqrt => "$sqrt",
            UpdateOperator::Floor => "$floor",
            UpdateOperator::Ceil => "$ceil",
            UpdateOperator::Abs => "$abs",
            UpdateOperator::Round => "$round",
            UpdateOperator::Trunc => "$trunc",
            UpdateOperator::Pow => "$pow",
            UpdateOperator::Mod => "$mod",
            UpdateOperator::Random => "$random",
            UpdateOperator::ToFixed => "$toFixed",
            UpdateOperator::ToExponential => "$toExponential",
            UpdateOperator::ToPrecision => "$toPrecision",
            UpdateOperator::Toggle => "$toggle",
            UpdateOperator::Append => "$append",
            UpdateOperator::Prepend => "$prepend",
            UpdateOperator::Replace => "$replace",
            UpdateOperator::Trim => "$trim",
            UpdateOperator::Substr => "$substr",
            UpdateOperator::Capitalize => "$capitalize",
            UpdateOperator::Reverse => "$reverse",
            UpdateOperator::Slice => "$slice",
            UpdateOperator::Lowercase => "$lowercase",
            UpdateOperator::Uppercase => "$uppercase",
            UpdateOperator::Camelcase => "$camelcase",
            UpdateOperator::Kebabcase => "$kebabcase",
            UpdateOperator::Snakecase => "$snakecase",
            UpdateOperator::Titlecase => "$titlecase",
            UpdateOperator::Omit => "$omit",
            UpdateOperator::Merge => "$merge",
            UpdateOperator::MapKeys => "$mapKeys",
            UpdateOperator::MapValues => "$mapValues",
            UpdateOperator::Invert => "$invert",
            UpdateOperator::Push => "$push",
            UpdateOperator::Pop => "$pop",
            UpdateOperator::Pull => "$pull",
            UpdateOperator::AddToSet => "$addToSet",
            UpdateOperator::SliceArray => "$sliceArray",
            UpdateOperator::Concat => "$concat",
        }
    }

    /// The family this operator belongs to
    pub fn family(&self) -> OperatorFamily {
        use UpdateOperator::*;
        match self {
            Set | Unset | Clear => OperatorFamily::Global,
            Inc | Dec | Mul | Div | Min | Max | Sqrt | Floor | Ceil | Abs | Round | Trunc | Pow
            | Mod | Random | ToFixed | ToExponential | ToPrecision => OperatorFamily::Numeric,
            Toggle => OperatorFamily::Boolean,
            Append | Prepend | Replace | Trim | Substr | Capitalize | Reverse | Slice
            | Lowercase | Uppercase | Camelcase | Kebabcase | Snakecase | Titlecase => {
                OperatorFamily::String
            }
            Omit | Merge | MapKeys | MapValues | Invert => OperatorFamily::Object,
            Push | Pop | Pull | AddToSet | SliceArray | Concat => OperatorFamily::Array,
        }
    }
}

impl UpdateOperator {
    /// Which part of the operand rule validation applies to
    pub fn written_operand(&self) -> WrittenOperand {
        use UpdateOperator::*;
        match self {
            Inc | Dec | Mul | Div | Min | Max | Pow | Mod | Append | Prepend => WrittenOperand::Whole,
            Replace => WrittenOperand::Member("$replaceValue"),
            _ => WrittenOperand::NotWritten,
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateOperator {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdateOperator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UpdateError::unknown_operator(s))
    }
}
