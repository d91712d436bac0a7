//! Observable update engine events
//!
//! Events are explicit and typed. Each carries the severity it is logged at.

use std::fmt;

use super::logger::Severity;

/// Observable events of the update engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Engine configuration loaded and validated
    ConfigLoaded,

    // Apply lifecycle
    /// `apply` called with an update document
    ApplyStart,
    /// Every entry succeeded and the scratch record was returned
    ApplyCommit,
    /// An entry failed and the scratch record was discarded
    ApplyRejected,

    // Per-entry detail
    /// One operator entry applied to the scratch record
    OperatorApplied,
    /// A rule rejected an operand
    RuleValidationFailed,
}

impl Event {
    pub const ALL: [Event; 6] = [
        Event::ConfigLoaded,
        Event::ApplyStart,
        Event::ApplyCommit,
        Event::ApplyRejected,
        Event::OperatorApplied,
        Event::RuleValidationFailed,
    ];

    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ApplyStart => "UPDATE_APPLY_START",
            Event::ApplyCommit => "UPDATE_APPLY_COMMIT",
            Event::ApplyRejected => "UPDATE_APPLY_REJECTED",
            Event::OperatorApplied => "UPDATE_OPERATOR_APPLIED",
            Event::RuleValidationFailed => "RULE_VALIDATION_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::OperatorApplied | Event::ApplyStart => Severity::Trace,
            Event::ConfigLoaded | Event::ApplyCommit => Severity::Info,
            Event::ApplyRejected | Event::RuleValidationFailed => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
