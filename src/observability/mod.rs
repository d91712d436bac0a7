//! Observability for the update engine
//!
//! - Structured JSON logging
//! - Typed lifecycle events
//! - Atomic counters
//!
//! Observability is read-only: nothing here influences the result of an
//! update.
//!
//! # Usage
//!
//! ```ignore
//! use aero_update::observability::{log_event_with_fields, Event, EngineMetrics};
//!
//! log_event_with_fields(Event::ApplyCommit, &[("operators", "3")]);
//!
//! let metrics = EngineMetrics::new();
//! metrics.increment_applies_committed();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{EngineMetrics, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
