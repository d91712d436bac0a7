//! Update application
//!
//! Design points:
//! - Clone-on-entry: each `apply` owns its scratch record
//! - All-or-nothing: the scratch record is returned only on full success
//! - Document order is application order

mod config;
mod document;
mod engine;

pub use config::EngineConfig;
pub use document::UpdateDocument;
pub use engine::{apply, UpdateEngine};
