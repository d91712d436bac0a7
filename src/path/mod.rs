//! Dotted-path resolution over records

mod resolver;

pub use resolver::{value_kind, PathResolver, Record, DEFAULT_MAX_PATH_DEPTH};
