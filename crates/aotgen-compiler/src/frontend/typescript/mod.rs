//! TypeScript metadata collection.

mod collector;

pub use collector::TypeScriptCollector;

/// Source extensions picked up when scanning a project.
pub const EXTENSIONS: &[&str] = &["ts", "tsx"];
