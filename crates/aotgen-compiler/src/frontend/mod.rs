//! Metadata collectors.
//!
//! A collector turns the text of one source or declaration file into a
//! metadata document of the same shape as a `*.metadata.json` sidecar, so
//! live sources and prebuilt libraries are analyzed the same way.

pub mod typescript;

use crate::diagnostic::CompilerError;
use crate::metadata::ModuleMetadata;

/// Produces metadata for a single file.
pub trait MetadataCollector {
    /// Returns `None` when the file exports nothing worth recording.
    fn collect(&mut self, path: &str, source: &str) -> Result<Option<ModuleMetadata>, CompilerError>;
}

/// Creates the collector used for `.ts`, `.tsx` and `.d.ts` inputs.
pub fn default_collector() -> Result<Box<dyn MetadataCollector>, CompilerError> {
    Ok(Box::new(typescript::TypeScriptCollector::new()?))
}
