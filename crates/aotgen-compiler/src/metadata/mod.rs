//! Module metadata: versioned documents and the store that caches them.

mod model;
mod store;

pub use model::{
    error_symbol, is_error_symbol, parse_documents, preferred, symbolic, MetadataBody,
    ModuleMetadata, METADATA_VERSION,
};
pub use store::MetadataStore;
