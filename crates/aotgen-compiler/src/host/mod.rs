//! Compiler host: the filesystem and resolution surface the code generator
//! and the template compiler talk to.

mod adapter;
mod context;
mod resolver;

pub use adapter::CompilerHost;
pub use context::{HostContext, MemoryHostContext, NodeHostContext};
pub use resolver::{FileProbe, ModuleResolution, NodeModuleResolution};
