//! # aotgen Compiler
//!
//! Ahead-of-time code generation driver for component-based UI templates.
//! It finds framework declarations (components, directives, modules, pipes,
//! injectables) in a program, hands them to a template compiler and writes
//! the generated files into a tree that mirrors the source roots.
//!
//! ## Architecture
//!
//! ```text
//!  tsconfig.json
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Program    │  Source files under the base path
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Metadata   │  Sidecar *.metadata.json, or collected from source
//! │    Store     │  (v1 documents upgraded to v3)
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Analysis   │  Decorated classes + eagerly loaded resources
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ AotCompiler  │  External template compiler
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Path      │  Emit paths under genDir, import specifiers
//! │   Remapper   │
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aotgen_compiler::{Compiler, CompilerConfig, SummaryCompiler};
//!
//! let config = CompilerConfig {
//!     project: "tsconfig.json".into(),
//!     ..Default::default()
//! };
//!
//! let compiler = Compiler::new(config);
//! compiler.compile(SummaryCompiler::new()).await?;
//! ```

pub mod bundle_index;
pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod frontend;
pub mod host;
pub mod metadata;
pub mod paths;
pub mod program;
pub mod remap;

use std::rc::Rc;

pub use codegen::{AotCompiler, AnalyzedFile, CodeGenerator, GeneratedModule, SummaryCompiler};
pub use config::{CodegenOptions, CompileMode, CompileOptions, CompilerConfig, ProjectConfig};
pub use diagnostic::CompilerError;
pub use host::{CompilerHost, HostContext, MemoryHostContext, NodeHostContext};
pub use program::Program;

/// The main compiler struct that loads a project and runs the pipeline.
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    /// Creates a new compiler with the given configuration.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Generates code for the configured project.
    ///
    /// This runs the full pipeline:
    /// 1. Load the project file
    /// 2. Enumerate program files
    /// 3. Create a fresh compiler host (all caches start empty)
    /// 4. Create the code generator (validates i18n options)
    /// 5. Analyze, compile and write generated files
    pub async fn compile<C: AotCompiler>(&self, compiler: C) -> Result<CompileResult, CompilerError> {
        let mut generator = self.generator(compiler)?;
        generator.codegen().await
    }

    /// Analyzes the project without generating code.
    pub fn check(&self) -> Result<Vec<AnalyzedFile>, CompilerError> {
        let mut generator = self.generator(SummaryCompiler::new())?;
        generator.analyze()
    }

    /// Creates a host over the real filesystem for the configured project.
    pub fn create_host(&self) -> Result<CompilerHost, CompilerError> {
        let project = ProjectConfig::load(&self.config.project)?;
        CompilerHost::new(project.options, Rc::new(NodeHostContext::new()))
    }

    fn generator<C: AotCompiler>(&self, compiler: C) -> Result<CodeGenerator<C>, CompilerError> {
        // Phase 1: Load project
        let project = ProjectConfig::load(&self.config.project)?;

        // Phase 2: Enumerate program files
        let program = Program::for_project(&project);

        // Phase 3: Fresh host
        let host = CompilerHost::new(project.options.clone(), Rc::new(NodeHostContext::new()))?;

        // Phase 4: Generator
        CodeGenerator::create(self.config.codegen.clone(), program, host, compiler)
    }
}

/// Result of a compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileResult {
    /// Files handed to analysis.
    pub files_analyzed: usize,
    /// Declarations found across those files.
    pub declarations: usize,
    /// Emit paths written, in write order.
    pub emitted: Vec<String>,
}
