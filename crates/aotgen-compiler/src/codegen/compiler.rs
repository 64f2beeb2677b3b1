//! The template compiler seam.
//!
//! The code generator hands analyzed files to an [`AotCompiler`] and writes
//! whatever generated modules come back. The compiler may call back into the
//! [`CompilerHost`] to resolve modules, load summaries or compute import
//! specifiers while it works.

use serde::{Deserialize, Serialize};

use crate::diagnostic::CompilerError;
use crate::host::CompilerHost;

use super::analysis::AnalyzedFile;

/// Settings forwarded to the template compiler unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    pub gen_dir: String,
    pub translations: Option<String>,
    pub i18n_format: Option<String>,
    pub locale: Option<String>,
    pub missing_translation: String,
    pub enable_legacy_template: bool,
}

/// One compiler invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    pub files: Vec<AnalyzedFile>,
    pub settings: CompilerSettings,
}

/// A namespace import the generated code relies on.
///
/// The driver turns `file` into a specifier relative to the generated file
/// and renders `import * as <alias> from '<specifier>';`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImport {
    pub alias: String,
    pub file: String,
}

/// A generated file, addressed in source-tree layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedModule {
    pub source_file_url: String,
    #[serde(rename = "generatedFileUrl")]
    pub gen_file_url: String,
    pub source_text: String,
    #[serde(default)]
    pub imports: Vec<GeneratedImport>,
}

/// Turns analyzed files into generated modules.
#[allow(async_fn_in_trait)]
pub trait AotCompiler {
    async fn compile(
        &mut self,
        host: &mut CompilerHost,
        request: &CompileRequest,
    ) -> Result<Vec<GeneratedModule>, CompilerError>;
}
