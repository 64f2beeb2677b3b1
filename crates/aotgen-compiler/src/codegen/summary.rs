//! Built-in compiler emitting declaration summaries.
//!
//! For every file with declarations it writes `<file>.ngsummary.json`,
//! listing each declaration with its decorator metadata and the module name
//! generated code must import it from. Downstream builds read these instead
//! of re-analyzing the sources.

use serde_json::{json, Value};

use crate::diagnostic::CompilerError;
use crate::host::CompilerHost;
use crate::paths;

use super::compiler::{AotCompiler, CompileRequest, GeneratedModule};

/// Suffix of summary files.
pub const SUMMARY_SUFFIX: &str = ".ngsummary.json";

#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryCompiler;

impl SummaryCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl AotCompiler for SummaryCompiler {
    async fn compile(
        &mut self,
        host: &mut CompilerHost,
        request: &CompileRequest,
    ) -> Result<Vec<GeneratedModule>, CompilerError> {
        let mut modules = Vec::new();

        for file in &request.files {
            if file.declarations.is_empty() {
                continue;
            }

            let gen_file_url = format!("{}{}", paths::strip_extension(&file.file_name), SUMMARY_SUFFIX);
            let module_name = host.file_name_to_module_name(&file.file_name, &gen_file_url)?;

            let symbols: Vec<Value> = file
                .declarations
                .iter()
                .map(|declaration| {
                    json!({
                        "name": declaration.name,
                        "kind": declaration.kind.as_str(),
                        "metadata": declaration.metadata,
                    })
                })
                .collect();

            let summary = json!({
                "moduleName": module_name,
                "symbols": symbols,
                "resources": file.resources.keys().collect::<Vec<_>>(),
            });
            let source_text = serde_json::to_string_pretty(&summary)
                .map_err(|e| CompilerError::compile(e.to_string()))?;

            modules.push(GeneratedModule {
                source_file_url: file.file_name.clone(),
                gen_file_url,
                source_text,
                imports: Vec::new(),
            });
        }

        Ok(modules)
    }
}
