//! Code generation driver.
//!
//! Enumerates the program's source files, discovers their declarations,
//! hands them to an [`AotCompiler`] and writes every generated module into
//! the generated tree.

pub mod analysis;
pub mod compiler;
pub mod summary;

use tracing::{debug, info};

use crate::config::{CodegenOptions, CompileMode};
use crate::diagnostic::CompilerError;
use crate::host::CompilerHost;
use crate::paths;
use crate::program::Program;
use crate::CompileResult;

pub use analysis::{AnalyzedFile, Declaration, DeclarationKind};
pub use compiler::{AotCompiler, CompileRequest, CompilerSettings, GeneratedImport, GeneratedModule};
pub use summary::SummaryCompiler;

/// Header written at the top of every generated code file.
pub const PREAMBLE: &str = "/**\n * @fileoverview This file is generated by the aotgen template compiler.\n * Do not edit.\n * @suppress {suspiciousCode,uselessCode,missingProperties,missingOverride}\n */\n /* tslint:disable */\n\n";

/// Drives one code generation run.
pub struct CodeGenerator<C: AotCompiler> {
    options: CodegenOptions,
    program: Program,
    host: CompilerHost,
    compiler: C,
    settings: CompilerSettings,
}

impl<C: AotCompiler> CodeGenerator<C> {
    /// Prepares a run. Fails before any work when a translation file is
    /// given without a locale.
    pub fn create(
        options: CodegenOptions,
        program: Program,
        host: CompilerHost,
        compiler: C,
    ) -> Result<Self, CompilerError> {
        let translations = match &options.i18n_file {
            Some(file) => {
                let file = file.to_string_lossy();
                if options.locale.is_none() {
                    return Err(CompilerError::MissingLocale { file: file.to_string() });
                }
                Some(host.context().read_file(&file)?)
            }
            None => None,
        };

        let settings = CompilerSettings {
            gen_dir: host.options().gen_dir.clone(),
            translations,
            i18n_format: options.i18n_format.clone(),
            locale: options.locale.clone(),
            missing_translation: options.missing_translation.as_str().to_string(),
            enable_legacy_template: host.options().enable_legacy_template,
        };

        Ok(Self {
            options,
            program,
            host,
            compiler,
            settings,
        })
    }

    pub fn host(&self) -> &CompilerHost {
        &self.host
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Analyzes every program file the host treats as a source file.
    pub fn analyze(&mut self) -> Result<Vec<AnalyzedFile>, CompilerError> {
        let mut analyzed = Vec::new();
        for file in self.program.source_files() {
            if !self.host.is_source_file(file) {
                debug!(file = %file, "not a compilation input");
                continue;
            }
            analyzed.push(analysis::analyze_file(&mut self.host, file)?);
        }
        Ok(analyzed)
    }

    /// Runs the whole pipeline. The first failure aborts the run.
    pub async fn codegen(&mut self) -> Result<CompileResult, CompilerError> {
        let files = self.analyze()?;
        let mut result = CompileResult {
            files_analyzed: files.len(),
            declarations: files.iter().map(|file| file.declarations.len()).sum(),
            emitted: Vec::new(),
        };
        info!(
            files = result.files_analyzed,
            declarations = result.declarations,
            "compiling templates"
        );

        let batches: Vec<Vec<AnalyzedFile>> = match self.options.compile_mode {
            CompileMode::Program => vec![files],
            CompileMode::PerFile => files.into_iter().map(|file| vec![file]).collect(),
        };

        for files in batches {
            let request = CompileRequest {
                files,
                settings: self.settings.clone(),
            };
            let modules = self.compiler.compile(&mut self.host, &request).await?;
            for module in &modules {
                result.emitted.push(self.emit(module)?);
            }
        }

        Ok(result)
    }

    /// Writes one generated module and returns where it went.
    fn emit(&mut self, module: &GeneratedModule) -> Result<String, CompilerError> {
        let emit_path = self.host.calculate_emit_path(&module.gen_file_url);

        let content = if paths::is_generated_meta_file(&emit_path) {
            module.source_text.clone()
        } else {
            let mut content = String::from(PREAMBLE);
            for import in &module.imports {
                let specifier = self
                    .host
                    .file_name_to_module_name(&import.file, &module.gen_file_url)?;
                content.push_str(&format!("import * as {} from '{}';\n", import.alias, specifier));
            }
            content.push_str(&module.source_text);
            content
        };

        debug!(source = %module.source_file_url, emit_path = %emit_path, "writing generated file");
        self.host
            .write_file(&emit_path, &content, &[module.source_file_url.clone()])?;
        Ok(emit_path)
    }
}
