//! Compiler configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostic::CompilerError;
use crate::paths;

/// Layout options shared by every part of a compilation.
///
/// All paths are normalized, absolute, forward-slash strings with no
/// trailing separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Canonical source root.
    pub base_path: String,

    /// Root of the generated output tree.
    pub gen_dir: String,

    /// Additional source roots, in configuration order.
    pub root_dirs: Vec<String>,

    /// Treat declaration files as compilation inputs.
    pub generate_code_for_libraries: bool,

    /// Log root-dir selection while computing emit paths.
    pub trace: bool,

    /// Accept the deprecated `<template>` element in component templates.
    pub enable_legacy_template: bool,
}

impl CompileOptions {
    /// Creates options for a source root and a generated root.
    pub fn new(base_path: impl AsRef<str>, gen_dir: impl AsRef<str>) -> Self {
        Self {
            base_path: paths::normalize(base_path.as_ref()),
            gen_dir: paths::normalize(gen_dir.as_ref()),
            root_dirs: Vec::new(),
            generate_code_for_libraries: true,
            trace: false,
            enable_legacy_template: true,
        }
    }

    /// Sets the additional roots. Relative entries are taken from `base_path`.
    pub fn with_root_dirs<I, S>(mut self, root_dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.root_dirs = root_dirs
            .into_iter()
            .map(|dir| paths::join(&self.base_path, dir.as_ref()))
            .collect();
        self
    }

    pub fn with_generate_code_for_libraries(mut self, enabled: bool) -> Self {
        self.generate_code_for_libraries = enabled;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_legacy_template(mut self, enabled: bool) -> Self {
        self.enable_legacy_template = enabled;
        self
    }
}

/// What to do when a message has no translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTranslation {
    Error,
    #[default]
    Warning,
    Ignore,
}

impl MissingTranslation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Ignore => "ignore",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }
}

/// How source files are handed to the template compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileMode {
    /// One call covering the whole program.
    #[default]
    Program,
    /// One call per analyzed file.
    PerFile,
}

/// Per-run options for the code generator.
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Translation bundle to compile with.
    pub i18n_file: Option<PathBuf>,

    /// Format of the translation bundle (`xlf`, `xmb`, ...).
    pub i18n_format: Option<String>,

    /// Locale of the translation bundle. Required with `i18n_file`.
    pub locale: Option<String>,

    pub missing_translation: MissingTranslation,

    pub compile_mode: CompileMode,
}

/// Configuration for the [`crate::Compiler`] facade.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Project file, or a directory holding `tsconfig.json`.
    pub project: PathBuf,

    pub codegen: CodegenOptions,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            project: PathBuf::from(ProjectConfig::DEFAULT_FILE),
            codegen: CodegenOptions::default(),
        }
    }
}

/// A loaded project file.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// The project file that was read.
    pub path: PathBuf,

    pub options: CompileOptions,

    /// Explicit root files, already absolute. Empty means "scan the base path".
    pub files: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    #[serde(default)]
    compiler_options: RawCompilerOptions,
    #[serde(default)]
    angular_compiler_options: RawAngularOptions,
    files: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    root_dirs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAngularOptions {
    gen_dir: Option<String>,
    generate_code_for_libraries: Option<bool>,
    trace: Option<bool>,
    enable_legacy_template: Option<bool>,
}

impl ProjectConfig {
    /// File name looked up when a directory is given.
    pub const DEFAULT_FILE: &'static str = "tsconfig.json";

    /// Loads a project file. A directory means `<dir>/tsconfig.json`.
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let path = if path.is_dir() {
            path.join(Self::DEFAULT_FILE)
        } else {
            path.to_path_buf()
        };
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map_err(|e| CompilerError::io(&path, e.to_string()))?
                .join(path)
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| CompilerError::io(&path, e.to_string()))?;
        Self::from_json(&path, &content)
    }

    /// Builds a project from the text of a project file located at `path`.
    pub fn from_json(path: &Path, content: &str) -> Result<Self, CompilerError> {
        let raw: RawProject = serde_json::from_str(content).map_err(|e| CompilerError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let project_dir = path
            .parent()
            .map(|p| paths::normalize(&p.to_string_lossy()))
            .ok_or_else(|| CompilerError::InvalidConfig {
                path: path.to_path_buf(),
                message: "project file has no parent directory".to_string(),
            })?;

        let base_path = match &raw.compiler_options.base_url {
            Some(base_url) => paths::join(&project_dir, base_url),
            None => project_dir.clone(),
        };
        let gen_dir = match &raw.angular_compiler_options.gen_dir {
            Some(gen_dir) => paths::join(&project_dir, gen_dir),
            None => base_path.clone(),
        };

        let ng = &raw.angular_compiler_options;
        let options = CompileOptions::new(&base_path, &gen_dir)
            .with_root_dirs(
                raw.compiler_options
                    .root_dirs
                    .iter()
                    .map(|dir| paths::join(&project_dir, dir)),
            )
            .with_generate_code_for_libraries(ng.generate_code_for_libraries.unwrap_or(true))
            .with_trace(ng.trace.unwrap_or(false))
            .with_legacy_template(ng.enable_legacy_template.unwrap_or(true));

        let files = raw
            .files
            .unwrap_or_default()
            .iter()
            .map(|file| paths::join(&project_dir, file))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            options,
            files,
        })
    }
}
