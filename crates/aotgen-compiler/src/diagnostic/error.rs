//! Compiler error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while generating code.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum CompilerError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access file '{}': {message}", path.display())]
    #[diagnostic(code(aotgen::io::access_failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    #[error("Source file {path} not present in program.")]
    #[diagnostic(code(aotgen::io::source_not_found))]
    SourceNotFound {
        path: String,
    },

    #[error("Resource file not found: {path}")]
    #[diagnostic(
        code(aotgen::io::resource_not_found),
        help("Check the templateUrl / styleUrls of the component; they are resolved relative to the component file")
    )]
    ResourceNotFound {
        path: String,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid project configuration '{}': {message}", path.display())]
    #[diagnostic(
        code(aotgen::config::invalid),
        help("The project file must be a tsconfig.json-style JSON document")
    )]
    InvalidConfig {
        path: PathBuf,
        message: String,
    },

    #[error("The translation file ({file}) locale must be provided. Use the --locale option.")]
    #[diagnostic(code(aotgen::config::missing_locale))]
    MissingLocale {
        file: String,
    },

    // =========================================================================
    // Metadata Errors
    // =========================================================================
    #[error("Error reading metadata file '{path}': {message}")]
    #[diagnostic(
        code(aotgen::metadata::parse_failed),
        help("Metadata sidecars must be a JSON object, or an array of objects, with a numeric 'version'")
    )]
    MetadataParse {
        path: String,
        message: String,
    },

    // =========================================================================
    // Resolution Errors
    // =========================================================================
    #[error("Resolution of relative paths requires a containing file: '{specifier}'")]
    #[diagnostic(code(aotgen::resolve::relative_without_containing_file))]
    RelativeImportWithoutContainingFile {
        specifier: String,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Failed to initialize parser")]
    #[diagnostic(code(aotgen::parse::init_failed))]
    ParserInitFailed,

    #[error("Failed to parse file: {path}")]
    #[diagnostic(code(aotgen::parse::parse_failed))]
    ParseFailed {
        path: String,
    },

    // =========================================================================
    // Code Generation Errors
    // =========================================================================
    #[error("Template compilation failed: {message}")]
    #[diagnostic(
        code(aotgen::codegen::compile_failed),
        help("Run with AOTGEN_LOG=debug to see which files were handed to the compiler")
    )]
    CompileFailed {
        message: String,
    },
}

impl CompilerError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a compile failure.
    pub fn compile(message: impl Into<String>) -> Self {
        Self::CompileFailed {
            message: message.into(),
        }
    }
}
