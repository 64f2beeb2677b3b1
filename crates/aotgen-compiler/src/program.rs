//! The set of files making up a compilation.

use std::path::Path;

use walkdir::WalkDir;

use crate::config::{CompileOptions, ProjectConfig};
use crate::frontend::typescript::EXTENSIONS;
use crate::paths::{self, DEPENDENCY_ROOT};

/// Source files of one compilation, as canonical paths.
#[derive(Debug, Clone, Default)]
pub struct Program {
    source_files: Vec<String>,
}

impl Program {
    /// A program made of exactly these files.
    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source_files: Vec<String> = Vec::new();
        for file in files {
            let file = paths::normalize(file.as_ref());
            if !source_files.contains(&file) {
                source_files.push(file);
            }
        }
        Self { source_files }
    }

    /// Scans the base path for `.ts` and `.tsx` files.
    ///
    /// `node_modules` directories and the generated root (when it is not the
    /// base path itself) are skipped.
    pub fn discover(options: &CompileOptions) -> Self {
        let skip_gen_dir = options.gen_dir != options.base_path;
        let mut source_files = Vec::new();

        for entry in WalkDir::new(&options.base_path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                let path = paths::normalize(&entry.path().to_string_lossy());
                paths::basename(&path) != DEPENDENCY_ROOT && !(skip_gen_dir && path == options.gen_dir)
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && has_source_extension(path) {
                source_files.push(paths::normalize(&path.to_string_lossy()));
            }
        }

        Self { source_files }
    }

    /// Uses the project's `files` list, or scans the base path without one.
    pub fn for_project(project: &ProjectConfig) -> Self {
        if project.files.is_empty() {
            Self::discover(&project.options)
        } else {
            Self::from_files(&project.files)
        }
    }

    pub fn source_files(&self) -> &[String] {
        &self.source_files
    }
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
        .unwrap_or(false)
}
