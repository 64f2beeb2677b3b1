//! Module specifier resolution.
//!
//! Implements the Node.js lookup order for TypeScript inputs: relative and
//! absolute specifiers are probed next to the containing file, bare
//! specifiers are looked up in `node_modules` directories from the
//! containing file's directory up to the root.

use serde::Deserialize;

use crate::paths::{self, DEPENDENCY_ROOT};

/// Existence and read primitives used while probing candidates.
pub trait FileProbe {
    fn file_exists(&self, path: &str) -> bool;

    fn directory_exists(&self, path: &str) -> bool;

    fn read_file(&self, path: &str) -> Option<String>;
}

/// Resolves an import specifier to a file.
pub trait ModuleResolution {
    fn resolve_module_name(
        &self,
        specifier: &str,
        containing_file: &str,
        probe: &dyn FileProbe,
    ) -> Option<String>;
}

/// Extensions tried, in order, for an extension-less candidate.
const EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts"];

#[derive(Debug, Deserialize)]
struct PackageEntry {
    typings: Option<String>,
    types: Option<String>,
}

/// Node-style resolution over TypeScript extensions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeModuleResolution;

impl NodeModuleResolution {
    pub fn new() -> Self {
        Self
    }

    fn resolve_path(&self, candidate: &str, probe: &dyn FileProbe) -> Option<String> {
        self.try_file(candidate, probe)
            .or_else(|| self.try_directory(candidate, probe))
    }

    fn try_file(&self, candidate: &str, probe: &dyn FileProbe) -> Option<String> {
        for ext in EXTENSIONS {
            let path = format!("{}{}", candidate, ext);
            if probe.file_exists(&path) {
                return Some(path);
            }
        }
        None
    }

    fn try_directory(&self, dir: &str, probe: &dyn FileProbe) -> Option<String> {
        if !probe.directory_exists(dir) {
            return None;
        }

        let manifest = paths::join(dir, "package.json");
        if probe.file_exists(&manifest) {
            let entry = probe
                .read_file(&manifest)
                .and_then(|text| serde_json::from_str::<PackageEntry>(&text).ok())
                .and_then(|entry| entry.typings.or(entry.types));
            if let Some(entry) = entry {
                let entry = paths::join(dir, &entry);
                if probe.file_exists(&entry) {
                    return Some(entry);
                }
                if let Some(found) = self.try_file(&paths::strip_extension(&entry), probe) {
                    return Some(found);
                }
            }
        }

        self.try_file(&paths::join(dir, "index"), probe)
    }
}

impl ModuleResolution for NodeModuleResolution {
    fn resolve_module_name(
        &self,
        specifier: &str,
        containing_file: &str,
        probe: &dyn FileProbe,
    ) -> Option<String> {
        let containing_dir = paths::dirname(containing_file);

        if paths::is_relative_specifier(specifier) || paths::is_absolute(specifier) {
            let candidate = paths::join(&containing_dir, specifier);
            return self.resolve_path(&candidate, probe);
        }

        let mut directory = containing_dir;
        loop {
            if paths::basename(&directory) != DEPENDENCY_ROOT {
                let candidate = paths::join(&directory, &format!("{}/{}", DEPENDENCY_ROOT, specifier));
                if let Some(found) = self.resolve_path(&candidate, probe) {
                    return Some(found);
                }
            }

            let parent = paths::dirname(&directory);
            if parent == directory {
                return None;
            }
            directory = parent;
        }
    }
}
