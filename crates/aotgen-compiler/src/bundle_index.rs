//! Flat bundle index detection.
//!
//! A library packaged as a flat module exposes a single declaration file
//! (named by `typings` in its `package.json`) whose sidecar metadata carries
//! `importAs`. Every other declaration file in that package is an internal
//! detail and must not be compiled on its own. Secondary entry points that
//! only forward to the index carry `flatModuleIndexRedirect` instead.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::host::HostContext;
use crate::paths::{self, DEPENDENCY_ROOT};

#[derive(Debug, Deserialize)]
struct PackageManifest {
    typings: Option<String>,
    types: Option<String>,
}

/// Memoized ancestor walk answering "is this declaration file part of a
/// package with a flat bundle index".
#[derive(Debug, Default)]
pub struct BundleIndexDetector {
    by_directory: HashMap<String, bool>,
    entry_points: HashSet<String>,
    redirects: HashSet<String>,
}

impl BundleIndexDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks up from the declaration file's directory to the nearest
    /// `package.json`, stopping at a `node_modules` directory or the root.
    ///
    /// Failures while reading or parsing count as "no bundle index".
    pub fn has_bundle_index(&mut self, decl_path: &str, fs: &dyn HostContext) -> bool {
        let mut directory = paths::dirname(decl_path);
        let mut visited = Vec::new();

        let verdict = loop {
            if let Some(&known) = self.by_directory.get(&directory) {
                break known;
            }
            visited.push(directory.clone());

            if paths::basename(&directory) == DEPENDENCY_ROOT {
                break false;
            }

            let manifest = paths::join(&directory, "package.json");
            if fs.file_exists(&manifest) {
                break self.probe_package(&directory, &manifest, fs).unwrap_or(false);
            }

            let parent = paths::dirname(&directory);
            if parent == directory {
                break false;
            }
            directory = parent;
        };

        for directory in visited {
            self.by_directory.insert(directory, verdict);
        }
        verdict
    }

    /// Declaration files recorded as flat module entry points.
    pub fn is_entry_point(&self, path: &str) -> bool {
        self.entry_points.contains(&paths::normalize(path))
    }

    /// Declaration files recorded as redirects to a flat module index.
    pub fn is_redirect(&self, path: &str) -> bool {
        self.redirects.contains(&paths::normalize(path))
    }

    fn probe_package(&mut self, directory: &str, manifest: &str, fs: &dyn HostContext) -> Option<bool> {
        let manifest: PackageManifest = serde_json::from_str(&fs.read_file(manifest).ok()?).ok()?;
        let Some(typings) = manifest.typings.or(manifest.types) else {
            return Some(false);
        };

        let typings = paths::join(directory, &typings);
        if !paths::is_declaration_file(&typings) {
            return Some(false);
        }
        let metadata_file = paths::metadata_path_for(&typings);
        if !fs.file_exists(&metadata_file) {
            return Some(false);
        }

        let metadata: Value = serde_json::from_str(&fs.read_file(&metadata_file).ok()?).ok()?;
        let documents = match &metadata {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };

        let redirect = documents
            .iter()
            .any(|doc| doc.get("flatModuleIndexRedirect").and_then(Value::as_bool) == Some(true));
        let import_as = documents.iter().any(|doc| {
            doc.get("importAs")
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty())
        });

        if redirect {
            self.redirects.insert(typings);
            Some(false)
        } else if import_as {
            self.entry_points.insert(typings);
            Some(true)
        } else {
            Some(false)
        }
    }
}
