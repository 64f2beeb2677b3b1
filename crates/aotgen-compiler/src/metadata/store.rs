//! Sidecar metadata cache.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::diagnostic::CompilerError;
use crate::frontend::MetadataCollector;
use crate::host::HostContext;
use crate::paths;

use super::model::{parse_documents, MetadataBody, ModuleMetadata};

/// Reads, upgrades and caches module metadata.
///
/// Declaration files are answered from their `*.metadata.json` sidecar and
/// cached for the lifetime of the store. Source files are collected live on
/// every request.
pub struct MetadataStore {
    collector: Box<dyn MetadataCollector>,
    cache: HashMap<String, Vec<ModuleMetadata>>,
}

impl MetadataStore {
    pub fn new(collector: Box<dyn MetadataCollector>) -> Self {
        Self {
            collector,
            cache: HashMap::new(),
        }
    }

    /// Metadata documents for a file; empty when the file does not exist.
    pub fn get_metadata_for(
        &mut self,
        path: &str,
        fs: &dyn HostContext,
    ) -> Result<Vec<ModuleMetadata>, CompilerError> {
        if !fs.file_exists(path) {
            return Ok(Vec::new());
        }

        if paths::is_declaration_file(path) {
            if let Some(documents) = self.read_metadata(path, fs)? {
                return Ok(documents);
            }
            // No sidecar: upgrade an empty v1 stub so the declaration file's
            // own exports are still visible.
            let upgraded = self.upgrade_version1_metadata(&MetadataBody::default(), path, fs)?;
            return Ok(vec![upgraded]);
        }

        Ok(self.metadata_for_source_file(path, fs)?.into_iter().collect())
    }

    /// Sidecar documents of a declaration file, `None` without a sidecar.
    pub fn read_metadata(
        &mut self,
        dts_path: &str,
        fs: &dyn HostContext,
    ) -> Result<Option<Vec<ModuleMetadata>>, CompilerError> {
        Ok(self.cached_metadata(dts_path, fs)?.cloned())
    }

    /// Builds a v3 document from a v1 document and the declaration file.
    ///
    /// Symbols present in `v1` are kept as-is; the declaration file only fills
    /// in names `v1` lacks. Its `exports`, when it has any, replace `v1`'s.
    pub fn upgrade_version1_metadata(
        &mut self,
        v1: &MetadataBody,
        dts_path: &str,
        fs: &dyn HostContext,
    ) -> Result<ModuleMetadata, CompilerError> {
        let mut upgraded = MetadataBody {
            metadata: v1.metadata.clone(),
            exports: v1.exports.clone(),
            import_as: v1.import_as.clone(),
            flat_module_index_redirect: v1.flat_module_index_redirect,
            origins: v1.origins.clone(),
        };

        let collected = if fs.file_exists(dts_path) {
            self.metadata_for_source_file(dts_path, fs)?
        } else {
            None
        };

        if let Some(collected) = collected {
            let body = collected.body();
            for (name, value) in &body.metadata {
                if !upgraded.metadata.contains_key(name) {
                    upgraded.metadata.insert(name.clone(), value.clone());
                }
            }
            if upgraded.exports.is_none() {
                upgraded.exports = body.exports.clone();
            }
        }

        Ok(ModuleMetadata::V3(upgraded))
    }

    /// First non-empty `importAs` of a declaration file's documents.
    pub fn get_import_as(
        &mut self,
        path: &str,
        fs: &dyn HostContext,
    ) -> Result<Option<String>, CompilerError> {
        if !paths::is_declaration_file(path) {
            return Ok(None);
        }
        Ok(self
            .cached_metadata(path, fs)?
            .and_then(|documents| documents.iter().find_map(ModuleMetadata::import_as))
            .map(str::to_string))
    }

    fn cached_metadata(
        &mut self,
        dts_path: &str,
        fs: &dyn HostContext,
    ) -> Result<Option<&Vec<ModuleMetadata>>, CompilerError> {
        let key = paths::normalize(dts_path);
        if !self.cache.contains_key(&key) {
            let metadata_path = paths::metadata_path_for(&key);
            if !fs.file_exists(&metadata_path) {
                return Ok(None);
            }

            let mut documents = fs
                .read_file(&metadata_path)
                .and_then(|text| {
                    parse_documents(&text).map_err(|message| CompilerError::MetadataParse {
                        path: metadata_path.clone(),
                        message,
                    })
                })
                .inspect_err(|e| error!("{}", e))?;

            let has_v3 = documents.iter().any(ModuleMetadata::is_v3);
            let v1 = documents.iter().find_map(|doc| match doc {
                ModuleMetadata::V1(body) => Some(body.clone()),
                ModuleMetadata::V3(_) => None,
            });
            if let (false, Some(v1)) = (has_v3, v1) {
                debug!(path = %metadata_path, "upgrading version 1 metadata");
                let upgraded = self.upgrade_version1_metadata(&v1, &key, fs)?;
                documents.push(upgraded);
            }

            self.cache.insert(key.clone(), documents);
        }
        Ok(self.cache.get(&key))
    }

    fn metadata_for_source_file(
        &mut self,
        path: &str,
        fs: &dyn HostContext,
    ) -> Result<Option<ModuleMetadata>, CompilerError> {
        if !fs.file_exists(path) {
            return Err(CompilerError::SourceNotFound { path: path.to_string() });
        }
        let source = fs.read_file(path)?;
        self.collector.collect(path, &source)
    }
}
