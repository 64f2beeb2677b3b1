//! Filesystem collaborators.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use crate::diagnostic::CompilerError;
use crate::paths;

/// Read, probe and write primitives the compiler needs from its environment.
pub trait HostContext {
    fn file_exists(&self, path: &str) -> bool;

    fn directory_exists(&self, path: &str) -> bool;

    fn read_file(&self, path: &str) -> Result<String, CompilerError>;

    /// Writes a generated file. `source_files` are the inputs it was generated from.
    fn write_file(&self, path: &str, content: &str, source_files: &[String]) -> Result<(), CompilerError>;
}

/// Host backed by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeHostContext;

impl NodeHostContext {
    pub fn new() -> Self {
        Self
    }
}

impl HostContext for NodeHostContext {
    fn file_exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn directory_exists(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn read_file(&self, path: &str) -> Result<String, CompilerError> {
        std::fs::read_to_string(path).map_err(|e| CompilerError::io(path, e.to_string()))
    }

    fn write_file(&self, path: &str, content: &str, _source_files: &[String]) -> Result<(), CompilerError> {
        let target = Path::new(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CompilerError::io(parent, e.to_string()))?;
        }
        std::fs::write(target, content).map_err(|e| CompilerError::io(target, e.to_string()))
    }
}

/// Host that keeps every file in memory.
///
/// Directories exist implicitly when some file lives beneath them.
#[derive(Debug, Default)]
pub struct MemoryHostContext {
    files: RefCell<BTreeMap<String, String>>,
    written: RefCell<Vec<String>>,
}

impl MemoryHostContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&self, path: &str, content: &str) {
        self.files
            .borrow_mut()
            .insert(paths::normalize(path), content.to_string());
    }

    pub fn remove_file(&self, path: &str) {
        self.files.borrow_mut().remove(&paths::normalize(path));
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.borrow().get(&paths::normalize(path)).cloned()
    }

    /// Paths passed to `write_file`, in order.
    pub fn written(&self) -> Vec<String> {
        self.written.borrow().clone()
    }
}

impl HostContext for MemoryHostContext {
    fn file_exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(&paths::normalize(path))
    }

    fn directory_exists(&self, path: &str) -> bool {
        let dir = paths::normalize(path);
        let prefix = if dir.ends_with('/') { dir } else { format!("{}/", dir) };
        self.files.borrow().keys().any(|file| file.starts_with(&prefix))
    }

    fn read_file(&self, path: &str) -> Result<String, CompilerError> {
        self.get(path)
            .ok_or_else(|| CompilerError::io(path, "no such file"))
    }

    fn write_file(&self, path: &str, content: &str, _source_files: &[String]) -> Result<(), CompilerError> {
        let path = paths::normalize(path);
        self.files.borrow_mut().insert(path.clone(), content.to_string());
        self.written.borrow_mut().push(path);
        Ok(())
    }
}
