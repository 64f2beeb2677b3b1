//! The compiler host: metadata, bundle detection and path remapping behind
//! one read/write/resolve surface.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::debug;

use crate::bundle_index::BundleIndexDetector;
use crate::config::CompileOptions;
use crate::diagnostic::CompilerError;
use crate::frontend::{default_collector, MetadataCollector};
use crate::metadata::{MetadataStore, ModuleMetadata};
use crate::paths;
use crate::remap::PathRemapper;

use super::context::HostContext;
use super::resolver::{FileProbe, ModuleResolution, NodeModuleResolution};

/// Scheme for resource URLs that name a file inside a dependency package.
const PACKAGE_SCHEME: &str = "package:";

/// Host for one compilation.
///
/// Owns every cache used while compiling. Build a new host for each run;
/// nothing here is ever invalidated.
pub struct CompilerHost {
    options: CompileOptions,
    remapper: PathRemapper,
    context: Rc<dyn HostContext>,
    resolver: Box<dyn ModuleResolution>,
    metadata: MetadataStore,
    bundles: BundleIndexDetector,
    module_names: HashMap<(String, String), Option<String>>,
    /// Files referenced before they are written.
    assumed_exists: HashSet<String>,
}

impl CompilerHost {
    /// Creates a host with Node-style resolution and the TypeScript collector.
    pub fn new(options: CompileOptions, context: Rc<dyn HostContext>) -> Result<Self, CompilerError> {
        Ok(Self::with_parts(
            options,
            context,
            Box::new(NodeModuleResolution::new()),
            default_collector()?,
        ))
    }

    pub fn with_parts(
        options: CompileOptions,
        context: Rc<dyn HostContext>,
        resolver: Box<dyn ModuleResolution>,
        collector: Box<dyn MetadataCollector>,
    ) -> Self {
        Self {
            remapper: PathRemapper::new(&options),
            options,
            context,
            resolver,
            metadata: MetadataStore::new(collector),
            bundles: BundleIndexDetector::new(),
            module_names: HashMap::new(),
            assumed_exists: HashSet::new(),
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn context(&self) -> &dyn HostContext {
        self.context.as_ref()
    }

    pub fn get_canonical_file_name(&self, path: &str) -> String {
        paths::normalize(path)
    }

    /// Existence check that also honours files assumed to exist.
    pub fn file_exists(&self, path: &str) -> bool {
        let path = self.get_canonical_file_name(path);
        self.assumed_exists.contains(&path) || self.context.file_exists(&path)
    }

    /// Records a file that will be written later in this run.
    pub fn assume_file_exists(&mut self, path: &str) {
        let path = self.get_canonical_file_name(path);
        self.assumed_exists.insert(path);
    }

    pub fn get_metadata_for(&mut self, path: &str) -> Result<Vec<ModuleMetadata>, CompilerError> {
        let path = self.get_canonical_file_name(path);
        self.metadata.get_metadata_for(&path, self.context.as_ref())
    }

    pub fn get_import_as(&mut self, path: &str) -> Result<Option<String>, CompilerError> {
        let path = self.get_canonical_file_name(path);
        self.metadata.get_import_as(&path, self.context.as_ref())
    }

    pub fn calculate_emit_path(&self, file_path: &str) -> String {
        self.remapper.calculate_emit_path(file_path)
    }

    /// Import specifier `containing_file` uses to reach `imported_file`.
    ///
    /// An `importAs` recorded in the target's metadata always wins. A target
    /// that does not exist yet is assumed to be generated later in the run.
    pub fn file_name_to_module_name(
        &mut self,
        imported_file: &str,
        containing_file: &str,
    ) -> Result<String, CompilerError> {
        let imported_file = paths::normalize(imported_file);
        let containing_file = paths::normalize(containing_file);

        if let Some(import_as) = self.get_import_as(&imported_file)? {
            return Ok(import_as);
        }

        if imported_file != containing_file && !self.file_exists(&imported_file) {
            self.assume_file_exists(&imported_file);
        }

        Ok(self.remapper.module_specifier(&imported_file, &containing_file))
    }

    /// Resolves a module specifier to a file, memoizing misses as well.
    pub fn module_name_to_file_name(
        &mut self,
        specifier: &str,
        containing_file: Option<&str>,
    ) -> Result<Option<String>, CompilerError> {
        let key = (
            specifier.to_string(),
            containing_file.map(paths::normalize).unwrap_or_default(),
        );
        if let Some(cached) = self.module_names.get(&key) {
            return Ok(cached.clone());
        }

        let containing_file = match containing_file.filter(|file| !file.is_empty()) {
            Some(file) => paths::normalize(file),
            None => {
                if paths::is_relative_specifier(specifier) {
                    return Err(CompilerError::RelativeImportWithoutContainingFile {
                        specifier: specifier.to_string(),
                    });
                }
                paths::join(&self.options.base_path, "index.ts")
            }
        };

        let stripped = paths::strip_extension(specifier);
        let probe = ResolutionProbe {
            context: self.context.as_ref(),
            assumed_exists: &self.assumed_exists,
        };
        let resolved = self
            .resolver
            .resolve_module_name(&stripped, &containing_file, &probe)
            .map(|path| paths::normalize(&path));

        debug!(specifier, containing = %containing_file, resolved = ?resolved, "resolved module name");
        self.module_names.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Whether a file is compiled in this run.
    ///
    /// Generated files never are. Declaration files are excluded unless
    /// library code generation is on, and then only the entry points and
    /// redirects of a flat bundle count.
    pub fn is_source_file(&mut self, path: &str) -> bool {
        let path = self.get_canonical_file_name(path);
        let is_declaration = paths::is_declaration_file(&path);

        if paths::is_generated_file(&path) {
            return false;
        }
        if is_declaration && !self.options.generate_code_for_libraries {
            return false;
        }
        if is_declaration && self.bundles.has_bundle_index(&path, self.context.as_ref()) {
            return self.bundles.is_entry_point(&path) || self.bundles.is_redirect(&path);
        }
        true
    }

    /// Resolves a template or stylesheet URL against the file referencing it.
    pub fn resource_name_to_file_name(&self, resource_name: &str, containing_file: &str) -> String {
        if let Some(package_path) = resource_name.strip_prefix(PACKAGE_SCHEME) {
            let root = paths::join(&self.options.base_path, paths::DEPENDENCY_ROOT);
            return paths::join(&root, package_path.trim_start_matches('/'));
        }
        paths::join(&paths::dirname(containing_file), resource_name)
    }

    pub fn load_resource(&self, path: &str) -> Result<String, CompilerError> {
        if !self.context.file_exists(path) {
            return Err(CompilerError::ResourceNotFound { path: path.to_string() });
        }
        self.context.read_file(path)
    }

    /// Summary text, `None` when absent or unreadable.
    pub fn load_summary(&self, path: &str) -> Option<String> {
        if !self.context.file_exists(path) {
            return None;
        }
        self.context.read_file(path).ok()
    }

    pub fn to_summary_file_name(&self, file_name: &str, _referring_src_file_name: &str) -> String {
        format!("{}.d.ts", paths::strip_extension(file_name))
    }

    pub fn from_summary_file_name(&self, file_name: &str, _referring_lib_file_name: &str) -> String {
        file_name.to_string()
    }

    pub fn write_file(&self, path: &str, content: &str, source_files: &[String]) -> Result<(), CompilerError> {
        self.context.write_file(path, content, source_files)
    }
}

/// Existence view used while resolving specifiers.
///
/// A declaration file also counts as present when only its summary exists.
struct ResolutionProbe<'a> {
    context: &'a dyn HostContext,
    assumed_exists: &'a HashSet<String>,
}

impl FileProbe for ResolutionProbe<'_> {
    fn file_exists(&self, path: &str) -> bool {
        let path = paths::normalize(path);
        if self.assumed_exists.contains(&path) || self.context.file_exists(&path) {
            return true;
        }
        paths::is_declaration_file(&path)
            && self
                .context
                .file_exists(&format!("{}.ngsummary.json", paths::strip_extension(&path)))
    }

    fn directory_exists(&self, path: &str) -> bool {
        self.context.directory_exists(path)
    }

    fn read_file(&self, path: &str) -> Option<String> {
        self.context.read_file(path).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHostContext;

    fn host(fs: &Rc<MemoryHostContext>, options: CompileOptions) -> CompilerHost {
        CompilerHost::new(options, fs.clone()).unwrap()
    }

    fn options() -> CompileOptions {
        CompileOptions::new("/proj/src", "/proj/gen")
    }

    #[test]
    fn test_import_as_wins() {
        let fs = Rc::new(
            MemoryHostContext::new()
                .with_file("/proj/node_modules/@lib/core/core.d.ts", "")
                .with_file(
                    "/proj/node_modules/@lib/core/core.metadata.json",
                    r#"{"__symbolic":"module","version":3,"metadata":{},"importAs":"@lib/core"}"#,
                ),
        );
        let mut host = host(&fs, options());
        assert_eq!(
            host.file_name_to_module_name("/proj/node_modules/@lib/core/core.d.ts", "/proj/src/app/a.ngfactory.ts")
                .unwrap(),
            "@lib/core"
        );
    }

    #[test]
    fn test_missing_target_is_assumed_to_exist() {
        let fs = Rc::new(MemoryHostContext::new());
        let mut host = host(&fs, options());

        assert!(!host.file_exists("/proj/src/app/b.ngfactory.ts"));
        let specifier = host
            .file_name_to_module_name("/proj/src/app/b.ngfactory.ts", "/proj/src/app/a.ngfactory.ts")
            .unwrap();
        assert_eq!(specifier, "./b.ngfactory");
        assert!(host.file_exists("/proj/src/app/b.ngfactory.ts"));

        // A file never assumes itself.
        host.file_name_to_module_name("/proj/src/app/c.ts", "/proj/src/app/c.ts").unwrap();
        assert!(!host.file_exists("/proj/src/app/c.ts"));
    }

    #[test]
    fn test_assumed_files_resolve() {
        let fs = Rc::new(MemoryHostContext::new());
        let mut host = host(&fs, options());
        host.assume_file_exists("/proj/src/app/b.ngfactory.ts");
        assert_eq!(
            host.module_name_to_file_name("./b.ngfactory", Some("/proj/src/app/a.ts")).unwrap().as_deref(),
            Some("/proj/src/app/b.ngfactory.ts")
        );
    }

    #[test]
    fn test_lookups_use_canonical_file_names() {
        let fs = Rc::new(MemoryHostContext::new());
        let mut host = host(&fs, options());
        assert_eq!(host.get_canonical_file_name("/proj/src/./app/../b.ts"), "/proj/src/b.ts");

        host.assume_file_exists("/proj/src/./app/../b.ts");
        assert!(host.file_exists("/proj/src/b.ts"));
        assert!(host.file_exists("/proj/src/app/../b.ts"));
    }

    #[test]
    fn test_module_name_resolution_is_memoized_including_misses() {
        let fs = Rc::new(MemoryHostContext::new());
        let mut host = host(&fs, options());

        assert_eq!(host.module_name_to_file_name("./b", Some("/proj/src/a.ts")).unwrap(), None);
        fs.add_file("/proj/src/b.ts", "");
        assert_eq!(host.module_name_to_file_name("./b", Some("/proj/src/a.ts")).unwrap(), None);
        assert_eq!(
            host.module_name_to_file_name("./b.ts", Some("/proj/src/a.ts")).unwrap().as_deref(),
            Some("/proj/src/b.ts")
        );
    }

    #[test]
    fn test_relative_specifier_requires_containing_file() {
        let fs = Rc::new(MemoryHostContext::new());
        let mut host = host(&fs, options());
        assert!(matches!(
            host.module_name_to_file_name("./x", None),
            Err(CompilerError::RelativeImportWithoutContainingFile { .. })
        ));
    }

    #[test]
    fn test_bare_specifier_without_containing_file_uses_base_path() {
        let fs = Rc::new(MemoryHostContext::new().with_file("/proj/src/node_modules/lib/index.d.ts", ""));
        let mut host = host(&fs, options());
        assert_eq!(
            host.module_name_to_file_name("lib", None).unwrap().as_deref(),
            Some("/proj/src/node_modules/lib/index.d.ts")
        );
    }

    #[test]
    fn test_summary_stands_in_for_declaration() {
        let fs = Rc::new(MemoryHostContext::new().with_file("/proj/node_modules/lib/index.ngsummary.json", "{}"));
        let mut host = host(&fs, options());
        assert_eq!(
            host.module_name_to_file_name("lib", Some("/proj/src/a.ts")).unwrap().as_deref(),
            Some("/proj/node_modules/lib/index.d.ts")
        );
    }

    #[test]
    fn test_is_source_file() {
        let fs = Rc::new(
            MemoryHostContext::new()
                .with_file("/proj/node_modules/@lib/core/package.json", r#"{"typings": "core.d.ts"}"#)
                .with_file(
                    "/proj/node_modules/@lib/core/core.metadata.json",
                    r#"{"__symbolic":"module","version":3,"metadata":{},"importAs":"@lib/core"}"#,
                ),
        );
        let mut host = host(&fs, options());

        assert!(host.is_source_file("/proj/src/app/a.ts"));
        assert!(!host.is_source_file("/proj/src/app/a.ngfactory.ts"));
        assert!(!host.is_source_file("/proj/src/app/a.ngsummary.ts"));
        assert!(host.is_source_file("/proj/node_modules/other/index.d.ts"));
        assert!(!host.is_source_file("/proj/node_modules/@lib/core/src/internal.d.ts"));
        assert!(host.is_source_file("/proj/node_modules/@lib/core/core.d.ts"));

        let mut no_libs = CompilerHost::new(options().with_generate_code_for_libraries(false), fs.clone()).unwrap();
        assert!(!no_libs.is_source_file("/proj/node_modules/@lib/core/core.d.ts"));
        assert!(no_libs.is_source_file("/proj/src/app/a.ts"));
    }

    #[test]
    fn test_resources() {
        let fs = Rc::new(MemoryHostContext::new().with_file("/proj/src/app/a.html", "<p></p>"));
        let host = host(&fs, options());

        let resolved = host.resource_name_to_file_name("./a.html", "/proj/src/app/a.ts");
        assert_eq!(resolved, "/proj/src/app/a.html");
        assert_eq!(host.load_resource(&resolved).unwrap(), "<p></p>");
        assert!(matches!(
            host.load_resource("/proj/src/app/missing.html"),
            Err(CompilerError::ResourceNotFound { .. })
        ));
        assert_eq!(
            host.resource_name_to_file_name("package:@lib/core/theme.css", "/proj/src/app/a.ts"),
            "/proj/src/node_modules/@lib/core/theme.css"
        );
    }

    #[test]
    fn test_summary_file_names() {
        let fs = Rc::new(MemoryHostContext::new());
        let host = host(&fs, options());
        assert_eq!(host.to_summary_file_name("/proj/src/a.ts", "/proj/src/b.ts"), "/proj/src/a.d.ts");
        assert_eq!(host.from_summary_file_name("/proj/src/a.d.ts", "/x"), "/proj/src/a.d.ts");
        assert_eq!(host.load_summary("/proj/src/a.ngsummary.json"), None);
    }
}
