//! Source-root to generated-root path remapping.
//!
//! Generated files live in a tree rooted at `gen_dir` that mirrors the
//! source roots. This module decides where each generated file lands and
//! which specifier a generated file uses to import another file.

use tracing::info;

use crate::config::CompileOptions;
use crate::paths;

/// Pure path arithmetic over one set of [`CompileOptions`].
#[derive(Debug, Clone)]
pub struct PathRemapper {
    base_path: String,
    gen_dir: String,
    root_dirs: Vec<String>,
    trace: bool,
    gen_dir_within_base: bool,
}

impl PathRemapper {
    pub fn new(options: &CompileOptions) -> Self {
        let gen_path = paths::relative(&options.base_path, &options.gen_dir);
        Self {
            base_path: options.base_path.clone(),
            gen_dir: options.gen_dir.clone(),
            root_dirs: options.root_dirs.clone(),
            trace: options.trace,
            gen_dir_within_base: gen_path.is_empty() || !gen_path.starts_with(".."),
        }
    }

    pub fn gen_dir(&self) -> &str {
        &self.gen_dir
    }

    /// Where the generated counterpart of `file_path` is written.
    ///
    /// The file is placed relative to the last configured root dir that
    /// contains it, or to the base path when none does. The result never
    /// escapes `gen_dir`.
    pub fn calculate_emit_path(&self, file_path: &str) -> String {
        let file_path = paths::normalize(file_path);
        let mut root = self.base_path.as_str();

        for root_dir in &self.root_dirs {
            let rel = paths::relative(root_dir, &file_path);
            if self.trace {
                info!(target: "aotgen::trace", "Check if {} is under rootDirs element {}", file_path, root_dir);
            }
            if !paths::is_escape(&rel) {
                root = root_dir;
            }
        }

        let rel = paths::relative(root, &file_path);
        paths::join(&self.gen_dir, paths::strip_escapes(&rel))
    }

    /// Maps a path into its generated-tree location.
    ///
    /// Anything inside a `node_modules` directory is transplanted under
    /// `gen_dir/node_modules`; paths under the base path are re-rooted onto
    /// `gen_dir`. Other paths are returned unchanged.
    pub fn rewrite_gen_dir_path(&self, path: &str) -> String {
        if let Some(idx) = paths::dependency_root_index(path) {
            return paths::join(&self.gen_dir, &path[idx + 1..]);
        }
        paths::replace_prefix(path, &self.base_path, &self.gen_dir).unwrap_or_else(|| path.to_string())
    }

    /// Import specifier `containing_file` uses to reach `imported_file`.
    ///
    /// Generated targets are addressed relative to the generated tree.
    /// Dependency targets keep their package specifier. Everything else is
    /// dot-relative, unless it is already a bare package-shaped name.
    pub fn module_specifier(&self, imported_file: &str, containing_file: &str) -> String {
        let containing_file = self.rewrite_gen_dir_path(containing_file);
        let containing_dir = paths::dirname(&containing_file);

        let imported_file = paths::strip_extension(imported_file);
        let import_module = paths::dependency_module(&imported_file);

        if paths::is_generated_module(&imported_file) {
            return match import_module {
                Some(module) => paths::dot_relative(
                    &containing_dir,
                    &format!("{}/{}/{}", self.gen_dir, paths::DEPENDENCY_ROOT, module),
                ),
                None => paths::dot_relative(&containing_dir, &self.rewrite_gen_dir_path(&imported_file)),
            };
        }

        if let Some(module) = import_module {
            return module.to_string();
        }

        let imported_file = if self.gen_dir_within_base {
            imported_file
        } else {
            paths::replace_prefix(&imported_file, &self.base_path, &self.gen_dir).unwrap_or(imported_file)
        };

        if paths::is_shallow_import(&imported_file) {
            imported_file
        } else {
            paths::dot_relative(&containing_dir, &imported_file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remapper(base: &str, gen: &str, roots: &[&str]) -> PathRemapper {
        PathRemapper::new(&CompileOptions::new(base, gen).with_root_dirs(roots.iter().copied()))
    }

    #[test]
    fn test_emit_path_under_base() {
        let remap = remapper("/proj/src", "/proj/gen", &[]);
        assert_eq!(remap.calculate_emit_path("/proj/src/app/a.ts"), "/proj/gen/app/a.ts");
    }

    #[test]
    fn test_emit_path_last_matching_root_wins() {
        let remap = remapper("/proj", "/proj/gen", &["/proj/a", "/proj/a/sub"]);
        assert_eq!(remap.calculate_emit_path("/proj/a/sub/x.ts"), "/proj/gen/x.ts");
        assert_eq!(remap.calculate_emit_path("/proj/a/y.ts"), "/proj/gen/y.ts");

        let reversed = remapper("/proj", "/proj/gen", &["/proj/a/sub", "/proj/a"]);
        assert_eq!(reversed.calculate_emit_path("/proj/a/sub/x.ts"), "/proj/gen/sub/x.ts");
    }

    #[test]
    fn test_emit_path_never_escapes_gen_dir() {
        let remap = remapper("/proj/src", "/proj/gen", &[]);
        assert_eq!(
            remap.calculate_emit_path("/proj/node_modules/@foo/bar.ts"),
            "/proj/gen/node_modules/@foo/bar.ts"
        );
        assert_eq!(remap.calculate_emit_path("/other/x.ts"), "/proj/gen/other/x.ts");
        assert_eq!(remap.calculate_emit_path("/proj"), "/proj/gen");
    }

    #[test]
    fn test_rewrite_gen_dir_path() {
        let remap = remapper("/proj/src", "/proj/gen", &[]);
        assert_eq!(
            remap.rewrite_gen_dir_path("/proj/node_modules/@lib/core/index.ngfactory.ts"),
            "/proj/gen/node_modules/@lib/core/index.ngfactory.ts"
        );
        assert_eq!(remap.rewrite_gen_dir_path("/proj/src/app/a.ts"), "/proj/gen/app/a.ts");
        assert_eq!(remap.rewrite_gen_dir_path("/elsewhere/a.ts"), "/elsewhere/a.ts");
    }

    #[test]
    fn test_dependency_specifier_is_bare() {
        let remap = remapper("/proj/src", "/proj/gen", &[]);
        assert_eq!(
            remap.module_specifier("/proj/node_modules/@scope/lib/index.ts", "/proj/gen/app/a.factory.ts"),
            "@scope/lib/index"
        );
        assert_eq!(
            remap.module_specifier("/proj/node_modules/lib/index.d.ts", "/proj/src/app/a.ngfactory.ts"),
            "lib/index"
        );
    }

    #[test]
    fn test_generated_dependency_specifier() {
        let remap = remapper("/proj/src", "/proj/gen", &[]);
        assert_eq!(
            remap.module_specifier(
                "/proj/node_modules/@lib/core/core.ngfactory.ts",
                "/proj/src/app/a.ngfactory.ts"
            ),
            "../node_modules/@lib/core/core.ngfactory"
        );
    }

    #[test]
    fn test_generated_sibling_specifier() {
        let remap = remapper("/proj/src", "/proj/gen", &[]);
        assert_eq!(
            remap.module_specifier("/proj/src/app/b.ngfactory.ts", "/proj/src/app/a.ngfactory.ts"),
            "./b.ngfactory"
        );
    }

    #[test]
    fn test_source_specifier_overlays_gen_dir() {
        // gen dir outside the base path: sources are addressed as if they
        // had been copied next to the generated files.
        let remap = remapper("/proj/src", "/proj/gen", &[]);
        assert_eq!(
            remap.module_specifier("/proj/src/app/a.component.ts", "/proj/src/app/a.ngfactory.ts"),
            "./a.component"
        );
    }

    #[test]
    fn test_source_specifier_with_gen_dir_inside_base() {
        let remap = remapper("/proj", "/proj/gen", &[]);
        assert_eq!(
            remap.module_specifier("/proj/app/a.component.ts", "/proj/app/a.ngfactory.ts"),
            "../../app/a.component"
        );
    }

    #[test]
    fn test_specifiers_are_dot_relative_or_bare() {
        let remap = remapper("/proj/src", "/proj/gen", &["/proj/src", "/proj/lib"]);
        let cases = [
            ("/proj/src/app/x.ts", "/proj/src/app/y.ngfactory.ts"),
            ("/proj/lib/z.ts", "/proj/src/app/y.ngfactory.ts"),
            ("/proj/node_modules/a/b.d.ts", "/proj/src/y.ts"),
            ("/proj/src/app/w.ngstyle.ts", "/proj/src/y.ts"),
        ];
        for (imported, containing) in cases {
            let specifier = remap.module_specifier(imported, containing);
            assert!(
                specifier.starts_with('.') || paths::is_shallow_import(&specifier),
                "unexpected specifier {}",
                specifier
            );
        }
    }
}
