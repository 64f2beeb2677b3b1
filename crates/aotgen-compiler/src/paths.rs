//! Lexical path algebra.
//!
//! Every path handled by the compiler is a forward-slash string with no
//! trailing separator. Nothing here touches the filesystem, so the same
//! functions serve real disks and in-memory hosts.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Directory name that bounds dependency packages.
pub const DEPENDENCY_ROOT: &str = "node_modules";

/// Extensions stripped from a file name to get its module name.
static EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.ts|\.d\.ts|\.js|\.jsx|\.tsx)$").unwrap());

/// Module names (extension already stripped) of generated-kind files.
static IS_GENERATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(ngfactory|ngstyle|ngsummary)$").unwrap());

/// Generated-kind source files that must never be fed back into analysis.
static GENERATED_FILES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.ngfactory\.ts$|\.ngstyle\.ts$|\.ngsummary\.ts$").unwrap());

/// Generated files that carry data instead of code.
static GENERATED_META_FILES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.json$").unwrap());

/// Specifiers that can be used as-is: `name` or `@scope/name[/more]`.
static SHALLOW_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[\w-]+|@[\w-]+(?:/[\w-]+)+)$").unwrap());

static DTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.d\.ts$").unwrap());

/// Normalizes a path lexically: unifies separators, folds `.` and `..`
/// segments and drops the trailing separator.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (prefix, rest) = split_root(&path);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `..` above the root of an absolute path is the root.
                _ if !prefix.is_empty() => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (prefix.is_empty(), joined.is_empty()) {
        (true, true) => ".".to_string(),
        (true, false) => joined,
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}{}", prefix, joined),
    }
}

/// Splits off the root of an absolute path (`/` or `C:/`).
fn split_root(path: &str) -> (&str, &str) {
    if path.starts_with('/') {
        return ("/", &path[1..]);
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/' {
        return (&path[..3], &path[3..]);
    }
    ("", path)
}

/// Returns true when the path is rooted.
pub fn is_absolute(path: &str) -> bool {
    !split_root(&path.replace('\\', "/")).0.is_empty()
}

/// Joins `tail` onto `base`. An absolute `tail` replaces `base`.
pub fn join(base: &str, tail: &str) -> String {
    if is_absolute(tail) {
        return normalize(tail);
    }
    normalize(&format!("{}/{}", base, tail))
}

/// Parent directory, `/` for top-level entries and the root itself.
pub fn dirname(path: &str) -> String {
    let path = normalize(path);
    let (prefix, rest) = split_root(&path);
    match rest.rfind('/') {
        Some(idx) => format!("{}{}", prefix, &rest[..idx]),
        None if !prefix.is_empty() => prefix.to_string(),
        None => ".".to_string(),
    }
}

/// Last path segment.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// True for the root of an absolute path.
pub fn is_root(path: &str) -> bool {
    let path = normalize(path);
    let (prefix, rest) = split_root(&path);
    !prefix.is_empty() && rest.is_empty()
}

/// Relative path from directory `from` to `to`, with `/` separators.
/// Identical paths yield an empty string.
pub fn relative(from: &str, to: &str) -> String {
    let from = normalize(from);
    let to = normalize(to);
    match pathdiff::diff_paths(Path::new(&to), Path::new(&from)) {
        Some(rel) => rel.to_string_lossy().replace('\\', "/"),
        None => to,
    }
}

/// True when a relative path climbs out of its base.
pub fn is_escape(rel: &str) -> bool {
    rel == ".." || rel.starts_with("../")
}

/// Removes leading `..` segments one at a time.
pub fn strip_escapes(rel: &str) -> &str {
    let mut rel = rel;
    loop {
        if rel == ".." {
            return "";
        }
        match rel.strip_prefix("../") {
            Some(rest) => rel = rest,
            None => return rel,
        }
    }
}

/// Relative specifier that always starts with `.`.
pub fn dot_relative(from: &str, to: &str) -> String {
    let rel = relative(from, to);
    if rel.starts_with('.') {
        rel
    } else {
        format!("./{}", rel)
    }
}

/// Replaces `old` with `new` when `path` is `old` itself or lies under it.
pub fn replace_prefix(path: &str, old: &str, new: &str) -> Option<String> {
    if path == old {
        return Some(new.to_string());
    }
    let rest = path.strip_prefix(old)?;
    if rest.starts_with('/') || old.ends_with('/') {
        Some(format!("{}{}", new, rest))
    } else {
        None
    }
}

/// Strips a `.ts`, `.d.ts`, `.js`, `.jsx` or `.tsx` extension.
pub fn strip_extension(path: &str) -> String {
    EXT.replace(path, "").into_owned()
}

/// Declaration unit (`.d.ts`).
pub fn is_declaration_file(path: &str) -> bool {
    DTS.is_match(path)
}

/// Generated-kind source file (`.ngfactory.ts`, `.ngstyle.ts`, `.ngsummary.ts`).
pub fn is_generated_file(path: &str) -> bool {
    GENERATED_FILES.is_match(path)
}

/// Generated-kind module name, extension already stripped.
pub fn is_generated_module(module: &str) -> bool {
    IS_GENERATED.is_match(module)
}

/// Generated data file that must not receive a code preamble.
pub fn is_generated_meta_file(path: &str) -> bool {
    GENERATED_META_FILES.is_match(path)
}

/// Specifier usable without a relative prefix.
pub fn is_shallow_import(specifier: &str) -> bool {
    SHALLOW_IMPORT.is_match(specifier)
}

/// True for `./x`, `../x`, `.` and `..`.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Sidecar metadata path of a declaration file.
pub fn metadata_path_for(dts_path: &str) -> String {
    format!("{}.metadata.json", DTS.replace(dts_path, ""))
}

/// Sub-path after the first `/node_modules/`, if any.
pub fn dependency_module(path: &str) -> Option<&str> {
    let marker = format!("/{}/", DEPENDENCY_ROOT);
    path.find(&marker).map(|idx| &path[idx + marker.len()..])
}

/// Index of the first `/node_modules/` segment.
pub fn dependency_root_index(path: &str) -> Option<usize> {
    path.find(&format!("/{}/", DEPENDENCY_ROOT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/proj/src/"), "/proj/src");
        assert_eq!(normalize("/proj/./src/../gen"), "/proj/gen");
        assert_eq!(normalize("C:\\proj\\src"), "C:/proj/src");
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize(""), ".");
    }

    #[test]
    fn test_dirname_and_basename() {
        assert_eq!(dirname("/proj/src/a.ts"), "/proj/src");
        assert_eq!(dirname("/proj"), "/");
        assert_eq!(dirname("/"), "/");
        assert_eq!(basename("/proj/node_modules/"), "node_modules");
        assert!(is_root("/"));
        assert!(!is_root("/proj"));
    }

    #[test]
    fn test_relative() {
        assert_eq!(relative("/proj/src", "/proj/src/app/a.ts"), "app/a.ts");
        assert_eq!(relative("/proj/src", "/proj/lib/b.ts"), "../lib/b.ts");
        assert_eq!(relative("/proj/src", "/proj/src"), "");
    }

    #[test]
    fn test_strip_escapes() {
        assert_eq!(strip_escapes("../../node_modules/x.ts"), "node_modules/x.ts");
        assert_eq!(strip_escapes(".."), "");
        assert_eq!(strip_escapes("app/a.ts"), "app/a.ts");
        assert_eq!(strip_escapes("..foo/a.ts"), "..foo/a.ts");
    }

    #[test]
    fn test_dot_relative() {
        assert_eq!(dot_relative("/proj/gen/app", "/proj/gen/app/b"), "./b");
        assert_eq!(dot_relative("/proj/gen/app", "/proj/gen/lib/c"), "../lib/c");
    }

    #[test]
    fn test_replace_prefix_requires_segment_boundary() {
        assert_eq!(replace_prefix("/proj/src/a", "/proj/src", "/proj/gen").as_deref(), Some("/proj/gen/a"));
        assert_eq!(replace_prefix("/proj/srcx/a", "/proj/src", "/proj/gen"), None);
    }

    #[test]
    fn test_classification() {
        assert_eq!(strip_extension("/a/b.d.ts"), "/a/b");
        assert_eq!(strip_extension("/a/b.tsx"), "/a/b");
        assert!(is_generated_file("/a/b.ngfactory.ts"));
        assert!(!is_generated_file("/a/b.ts"));
        assert!(is_generated_module("/a/b.ngstyle"));
        assert!(is_shallow_import("lodash"));
        assert!(is_shallow_import("@scope/lib/testing"));
        assert!(!is_shallow_import("/abs/path"));
        assert!(!is_shallow_import("@scope"));
        assert_eq!(metadata_path_for("/lib/index.d.ts"), "/lib/index.metadata.json");
        assert_eq!(dependency_module("/p/node_modules/@s/lib/index"), Some("@s/lib/index"));
    }
}
