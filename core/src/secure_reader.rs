//! §4.1 Secure Reader. The only component in the core that touches the file
//! system; every other component reads source through here so path safety
//! never needs to be re-checked downstream.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use crate::error::CoreError;
use crate::error::Result;

pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Source, config, and doc extensions. Matches the spirit of spec.md §4.1's
/// "fixed allow-list (source, config, doc)" without trying to be exhaustive.
const ALLOWED_EXTENSIONS: &[&str] = &[
    // source
    "rs", "ts", "tsx", "js", "jsx", "mjs", "py", "go", "java", "kt", "kts", "rb", "c", "h", "cc",
    "cpp", "hpp", "cs", "php", "swift", "scala", "sh", "bash", "zsh",
    // config
    "toml", "yaml", "yml", "json", "ini", "cfg", "env", "conf",
    // doc
    "md", "mdx", "txt", "rst", "adoc",
];

const RELATED_SUFFIXES: &[&str] = &["test", "spec", "Service", "Controller", "Client"];

pub struct SecureReader {
    root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Arc<str>>>,
}

impl SecureReader {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.root
    }

    /// Clears the content cache. Also used whenever the root changes
    /// (spec.md §4.1).
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Lexically normalize `requested` against the project root, rejecting
    /// any path whose normalized form escapes it. This is symlink-agnostic
    /// by design (spec.md §4.1): we never call `fs::canonicalize`, which
    /// would follow symlinks and could be used to smuggle a path outside
    /// the root past this check.
    fn resolve(&self, requested: &Path) -> Result<PathBuf> {
        let candidate = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        let mut normalized = PathBuf::new();
        for component in candidate.components() {
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(CoreError::PathTraversal(requested.display().to_string()));
                    }
                }
                Component::CurDir => {}
                Component::Normal(part) => normalized.push(part),
                Component::RootDir | Component::Prefix(_) => {
                    normalized.push(component.as_os_str())
                }
            }
        }

        if !normalized.starts_with(&self.root) {
            return Err(CoreError::PathTraversal(requested.display().to_string()));
        }
        Ok(normalized)
    }

    fn check_extension(&self, path: &Path) -> Result<()> {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(|e| e.to_ascii_lowercase());
        match ext {
            Some(e) if ALLOWED_EXTENSIONS.contains(&e.as_str()) => Ok(()),
            _ => Err(CoreError::InvalidFileType(path.display().to_string())),
        }
    }

    /// Read a file's contents, enforcing path confinement, the extension
    /// allow-list, and the size cap (spec.md §4.1).
    pub fn read(&self, requested: &Path) -> Result<Arc<str>> {
        let resolved = self.resolve(requested)?;

        if let Some(cached) = self.cache.lock().unwrap_or_else(|e| e.into_inner()).get(&resolved)
        {
            return Ok(cached.clone());
        }

        self.check_extension(&resolved)?;

        let meta = std::fs::metadata(&resolved)
            .map_err(|e| CoreError::fs(resolved.display().to_string(), e))?;
        if !meta.is_file() {
            return Err(CoreError::NotAFile(resolved.display().to_string()));
        }
        if meta.len() > MAX_FILE_SIZE_BYTES {
            return Err(CoreError::FileTooLarge(
                resolved.display().to_string(),
                MAX_FILE_SIZE_BYTES,
            ));
        }

        let bytes = std::fs::read(&resolved)
            .map_err(|e| CoreError::fs(resolved.display().to_string(), e))?;
        let text: Arc<str> = String::from_utf8_lossy(&bytes).into_owned().into();

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(resolved, text.clone());
        Ok(text)
    }

    /// Read a bounded window of lines around `line` (1-based), for excerpt
    /// prompts (used by the Remote Dialogue Adapter, spec.md §4.4).
    pub fn read_excerpt(&self, requested: &Path, line: u32, context: u32) -> Result<String> {
        let content = self.read(requested)?;
        let lines: Vec<&str> = content.lines().collect();
        let line_idx = line.saturating_sub(1) as usize;
        let start = line_idx.saturating_sub(context as usize);
        let end = (line_idx + context as usize + 1).min(lines.len());
        Ok(lines[start.min(lines.len())..end].join("\n"))
    }

    /// Sibling paths under the same directory whose names share `base`'s
    /// stem or a well-known suffix (spec.md §4.1).
    pub fn find_related(&self, base: &Path) -> Result<Vec<PathBuf>> {
        let resolved = self.resolve(base)?;
        let dir = resolved
            .parent()
            .ok_or_else(|| CoreError::NotAFile(base.display().to_string()))?;
        let stem = resolved
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_ascii_lowercase();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => return Err(CoreError::fs(dir.display().to_string(), e)),
        };

        let mut related = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path == resolved {
                continue;
            }
            let Some(entry_stem) = path.file_stem().and_then(OsStr::to_str) else {
                continue;
            };
            let lower = entry_stem.to_ascii_lowercase();
            let shares_base = lower.contains(&stem) || stem.contains(&lower);
            let shares_suffix = RELATED_SUFFIXES
                .iter()
                .any(|suffix| lower.contains(&suffix.to_ascii_lowercase()));
            if !stem.is_empty() && (shares_base || (shares_suffix && lower.starts_with(&stem))) {
                related.push(path);
            }
        }
        related.sort();
        Ok(related)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::fs;

    fn reader_with_files(files: &[(&str, &str)]) -> (tempfile::TempDir, SecureReader) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }
        let root = dir.path().canonicalize().unwrap();
        let reader = SecureReader::new(root);
        (dir, reader)
    }

    #[test]
    fn rejects_path_traversal() {
        let (_dir, reader) = reader_with_files(&[("a.rs", "fn main() {}")]);
        let err = reader.read(Path::new("../outside")).unwrap_err();
        assert!(matches!(err, CoreError::PathTraversal(_)));
    }

    #[test]
    fn rejects_disallowed_extension() {
        let (_dir, reader) = reader_with_files(&[("a.exe", "binary")]);
        let err = reader.read(Path::new("a.exe")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFileType(_)));
    }

    #[test]
    fn rejects_oversized_file() {
        let (dir, reader) = reader_with_files(&[]);
        let big = vec![b'a'; (MAX_FILE_SIZE_BYTES + 1) as usize];
        fs::write(dir.path().join("big.rs"), &big).unwrap();
        let err = reader.read(Path::new("big.rs")).unwrap_err();
        assert!(matches!(err, CoreError::FileTooLarge(_, _)));
    }

    #[test]
    fn caches_content_across_reads() {
        let (dir, reader) = reader_with_files(&[("a.rs", "one")]);
        let first = reader.read(Path::new("a.rs")).unwrap();
        fs::write(dir.path().join("a.rs"), "two").unwrap();
        let second = reader.read(Path::new("a.rs")).unwrap();
        assert_eq!(&*first, &*second);
        reader.clear_cache();
        let third = reader.read(Path::new("a.rs")).unwrap();
        assert_eq!(&*third, "two");
    }

    #[test]
    fn finds_related_files() {
        let (_dir, reader) = reader_with_files(&[
            ("widget.rs", "struct Widget;"),
            ("widget.test.rs", "mod tests {}"),
            ("widget_service.rs", "struct WidgetService;"),
            ("unrelated.rs", ""),
        ]);
        let related = reader.find_related(Path::new("widget.rs")).unwrap();
        assert!(related.iter().any(|p| p.ends_with("widget.test.rs")));
        assert!(related.iter().any(|p| p.ends_with("widget_service.rs")));
        assert!(!related.iter().any(|p| p.ends_with("unrelated.rs")));
    }

    #[test]
    fn read_excerpt_windows_around_line() {
        let content = (1..=10)
            .map(|n| format!("line{n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let (_dir, reader) = reader_with_files(&[("a.rs", &content)]);
        let excerpt = reader.read_excerpt(Path::new("a.rs"), 5, 2).unwrap();
        assert_eq!(excerpt, "line3\nline4\nline5\nline6\nline7");
    }
}
