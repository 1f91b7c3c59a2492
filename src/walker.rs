use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ignore_patterns::IgnorePatternsManager;

/// Directories that are always pruned regardless of `.graphignore` contents
/// (spec §4.2) — VCS metadata, language/tool caches, editor state.
const ALWAYS_SKIP_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".coverage",
    ".sass-cache",
    ".cache",
    ".DS_Store",
    ".idea",
    ".vscode",
    ".vs",
    "node_modules",
    ".env",
    ".venv",
    "target",
];

/// One discovered, in-budget source file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size_bytes: u64,
}

/// Diagnostics accumulated during a traversal (spec §4.2 "pruned-directory
/// diagnostics" / §6 progress reporting).
#[derive(Debug, Default, Clone)]
pub struct TraversalDiagnostics {
    pub pruned_dirs: Vec<String>,
    pub skipped_large_files: Vec<String>,
    pub unreadable_dirs: Vec<String>,
    pub files_found: usize,
}

/// A pruning directory walker (spec §4.2). Once a directory is pruned its
/// subtree is never visited again — whitelist patterns in `.graphignore`
/// cannot resurrect files beneath a pruned directory (Open Question 1).
pub struct Walker<'a> {
    root: PathBuf,
    ignore: &'a IgnorePatternsManager,
    supported_extensions: &'a HashSet<String>,
    max_file_size_bytes: u64,
    diagnostics: TraversalDiagnostics,
}

impl<'a> Walker<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        ignore: &'a IgnorePatternsManager,
        supported_extensions: &'a HashSet<String>,
        max_file_size_bytes: u64,
    ) -> Self {
        Self {
            root: root.into(),
            ignore,
            supported_extensions,
            max_file_size_bytes,
            diagnostics: TraversalDiagnostics::default(),
        }
    }

    /// Walk the tree and return every in-budget, non-ignored file with a
    /// supported extension, along with collected diagnostics.
    pub fn traverse(mut self) -> (Vec<DiscoveredFile>, TraversalDiagnostics) {
        let mut out = Vec::new();
        let root = self.root.clone();
        self.walk_directory(&root, &mut out);
        self.diagnostics.files_found = out.len();
        (out, self.diagnostics)
    }

    fn relative_str(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn is_always_skipped(path: &Path) -> bool {
        path.components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|s| ALWAYS_SKIP_DIRS.contains(&s))
        })
    }

    fn walk_directory(&mut self, dir: &Path, out: &mut Vec<DiscoveredFile>) {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => {
                self.diagnostics
                    .unreadable_dirs
                    .push(self.relative_str(dir));
                return;
            }
        };

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_file() {
                files.push(path);
            } else if file_type.is_dir() {
                dirs.push(path);
            }
        }

        for file_path in files {
            let relative = self.relative_str(&file_path);
            if Self::is_always_skipped(&file_path) || self.ignore.should_ignore_path(&relative) {
                continue;
            }
            let Some(ext) = file_path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e.to_lowercase()))
            else {
                continue;
            };
            if !self.supported_extensions.contains(&ext) {
                continue;
            }
            let Ok(metadata) = fs::metadata(&file_path) else {
                continue;
            };
            if metadata.len() > self.max_file_size_bytes {
                self.diagnostics.skipped_large_files.push(relative);
                continue;
            }
            out.push(DiscoveredFile {
                path: file_path,
                relative_path: relative,
                size_bytes: metadata.len(),
            });
        }

        for dir_path in dirs {
            let relative = self.relative_str(&dir_path);
            if Self::is_always_skipped(&dir_path) || self.ignore.should_ignore_path(&relative) {
                self.diagnostics.pruned_dirs.push(relative);
                continue;
            }
            self.walk_directory(&dir_path, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn extensions(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prunes_always_skip_dirs_without_descending() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(dir.path().join("main.js"), "x").unwrap();

        let ignore = IgnorePatternsManager::empty();
        let exts = extensions(&[".js"]);
        let walker = Walker::new(dir.path(), &ignore, &exts, 1024 * 1024);
        let (files, diag) = walker.traverse();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "main.js");
        assert!(diag.pruned_dirs.iter().any(|d| d.contains("node_modules")));
    }

    #[test]
    fn whitelist_pattern_cannot_resurrect_pruned_subtree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vendor/keep")).unwrap();
        fs::write(dir.path().join("vendor/keep/lib.js"), "x").unwrap();

        let mut ignore = IgnorePatternsManager::empty();
        ignore.add_pattern("vendor/", false).unwrap();
        ignore.add_pattern("vendor/keep/*", true).unwrap();

        let exts = extensions(&[".js"]);
        let walker = Walker::new(dir.path(), &ignore, &exts, 1024 * 1024);
        let (files, _) = walker.traverse();

        assert!(files.is_empty());
    }

    #[test]
    fn skips_files_over_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.js"), vec![b'x'; 2048]).unwrap();
        fs::write(dir.path().join("small.js"), "ok").unwrap();

        let ignore = IgnorePatternsManager::empty();
        let exts = extensions(&[".js"]);
        let walker = Walker::new(dir.path(), &ignore, &exts, 1024);
        let (files, diag) = walker.traverse();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "small.js");
        assert_eq!(diag.skipped_large_files.len(), 1);
    }

    #[test]
    fn filters_by_supported_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), "x").unwrap();
        fs::write(dir.path().join("main.rs"), "x").unwrap();

        let ignore = IgnorePatternsManager::empty();
        let exts = extensions(&[".rs"]);
        let walker = Walker::new(dir.path(), &ignore, &exts, 1024 * 1024);
        let (files, _) = walker.traverse();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "main.rs");
    }
}
