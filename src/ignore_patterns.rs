use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::errors::{CoreError, CoreResult};

/// A loaded ignore/include pattern plus its compiled matcher.
struct CompiledPattern {
    source: String,
    regex: Regex,
}

/// Parses and evaluates a project's `.graphignore` file (spec §6): plain
/// glob-style ignore patterns, `!`-prefixed whitelist patterns, and
/// `language:` allow-list directives. Patterns can also be added at runtime
/// through [`IgnorePatternsManager::add_pattern`].
pub struct IgnorePatternsManager {
    patterns: Vec<CompiledPattern>,
    include_patterns: Vec<CompiledPattern>,
    language_filters: HashSet<String>,
}

impl IgnorePatternsManager {
    /// Build a manager with no patterns loaded.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            include_patterns: Vec::new(),
            language_filters: HashSet::new(),
        }
    }

    /// Load `.graphignore` from `root_path` if present. A missing file is not
    /// an error — it simply yields an empty manager.
    pub fn load(root_path: &Path) -> CoreResult<Self> {
        let mut manager = Self::empty();
        let ignore_path = root_path.join(".graphignore");
        let Ok(contents) = fs::read_to_string(&ignore_path) else {
            return Ok(manager);
        };

        for (lineno, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(lang) = line.strip_prefix("language:") {
                manager.language_filters.insert(lang.trim().to_lowercase());
                continue;
            }
            if let Some(pattern) = line.strip_prefix('!') {
                manager.add_pattern(pattern.trim(), true).map_err(|e| {
                    CoreError::IgnoreParseError {
                        path: ignore_path.display().to_string(),
                        reason: format!("line {}: {e}", lineno + 1),
                    }
                })?;
                continue;
            }
            manager.add_pattern(line, false).map_err(|e| CoreError::IgnoreParseError {
                path: ignore_path.display().to_string(),
                reason: format!("line {}: {e}", lineno + 1),
            })?;
        }

        Ok(manager)
    }

    /// Convert a glob-style pattern to an anchored regex, matching the
    /// original's substitution order: escape `.`, expand `*` and `?`, then
    /// anchor on a path boundary. A trailing `/` marks a directory pattern
    /// (no closing boundary required after it).
    fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
        let mut regex_pattern = pattern.replace('.', r"\.");
        regex_pattern = regex_pattern.replace('*', ".*");
        regex_pattern = regex_pattern.replace('?', ".");

        let anchored = if pattern.ends_with('/') {
            format!("(^|/){regex_pattern}")
        } else {
            format!("(^|/){regex_pattern}(?:/|$)")
        };
        Regex::new(&anchored)
    }

    /// Add a pattern at runtime, either as an ignore pattern or a whitelist
    /// (`include = true`) pattern.
    pub fn add_pattern(&mut self, pattern: &str, include: bool) -> Result<(), regex::Error> {
        let regex = Self::compile_pattern(pattern)?;
        let compiled = CompiledPattern {
            source: pattern.to_string(),
            regex,
        };
        if include {
            self.include_patterns.push(compiled);
        } else {
            self.patterns.push(compiled);
        }
        Ok(())
    }

    pub fn add_language_filter(&mut self, language: &str) {
        self.language_filters.insert(language.to_lowercase());
    }

    pub fn clear_language_filters(&mut self) {
        self.language_filters.clear();
    }

    /// Whitelist patterns win outright; otherwise ignore if any pattern
    /// matches. Paths are normalized to forward slashes before matching.
    pub fn should_ignore_path(&self, file_path: &str) -> bool {
        if file_path.is_empty() {
            return false;
        }
        let path = file_path.replace('\\', "/");

        if self.include_patterns.iter().any(|p| p.regex.is_match(&path)) {
            return false;
        }
        self.patterns.iter().any(|p| p.regex.is_match(&path))
    }

    /// With no language filters configured, every language is analyzed.
    pub fn should_analyze_language(&self, language: &str) -> bool {
        if self.language_filters.is_empty() {
            return true;
        }
        self.language_filters.contains(&language.to_lowercase())
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.source.as_str())
    }

    pub fn include_patterns(&self) -> impl Iterator<Item = &str> {
        self.include_patterns.iter().map(|p| p.source.as_str())
    }

    pub fn language_filters(&self) -> &HashSet<String> {
        &self.language_filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_node_modules_anywhere_in_tree() {
        let mut m = IgnorePatternsManager::empty();
        m.add_pattern("node_modules/", false).unwrap();
        assert!(m.should_ignore_path("src/node_modules/foo.js"));
        assert!(m.should_ignore_path("node_modules/foo.js"));
        assert!(!m.should_ignore_path("src/app.js"));
    }

    #[test]
    fn whitelist_pattern_overrides_ignore() {
        let mut m = IgnorePatternsManager::empty();
        m.add_pattern("dist/*", false).unwrap();
        m.add_pattern("dist/keep.js", true).unwrap();
        assert!(m.should_ignore_path("dist/bundle.js"));
        assert!(!m.should_ignore_path("dist/keep.js"));
    }

    #[test]
    fn glob_star_and_question_mark_expand() {
        let mut m = IgnorePatternsManager::empty();
        m.add_pattern("*.min.js", false).unwrap();
        assert!(m.should_ignore_path("vendor/jquery.min.js"));
        assert!(!m.should_ignore_path("vendor/jquery.js"));
    }

    #[test]
    fn language_filter_empty_allows_everything() {
        let m = IgnorePatternsManager::empty();
        assert!(m.should_analyze_language("rust"));
    }

    #[test]
    fn language_filter_restricts_to_listed_languages() {
        let mut m = IgnorePatternsManager::empty();
        m.add_language_filter("TypeScript");
        assert!(m.should_analyze_language("typescript"));
        assert!(!m.should_analyze_language("python"));
    }

    #[test]
    fn load_parses_comments_languages_and_includes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".graphignore"),
            "# comment\nlanguage: rust\nnode_modules/\n!node_modules/keep.rs\n",
        )
        .unwrap();
        let m = IgnorePatternsManager::load(dir.path()).unwrap();
        assert!(m.language_filters().contains("rust"));
        assert!(m.should_ignore_path("node_modules/a.js"));
        assert!(!m.should_ignore_path("node_modules/keep.rs"));
    }

    #[test]
    fn missing_graphignore_yields_empty_manager() {
        let dir = tempfile::tempdir().unwrap();
        let m = IgnorePatternsManager::load(dir.path()).unwrap();
        assert!(!m.should_ignore_path("anything.rs"));
    }
}
