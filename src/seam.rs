use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Matches a URL literal appearing anywhere in a matched span — the
/// preferred canonical endpoint identifier when one is present (spec §4.5:
/// "a canonical endpoint identifier extracted from the match (URL, driver
/// name)").
fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r#"https?://[^\s"'`)]+"#).unwrap())
}

/// Detects cross-language call seams: places where code in one language
/// plausibly invokes a runtime written in another (spec §4.5). Ported
/// verbatim from the reference seam table — six source/target pairs, each
/// with a handful of case-insensitive textual fingerprints — and extensible
/// at runtime via [`SeamDetector::add_pattern`].
pub struct SeamDetector {
    patterns: HashMap<(String, String), Vec<Regex>>,
}

impl Default for SeamDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SeamDetector {
    pub fn new() -> Self {
        let mut patterns: HashMap<(String, String), Vec<Regex>> = HashMap::new();

        let seed: &[(&str, &str, &[&str])] = &[
            (
                "csharp",
                "node",
                &["HttpClient", "PostAsync", "RestClient", "npm", "node.*service"],
            ),
            (
                "csharp",
                "sql",
                &["SqlConnection", "SqlCommand", "DbContext", "ExecuteReader", "ExecuteNonQuery"],
            ),
            (
                "typescript",
                "python",
                &["fetch", "axios", "XMLHttpRequest", "api"],
            ),
            (
                "typescript",
                "node",
                &["import.*from", "require", "@angular", "@nestjs", "express"],
            ),
            (
                "python",
                "java",
                &["subprocess", "socket", "grpc", "requests"],
            ),
            (
                "python",
                "sql",
                &["sqlite3", "psycopg2", "pymysql", "execute"],
            ),
        ];

        for (source, target, raw_patterns) in seed {
            let key = (source.to_string(), target.to_string());
            let compiled = raw_patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("(?i){p}")).expect("seam seed pattern must be valid regex")
                })
                .collect();
            patterns.insert(key, compiled);
        }

        Self { patterns }
    }

    /// Returns `true` if `code_content` matches any registered fingerprint
    /// for the `(source_language, target_language)` pair. Unregistered pairs
    /// always return `false` — this is a denylist-free allowlist of known
    /// architectures, not a general heuristic.
    pub fn detect(&self, source_language: &str, target_language: &str, code_content: &str) -> bool {
        let key = (source_language.to_lowercase(), target_language.to_lowercase());
        match self.patterns.get(&key) {
            Some(patterns) => patterns.iter().any(|p| p.is_match(code_content)),
            None => false,
        }
    }

    /// Like [`SeamDetector::detect`], but on a match also returns a canonical
    /// endpoint identifier extracted from `code_content` (spec §4.5): a URL
    /// literal if one is present in the matched span, otherwise the matched
    /// fingerprint text itself (e.g. a driver/client name such as
    /// `SqlConnection` or `sqlite3`).
    pub fn detect_endpoint(
        &self,
        source_language: &str,
        target_language: &str,
        code_content: &str,
    ) -> Option<String> {
        let key = (source_language.to_lowercase(), target_language.to_lowercase());
        let patterns = self.patterns.get(&key)?;
        for pattern in patterns {
            if let Some(m) = pattern.find(code_content) {
                if let Some(url) = url_pattern().find(code_content) {
                    return Some(url.as_str().to_string());
                }
                return Some(m.as_str().to_string());
            }
        }
        None
    }

    /// Register an additional fingerprint for a (possibly new) language
    /// pair at runtime. A malformed `pattern` is silently dropped — callers
    /// that need to surface the error should validate with `Regex::new`
    /// themselves beforehand.
    pub fn add_pattern(&mut self, source_language: &str, target_language: &str, pattern: &str) {
        let Ok(compiled) = Regex::new(&format!("(?i){pattern}")) else {
            return;
        };
        let key = (source_language.to_lowercase(), target_language.to_lowercase());
        self.patterns.entry(key).or_default().push(compiled);
    }

    pub fn registered_seams(&self) -> Vec<(String, String)> {
        self.patterns.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_csharp_to_node_seam() {
        let detector = SeamDetector::new();
        assert!(detector.detect("csharp", "node", "var client = new HttpClient();"));
        assert!(!detector.detect("csharp", "node", "var x = 1 + 2;"));
    }

    #[test]
    fn unregistered_pair_never_matches() {
        let detector = SeamDetector::new();
        assert!(!detector.detect("rust", "go", "anything at all"));
    }

    #[test]
    fn runtime_pattern_addition_is_observable() {
        let mut detector = SeamDetector::new();
        detector.add_pattern("rust", "python", "PyO3");
        assert!(detector.detect("rust", "python", "use pyo3::prelude::*;"));
        assert!(detector.registered_seams().contains(&("rust".to_string(), "python".to_string())));
    }

    #[test]
    fn seed_table_has_six_pairs() {
        let detector = SeamDetector::new();
        assert_eq!(detector.registered_seams().len(), 6);
    }

    #[test]
    fn endpoint_extraction_prefers_url_over_fingerprint() {
        let detector = SeamDetector::new();
        let endpoint = detector
            .detect_endpoint(
                "csharp",
                "node",
                r#"var client = new HttpClient(); client.PostAsync("http://node-service/api", body);"#,
            )
            .expect("seam should match");
        assert_eq!(endpoint, "http://node-service/api");
    }

    #[test]
    fn endpoint_extraction_falls_back_to_driver_name() {
        let detector = SeamDetector::new();
        let endpoint = detector
            .detect_endpoint("csharp", "sql", "var conn = new SqlConnection(connStr);")
            .expect("seam should match");
        assert_eq!(endpoint, "SqlConnection");
    }
}
