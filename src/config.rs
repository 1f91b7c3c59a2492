use std::path::Path;

use serde::Deserialize;

fn default_hub_limit() -> usize {
    20
}

fn default_max_file_size_bytes() -> u64 {
    1024 * 1024
}

fn default_router_low_threshold() -> i64 {
    50
}

fn default_router_high_threshold() -> i64 {
    150
}

/// Configuration loaded from `code-graph.toml` at the project root
/// (spec ambient stack: config).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CodeGraphConfig {
    /// Additional path patterns to exclude from indexing, beyond
    /// `.graphignore` and the built-in always-skip directories.
    pub exclude: Vec<String>,
    /// How many nodes `hubs()` returns by default.
    #[serde(default = "default_hub_limit")]
    pub hub_limit: usize,
    /// Files larger than this are skipped during traversal.
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    /// Query complexity score below which a query routes in-process.
    #[serde(default = "default_router_low_threshold")]
    pub router_low_threshold: i64,
    /// Query complexity score at or above which a query routes externally
    /// unconditionally.
    #[serde(default = "default_router_high_threshold")]
    pub router_high_threshold: i64,
}

impl Default for CodeGraphConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            hub_limit: default_hub_limit(),
            max_file_size_bytes: default_max_file_size_bytes(),
            router_low_threshold: default_router_low_threshold(),
            router_high_threshold: default_router_high_threshold(),
        }
    }
}

impl CodeGraphConfig {
    /// Load configuration from `code-graph.toml` in `root`. A missing or
    /// unparseable file yields defaults with a stderr warning — this is a
    /// best-effort ambient convenience, not a hard dependency.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join("code-graph.toml");

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("warning: failed to parse code-graph.toml: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!("warning: failed to read code-graph.toml: {err}. Using defaults.");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CodeGraphConfig::load(dir.path());
        assert_eq!(config.hub_limit, 20);
        assert_eq!(config.router_low_threshold, 50);
    }

    #[test]
    fn partial_overrides_merge_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("code-graph.toml"), "hub_limit = 5\nexclude = [\"vendor/\"]\n").unwrap();
        let config = CodeGraphConfig::load(dir.path());
        assert_eq!(config.hub_limit, 5);
        assert_eq!(config.exclude, vec!["vendor/".to_string()]);
        assert_eq!(config.max_file_size_bytes, 1024 * 1024);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("code-graph.toml"), "not valid toml {{{").unwrap();
        let config = CodeGraphConfig::load(dir.path());
        assert_eq!(config.hub_limit, 20);
    }
}
