use std::collections::HashSet;

/// Static description of one supported language (spec §4.3: language
/// registry). `ast_backed` languages are handed to the tree-sitter
/// extractors in `parser::languages`; everything else falls back to the
/// regex-based extractor in `parser::regex_fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageConfig {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub ast_backed: bool,
}

/// The full language table. AST-backed entries correspond 1:1 to the
/// tree-sitter grammars linked into this binary; the rest describe
/// languages the regex fallback still extracts coarse symbols from.
pub const LANGUAGES: &[LanguageConfig] = &[
    LanguageConfig {
        name: "typescript",
        extensions: &[".ts", ".tsx"],
        ast_backed: true,
    },
    LanguageConfig {
        name: "javascript",
        extensions: &[".js", ".jsx", ".mjs", ".cjs"],
        ast_backed: true,
    },
    LanguageConfig {
        name: "rust",
        extensions: &[".rs"],
        ast_backed: true,
    },
    LanguageConfig {
        name: "python",
        extensions: &[".py", ".pyi"],
        ast_backed: true,
    },
    LanguageConfig {
        name: "go",
        extensions: &[".go"],
        ast_backed: true,
    },
    LanguageConfig {
        name: "csharp",
        extensions: &[".cs"],
        ast_backed: false,
    },
    LanguageConfig {
        name: "java",
        extensions: &[".java"],
        ast_backed: false,
    },
    LanguageConfig {
        name: "ruby",
        extensions: &[".rb"],
        ast_backed: false,
    },
    LanguageConfig {
        name: "php",
        extensions: &[".php"],
        ast_backed: false,
    },
    LanguageConfig {
        name: "c",
        extensions: &[".c", ".h"],
        ast_backed: false,
    },
    LanguageConfig {
        name: "cpp",
        extensions: &[".cc", ".cpp", ".cxx", ".hpp", ".hh"],
        ast_backed: false,
    },
];

/// Look up a language by file extension (leading dot, lowercase).
pub fn for_extension(ext: &str) -> Option<&'static LanguageConfig> {
    let ext = ext.to_lowercase();
    LANGUAGES
        .iter()
        .find(|lang| lang.extensions.contains(&ext.as_str()))
}

/// Look up a language by canonical lowercase name.
pub fn for_name(name: &str) -> Option<&'static LanguageConfig> {
    let name = name.to_lowercase();
    LANGUAGES.iter().find(|lang| lang.name == name)
}

/// Every extension (with leading dot) this registry recognizes.
pub fn supported_extensions() -> HashSet<String> {
    LANGUAGES
        .iter()
        .flat_map(|lang| lang.extensions.iter().map(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_extensions() {
        assert_eq!(for_extension(".rs").unwrap().name, "rust");
        assert_eq!(for_extension(".TSX").unwrap().name, "typescript");
        assert!(for_extension(".unknown").is_none());
    }

    #[test]
    fn ast_backed_flag_matches_linked_grammars() {
        for name in ["typescript", "javascript", "rust", "python", "go"] {
            assert!(for_name(name).unwrap().ast_backed);
        }
        for name in ["csharp", "java", "ruby", "php", "c", "cpp"] {
            assert!(!for_name(name).unwrap().ast_backed);
        }
    }

    #[test]
    fn supported_extensions_covers_registry() {
        let exts = supported_extensions();
        assert!(exts.contains(".rs"));
        assert!(exts.contains(".py"));
        assert!(exts.contains(".java"));
    }
}
