use std::sync::OnceLock;

use regex::Regex;

use crate::graph::node::{Location, NodeKind};
use crate::parser::symbols::{cyclomatic_complexity_proxy, ExtractedDefinition, ExtractedImport};

/// Regex-based extractor for languages with no tree-sitter grammar linked
/// (spec §4.4 regex fallback). Coarser than the AST path: it recognizes
/// common function/method and class/interface declaration shapes and import
/// statements by pattern, line by line, and never extracts calls — call-graph
/// edges for these languages are simply absent, which the engine treats as
/// "no data" rather than an error.
struct FallbackPatterns {
    function: Regex,
    class: Regex,
    import: Regex,
}

fn patterns_for(language_name: &str) -> &'static FallbackPatterns {
    static CSHARP: OnceLock<FallbackPatterns> = OnceLock::new();
    static JAVA: OnceLock<FallbackPatterns> = OnceLock::new();
    static RUBY: OnceLock<FallbackPatterns> = OnceLock::new();
    static PHP: OnceLock<FallbackPatterns> = OnceLock::new();
    static C_FAMILY: OnceLock<FallbackPatterns> = OnceLock::new();
    static GENERIC: OnceLock<FallbackPatterns> = OnceLock::new();

    match language_name {
        "csharp" => CSHARP.get_or_init(|| FallbackPatterns {
            function: Regex::new(
                r"(?:public|private|protected|internal|static|async|virtual|override)\s+[\w<>\[\],\s]+\s+(\w+)\s*\(",
            )
            .unwrap(),
            class: Regex::new(r"(?:public|private|internal)?\s*(?:class|interface|struct)\s+(\w+)").unwrap(),
            import: Regex::new(r"^\s*using\s+([\w.]+)\s*;").unwrap(),
        }),
        "java" => JAVA.get_or_init(|| FallbackPatterns {
            function: Regex::new(
                r"(?:public|private|protected|static|final|synchronized)\s+[\w<>\[\],\s]+\s+(\w+)\s*\([^;]*\)\s*\{",
            )
            .unwrap(),
            class: Regex::new(r"(?:public|private)?\s*(?:class|interface|enum)\s+(\w+)").unwrap(),
            import: Regex::new(r"^\s*import\s+([\w.]+)\s*;").unwrap(),
        }),
        "ruby" => RUBY.get_or_init(|| FallbackPatterns {
            function: Regex::new(r"^\s*def\s+(self\.)?(\w+[?!=]?)").unwrap(),
            class: Regex::new(r"^\s*(?:class|module)\s+(\w+)").unwrap(),
            import: Regex::new(r#"^\s*require(?:_relative)?\s+['"]([\w./-]+)['"]"#).unwrap(),
        }),
        "php" => PHP.get_or_init(|| FallbackPatterns {
            function: Regex::new(r"function\s+&?(\w+)\s*\(").unwrap(),
            class: Regex::new(r"(?:class|interface|trait)\s+(\w+)").unwrap(),
            import: Regex::new(r#"^\s*(?:require|include)(?:_once)?\s*\(?['"]([\w./-]+)['"]"#).unwrap(),
        }),
        "c" | "cpp" => C_FAMILY.get_or_init(|| FallbackPatterns {
            function: Regex::new(r"^[\w:<>*&\s]+\s+(\w+)\s*\([^;{]*\)\s*\{").unwrap(),
            class: Regex::new(r"(?:class|struct)\s+(\w+)").unwrap(),
            import: Regex::new(r#"^\s*#include\s*[<"]([\w./-]+)[>"]"#).unwrap(),
        }),
        _ => GENERIC.get_or_init(|| FallbackPatterns {
            function: Regex::new(r"function\s+(\w+)\s*\(").unwrap(),
            class: Regex::new(r"class\s+(\w+)").unwrap(),
            import: Regex::new(r#"^\s*(?:import|include|require)\s+['"]?([\w./-]+)['"]?"#).unwrap(),
        }),
    }
}

/// Extract coarse definitions and imports from `source` using line-based
/// regex matching. Every extracted node is marked `metadata["partial"] =
/// true` by the caller, since regex extraction cannot see nesting or scope.
pub fn extract(
    source: &str,
    language_name: &str,
    file_path: &str,
) -> (Vec<ExtractedDefinition>, Vec<ExtractedImport>) {
    let patterns = patterns_for(language_name);
    let mut definitions = Vec::new();
    let mut imports = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(caps) = patterns.function.captures(line) {
            let name = caps
                .get(caps.len() - 1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            if !name.is_empty() {
                definitions.push(ExtractedDefinition {
                    name,
                    kind: NodeKind::Function,
                    location: Location::point(file_path, line_no),
                    complexity: cyclomatic_complexity_proxy(line),
                    // Regex extraction sees one line at a time, with no
                    // nesting information — it can never recover an
                    // enclosing class/namespace name.
                    enclosing: None,
                });
            }
        }

        if let Some(caps) = patterns.class.captures(line) {
            if let Some(name) = caps.get(1) {
                definitions.push(ExtractedDefinition {
                    name: name.as_str().to_string(),
                    kind: NodeKind::Class,
                    location: Location::point(file_path, line_no),
                    complexity: 0,
                    enclosing: None,
                });
            }
        }

        if let Some(caps) = patterns.import.captures(line)
            && let Some(path) = caps.get(1)
        {
            imports.push(ExtractedImport {
                path: path.as_str().to_string(),
                location: Location::point(file_path, line_no),
            });
        }
    }

    (definitions, imports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_java_method_and_import() {
        let src = "import java.util.List;\npublic class Foo {\n  public void bar() {\n  }\n}\n";
        let (defs, imports) = extract(src, "java", "Foo.java");
        assert!(defs.iter().any(|d| d.name == "bar" && d.kind == NodeKind::Function));
        assert!(defs.iter().any(|d| d.name == "Foo" && d.kind == NodeKind::Class));
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].path, "java.util.List");
    }

    #[test]
    fn extracts_ruby_def_and_require() {
        let src = "require 'json'\nclass Widget\n  def render\n  end\nend\n";
        let (defs, imports) = extract(src, "ruby", "widget.rb");
        assert!(defs.iter().any(|d| d.name == "render"));
        assert!(defs.iter().any(|d| d.name == "Widget" && d.kind == NodeKind::Class));
        assert_eq!(imports[0].path, "json");
    }
}
