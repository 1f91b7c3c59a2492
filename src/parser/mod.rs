pub mod languages;
pub mod queries;
pub mod regex_fallback;
pub mod symbols;

use std::cell::RefCell;
use std::collections::HashMap;

use tree_sitter::Parser;

use crate::errors::{CoreError, CoreResult};
use crate::language;
use symbols::{ExtractedCall, ExtractedDefinition, ExtractedImport};

/// The result of parsing a single source file (spec §4.4): every definition,
/// import, and call site found, plus whether extraction was partial (regex
/// fallback, or a tree-sitter parse that produced error nodes).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ParseResult {
    pub definitions: Vec<ExtractedDefinition>,
    pub imports: Vec<ExtractedImport>,
    pub calls: Vec<ExtractedCall>,
    pub partial: bool,
}

// One Parser per rayon worker thread per AST-backed language — avoids lock
// contention and repeated grammar setup across files on the same thread.
thread_local! {
    static PARSERS: RefCell<HashMap<&'static str, Parser>> = RefCell::new(HashMap::new());
}

fn with_parser<R>(
    language_name: &'static str,
    is_tsx_variant: bool,
    f: impl FnOnce(&mut Parser) -> R,
) -> Option<R> {
    let language = languages::language_for(language_name, is_tsx_variant)?;
    let key = if is_tsx_variant { "typescript-tsx" } else { language_name };
    PARSERS.with(|cell| {
        let mut map = cell.borrow_mut();
        let parser = map.entry(key).or_insert_with(|| {
            let mut p = Parser::new();
            p.set_language(&language).expect("tree-sitter language set failed");
            p
        });
        Some(f(parser))
    })
}

/// Parse one file's contents and extract its definitions, imports, and call
/// sites. `relative_path` is used both for language detection (by
/// extension) and as the `file_path` baked into every extracted
/// [`crate::graph::node::Location`].
///
/// Never returns [`CoreError::ParseError`] for a language-level parse
/// failure — tree-sitter always yields a tree (possibly containing ERROR
/// nodes), and an unsupported extension falls back to the regex extractor
/// rather than failing outright (spec §4.4 "AST-grep-style pattern set …
/// regex fallback"). The only hard failure is a source buffer that is not
/// valid UTF-8.
pub fn parse_file(relative_path: &str, source: &[u8]) -> CoreResult<(String, ParseResult)> {
    let extension = std::path::Path::new(relative_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .ok_or_else(|| CoreError::UnsupportedLanguage {
            extension: String::new(),
        })?;

    let Some(config) = language::for_extension(&extension) else {
        return Err(CoreError::UnsupportedLanguage { extension });
    };

    let text = std::str::from_utf8(source).map_err(|e| CoreError::ParseError {
        path: relative_path.to_string(),
        message: format!("invalid UTF-8: {e}"),
        partial: false,
        fatal: true,
    })?;

    if !config.ast_backed {
        let (definitions, imports) = regex_fallback::extract(text, config.name, relative_path);
        return Ok((
            config.name.to_string(),
            ParseResult {
                definitions,
                imports,
                calls: Vec::new(),
                partial: true,
            },
        ));
    }

    let is_tsx_variant = extension == ".tsx";
    let language_name: &'static str = match config.name {
        "typescript" => "typescript",
        "javascript" => "javascript",
        "rust" => "rust",
        "python" => "python",
        "go" => "go",
        other => unreachable!("ast_backed language without grammar dispatch: {other}"),
    };

    let tree = with_parser(language_name, is_tsx_variant, |parser| parser.parse(source, None))
        .flatten();

    let Some(tree) = tree else {
        return Err(CoreError::ParseError {
            path: relative_path.to_string(),
            message: "tree-sitter returned no parse tree".to_string(),
            partial: false,
            fatal: true,
        });
    };

    let has_errors = tree.root_node().has_error();
    let language = languages::language_for(language_name, is_tsx_variant).expect("checked above");
    let query = queries::query_for(language_name, &language, is_tsx_variant);
    let (definitions, imports, calls) =
        symbols::extract(query, &tree, source, language_name, relative_path);

    Ok((
        config.name.to_string(),
        ParseResult {
            definitions,
            imports,
            calls,
            partial: has_errors,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rust_function_and_call() {
        let src = b"fn helper() {}\nfn main() { helper(); }\n";
        let (lang, result) = parse_file("lib.rs", src).unwrap();
        assert_eq!(lang, "rust");
        assert!(result.definitions.iter().any(|d| d.name == "helper"));
        assert!(result.definitions.iter().any(|d| d.name == "main"));
        assert!(result.calls.iter().any(|c| c.callee_name == "helper"));
        assert!(!result.partial);
    }

    #[test]
    fn parses_typescript_vs_tsx_grammar() {
        let ts_src = b"function f<T>(x: T): T { return x; }\n";
        let (lang, result) = parse_file("a.ts", ts_src).unwrap();
        assert_eq!(lang, "typescript");
        assert!(result.definitions.iter().any(|d| d.name == "f"));
    }

    #[test]
    fn falls_back_to_regex_for_unsupported_grammar() {
        let src = b"public class Widget {\n  public void render() {}\n}\n";
        let (lang, result) = parse_file("Widget.java", src).unwrap();
        assert_eq!(lang, "java");
        assert!(result.partial);
        assert!(result.definitions.iter().any(|d| d.name == "Widget"));
    }

    #[test]
    fn unknown_extension_is_unsupported_language() {
        let err = parse_file("README", b"hello").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedLanguage { .. }));
    }

    #[test]
    fn method_definition_records_enclosing_class_name() {
        let src = b"class Widget {\n  render() {\n    return 1;\n  }\n}\n";
        let (_, result) = parse_file("widget.ts", src).unwrap();
        let render = result
            .definitions
            .iter()
            .find(|d| d.name == "render")
            .expect("render method");
        assert_eq!(render.enclosing.as_deref(), Some("Widget"));

        let class = result
            .definitions
            .iter()
            .find(|d| d.name == "Widget")
            .expect("Widget class");
        assert_eq!(class.enclosing, None);
    }

    /// The AST path (`symbols::extract`, run against a function's body
    /// subtree) and the regex-fallback path (`regex_fallback::extract`, run
    /// line-by-line against raw text) both score complexity by calling the
    /// same `cyclomatic_complexity_proxy` — so the same branchy body text
    /// must score identically down either route.
    #[test]
    fn complexity_proxy_agrees_between_ast_and_fallback_routes() {
        let branchy_body = "fn branchy(x: i32) -> i32 { if x > 0 { if x > 10 { return 2; } return 1; } 0 }";

        let (_, ast_result) = parse_file("a.rs", branchy_body.as_bytes()).unwrap();
        let ast_complexity = ast_result
            .definitions
            .iter()
            .find(|d| d.name == "branchy")
            .expect("branchy definition")
            .complexity;

        let direct = symbols::cyclomatic_complexity_proxy(branchy_body);
        assert_eq!(ast_complexity, direct);
    }
}
