use serde::{Deserialize, Serialize};
use tree_sitter::{Node as TsNode, Query, QueryCursor, StreamingIterator, Tree};

use crate::graph::node::{Location, NodeKind};

/// One definition site extracted from an AST (spec §3/§4.4): a name, kind,
/// location, and cyclomatic-complexity proxy for callable kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDefinition {
    pub name: String,
    pub kind: NodeKind,
    pub location: Location,
    pub complexity: u32,
    /// Name of the nearest enclosing class/struct/trait/impl/module, when
    /// this definition is a member of one — drives the nested `class/struct
    /// → method` and `namespace/module → member` `CONTAINS` edges of spec
    /// §4.4 step 4, rather than every definition hanging flat off the File
    /// node.
    pub enclosing: Option<String>,
}

/// A raw import/use path as written in source — module resolution into a
/// graph node id happens later, in the engine, once the whole project graph
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImport {
    pub path: String,
    pub location: Location,
}

/// A call site: the name of the nearest enclosing callable (if any) and the
/// name of the thing being called. Resolved against the graph's `by_name`
/// index by the engine, since the callee may live in another file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCall {
    pub caller_name: Option<String>,
    pub callee_name: String,
    pub location: Location,
}

fn node_text<'a>(node: TsNode<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn location_for(node: TsNode, file_path: &str) -> Location {
    let start = node.start_position();
    let end = node.end_position();
    Location {
        file_path: file_path.to_string(),
        start_line: start.row + 1,
        end_line: end.row + 1,
        start_column: Some(start.column),
        end_column: Some(end.column),
    }
}

/// Branching keywords/operators counted toward the complexity proxy
/// (spec §4.9a). Deliberately language-agnostic — a coarse proxy, not a
/// precise cyclomatic-complexity calculation per language grammar.
const BRANCH_MARKERS: &[&str] = &[
    "if ", "if(", "else if", "elif", "for ", "for(", "while ", "while(", "case ", "match ",
    "catch", "except", "&&", "||", "?",
];

pub fn cyclomatic_complexity_proxy(text: &str) -> u32 {
    let mut count: u32 = 1;
    for marker in BRANCH_MARKERS {
        count += text.matches(marker).count() as u32;
    }
    count
}

fn capture_name_to_kind(capture: &str) -> Option<NodeKind> {
    match capture {
        "definition.function" => Some(NodeKind::Function),
        "definition.method" => Some(NodeKind::Method),
        "definition.class" => Some(NodeKind::Class),
        "definition.struct" => Some(NodeKind::Struct),
        "definition.interface" => Some(NodeKind::Interface),
        "definition.enum" => Some(NodeKind::Enum),
        "definition.constant" => Some(NodeKind::Constant),
        "definition.variable" => Some(NodeKind::Variable),
        "definition.module" => Some(NodeKind::Module),
        "definition.namespace" => Some(NodeKind::Namespace),
        _ => None,
    }
}

/// Node kinds that enclose other definitions and calls — used to find the
/// nearest enclosing callable for a call site, per language.
fn container_kinds(language_name: &str) -> &'static [&'static str] {
    match language_name {
        "rust" => &["function_item"],
        "typescript" | "javascript" => {
            &["function_declaration", "method_definition", "arrow_function"]
        }
        "python" => &["function_definition"],
        "go" => &["function_declaration", "method_declaration"],
        _ => &[],
    }
}

fn enclosing_callable_name(node: TsNode, language_name: &str, source: &[u8]) -> Option<String> {
    let kinds = container_kinds(language_name);
    let mut current = node.parent();
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            if let Some(name_node) = n.child_by_field_name("name") {
                return Some(node_text(name_node, source).to_string());
            }
            return None;
        }
        current = n.parent();
    }
    None
}

/// Node kinds that group member definitions under a class/struct/trait or a
/// module/namespace — used to find the nearest enclosing type/namespace for
/// a definition, per language (spec §4.4 step 4).
fn type_container_kinds(language_name: &str) -> &'static [&'static str] {
    match language_name {
        "rust" => &["impl_item", "trait_item", "mod_item"],
        "typescript" | "javascript" => &["class_declaration"],
        "python" => &["class_definition"],
        "go" => &[],
        _ => &[],
    }
}

/// Walk up from `node` to the nearest class/struct/impl/module ancestor and
/// return its name, or `None` if `node` is not nested inside one. Rust's
/// `impl_item` names its target type via a `type` field rather than `name`.
fn enclosing_container_name(node: TsNode, language_name: &str, source: &[u8]) -> Option<String> {
    let kinds = type_container_kinds(language_name);
    if kinds.is_empty() {
        return None;
    }
    let mut current = node.parent();
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            let name_node = n
                .child_by_field_name("name")
                .or_else(|| n.child_by_field_name("type"));
            return name_node.map(|nn| node_text(nn, source).to_string());
        }
        current = n.parent();
    }
    None
}

/// Run `query` over `tree` and extract definitions, imports, and calls.
/// Definition names and calls are generalized across languages by capture
/// name, not by a per-language match arm — the query itself encodes the
/// language-specific grammar shape.
pub fn extract(
    query: &Query,
    tree: &Tree,
    source: &[u8],
    language_name: &str,
    file_path: &str,
) -> (Vec<ExtractedDefinition>, Vec<ExtractedImport>, Vec<ExtractedCall>) {
    let mut definitions = Vec::new();
    let mut imports = Vec::new();
    let mut calls = Vec::new();

    let capture_names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let mut name_node: Option<TsNode> = None;
        let mut def_node: Option<TsNode> = None;
        let mut def_kind: Option<NodeKind> = None;
        let mut import_node: Option<TsNode> = None;
        let mut call_node: Option<TsNode> = None;

        for capture in m.captures {
            let capture_name = capture_names[capture.index as usize];
            match capture_name {
                "name" => name_node = Some(capture.node),
                "reference.import" => import_node = Some(capture.node),
                "reference.call" => call_node = Some(capture.node),
                other if other.starts_with("definition.") => {
                    def_node = Some(capture.node);
                    def_kind = capture_name_to_kind(other);
                }
                _ => {}
            }
        }

        if let (Some(def), Some(kind)) = (def_node, def_kind) {
            let name = name_node
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_else(|| "<anonymous>".to_string());
            let location = location_for(def, file_path);
            let complexity = if kind.is_callable() {
                cyclomatic_complexity_proxy(node_text(def, source))
            } else {
                0
            };
            let enclosing = enclosing_container_name(def, language_name, source);
            definitions.push(ExtractedDefinition {
                name,
                kind,
                location,
                complexity,
                enclosing,
            });
            continue;
        }

        if let Some(import) = import_node {
            let raw = node_text(import, source);
            let path = raw.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string();
            imports.push(ExtractedImport {
                path,
                location: location_for(import, file_path),
            });
            continue;
        }

        if let Some(call) = call_node {
            let callee_name = node_text(call, source).to_string();
            let caller_name = enclosing_callable_name(call, language_name, source);
            calls.push(ExtractedCall {
                caller_name,
                callee_name,
                location: location_for(call, file_path),
            });
        }
    }

    (definitions, imports, calls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_proxy_counts_branch_markers() {
        let simple = "fn foo() { return 1; }";
        let branchy = "fn foo() { if a { } else if b { } for x in y {} while z {} }";
        assert_eq!(cyclomatic_complexity_proxy(simple), 1);
        assert!(cyclomatic_complexity_proxy(branchy) > cyclomatic_complexity_proxy(simple));
    }
}
