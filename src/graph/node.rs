use serde::{Deserialize, Serialize};

/// A span of source text. `start_column`/`end_column` are best-effort — some
/// extraction paths (the regex fallback, certain tree-sitter queries that only
/// capture a name token) only know the starting line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Project-relative, forward-slash-normalized file path.
    pub file_path: String,
    /// 1-based inclusive start line.
    pub start_line: usize,
    /// 1-based inclusive end line.
    pub end_line: usize,
    /// 0-based start column, when known.
    pub start_column: Option<usize>,
    /// 0-based end column, when known.
    pub end_column: Option<usize>,
}

impl Location {
    pub fn point(file_path: impl Into<String>, line: usize) -> Self {
        Self {
            file_path: file_path.into(),
            start_line: line,
            end_line: line,
            start_column: None,
            end_column: None,
        }
    }

    pub fn span(file_path: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            file_path: file_path.into(),
            start_line,
            end_line,
            start_column: None,
            end_column: None,
        }
    }
}

/// The kind of entity a [`Node`] represents. See spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Module,
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Enum,
    Variable,
    Constant,
    Parameter,
    Import,
    Call,
    Reference,
    Namespace,
    Package,
}

impl NodeKind {
    /// Kinds `find_definition` considers — spec §4.7.
    pub fn is_definition_kind(self) -> bool {
        matches!(
            self,
            NodeKind::Function
                | NodeKind::Method
                | NodeKind::Class
                | NodeKind::Struct
                | NodeKind::Interface
                | NodeKind::Enum
                | NodeKind::Constant
                | NodeKind::Variable
        )
    }

    /// Kinds with a nonzero cyclomatic-complexity proxy — functions and methods.
    pub fn is_callable(self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Method)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Module => "module",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Struct => "struct",
            NodeKind::Enum => "enum",
            NodeKind::Variable => "variable",
            NodeKind::Constant => "constant",
            NodeKind::Parameter => "parameter",
            NodeKind::Import => "import",
            NodeKind::Call => "call",
            NodeKind::Reference => "reference",
            NodeKind::Namespace => "namespace",
            NodeKind::Package => "package",
        }
    }
}

/// A typed entity extracted from source (spec §3). Owned exclusively by
/// [`crate::graph::CodeGraph`] — callers receive clones, never mutable handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Deterministic, stable id: `"{file_path}:{name}:{start_line}"`, with a
    /// `#N` ordinal suffix appended on collision within the same file/line.
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Canonical language name, lowercase (e.g. `"typescript"`, `"rust"`).
    pub language: String,
    pub location: Location,
    /// Cyclomatic-complexity proxy; 0 for non-callable kinds.
    pub complexity: u32,
    pub doc: Option<String>,
    /// Opaque attribute bag. The graph core never inspects this.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    /// Build the deterministic id for a node before disambiguation.
    pub fn base_id(file_path: &str, name: &str, start_line: usize) -> String {
        format!("{file_path}:{name}:{start_line}")
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn partial(&self) -> bool {
        self.metadata
            .get("partial")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}
