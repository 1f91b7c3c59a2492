use thiserror::Error;

/// The core error taxonomy (spec §7). CLI-level plumbing wraps these in
/// `anyhow::Error` at the process boundary; internally every fallible
/// operation returns one of these variants so callers can match on them.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to parse ignore file {path}: {reason}")]
    IgnoreParseError { path: String, reason: String },

    #[error("unsupported language for extension {extension:?}")]
    UnsupportedLanguage { extension: String },

    #[error("file too large: {path} ({size} bytes, limit {limit} bytes)")]
    FileTooLarge {
        path: String,
        size: u64,
        limit: u64,
    },

    #[error("parse error in {path}: {message}")]
    ParseError {
        path: String,
        message: String,
        partial: bool,
        fatal: bool,
    },

    #[error("relationship {relationship_id} references unknown node {node_id}")]
    DanglingRelationship {
        relationship_id: String,
        node_id: String,
    },

    #[error("unknown node id {0}")]
    UnknownNode(String),

    #[error("backend unavailable: {target} ({reason})")]
    BackendUnavailable { target: String, reason: String },

    #[error("malformed query: {0}")]
    QueryMalformed(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type CoreResult<T> = Result<T, CoreError>;
