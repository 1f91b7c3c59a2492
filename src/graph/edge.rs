use serde::{Deserialize, Serialize};

/// The kind of directed relationship between two nodes (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    Calls,
    References,
    Imports,
    Inherits,
    Contains,
    Implements,
    Uses,
    Defines,
    Seam,
}

impl RelationshipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Calls => "CALLS",
            RelationshipKind::References => "REFERENCES",
            RelationshipKind::Imports => "IMPORTS",
            RelationshipKind::Inherits => "INHERITS",
            RelationshipKind::Contains => "CONTAINS",
            RelationshipKind::Implements => "IMPLEMENTS",
            RelationshipKind::Uses => "USES",
            RelationshipKind::Defines => "DEFINES",
            RelationshipKind::Seam => "SEAM",
        }
    }
}

/// A typed directed edge between two nodes (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub kind: RelationshipKind,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        kind: RelationshipKind,
    ) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        let id = format!("{source_id}->{target_id}:{}", kind.as_str());
        Self {
            id,
            source_id,
            target_id,
            kind,
            metadata: serde_json::Map::new(),
        }
    }
}
