pub mod edge;
pub mod node;

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CoreResult};
use edge::{Relationship, RelationshipKind};
use node::{Node, NodeKind};

/// Direction of traversal for [`CodeGraph::neighbors`] and [`CodeGraph::subgraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// The in-memory code graph (spec §4.6 / C6): a typed multi-relation graph
/// backed by id-keyed arenas plus the four derived indices the spec mandates.
/// Nodes and relationships are owned exclusively here — callers get clones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeGraph {
    nodes: HashMap<String, Node>,
    relationships: HashMap<String, Relationship>,

    /// name -> node ids (case-sensitive; `find_by_name(exact=true)` reads this).
    by_name: HashMap<String, HashSet<String>>,
    /// node kind -> node ids.
    by_node_kind: HashMap<NodeKind, HashSet<String>>,
    /// relationship kind -> relationship ids.
    by_rel_kind: HashMap<RelationshipKind, HashSet<String>>,
    /// node id -> relationship ids whose source is that node.
    outgoing: HashMap<String, HashSet<String>>,
    /// node id -> relationship ids whose target is that node.
    incoming: HashMap<String, HashSet<String>>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------

    /// Insert or replace a node. A replace (same id already present) first
    /// removes the prior node's index entries, then re-indexes — it does
    /// NOT cascade-remove relationships, matching "replace-update" (spec
    /// invariant 2). Callers that want the cascading semantics of a real
    /// removal should call [`CodeGraph::remove_node`] first.
    pub fn add_node(&mut self, node: Node) {
        if let Some(old) = self.nodes.get(&node.id).cloned() {
            self.deindex_node(&old);
        }
        self.index_node(&node);
        self.nodes.insert(node.id.clone(), node);
    }

    fn index_node(&mut self, node: &Node) {
        self.by_name
            .entry(node.name.clone())
            .or_default()
            .insert(node.id.clone());
        self.by_node_kind
            .entry(node.kind)
            .or_default()
            .insert(node.id.clone());
        self.outgoing.entry(node.id.clone()).or_default();
        self.incoming.entry(node.id.clone()).or_default();
    }

    fn deindex_node(&mut self, node: &Node) {
        if let Some(set) = self.by_name.get_mut(&node.name) {
            set.remove(&node.id);
        }
        if let Some(set) = self.by_node_kind.get_mut(&node.kind) {
            set.remove(&node.id);
        }
    }

    /// Remove a node and cascade: every relationship touching it is removed
    /// first (spec §4.6). No-op if `id` is unknown.
    pub fn remove_node(&mut self, id: &str) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        self.deindex_node(&node);

        let touching: Vec<String> = self
            .outgoing
            .get(id)
            .into_iter()
            .flatten()
            .chain(self.incoming.get(id).into_iter().flatten())
            .cloned()
            .collect();
        for rel_id in touching {
            self.remove_relationship(&rel_id);
        }
        self.outgoing.remove(id);
        self.incoming.remove(id);
    }

    /// Insert a relationship. Fails with [`CoreError::DanglingRelationship`]
    /// if either endpoint is absent (spec invariant 1 / §4.6 failure mode).
    pub fn add_relationship(&mut self, rel: Relationship) -> CoreResult<()> {
        if !self.nodes.contains_key(&rel.source_id) {
            return Err(CoreError::DanglingRelationship {
                relationship_id: rel.id,
                node_id: rel.source_id,
            });
        }
        if !self.nodes.contains_key(&rel.target_id) {
            return Err(CoreError::DanglingRelationship {
                relationship_id: rel.id,
                node_id: rel.target_id,
            });
        }

        self.by_rel_kind
            .entry(rel.kind)
            .or_default()
            .insert(rel.id.clone());
        self.outgoing
            .entry(rel.source_id.clone())
            .or_default()
            .insert(rel.id.clone());
        self.incoming
            .entry(rel.target_id.clone())
            .or_default()
            .insert(rel.id.clone());
        self.relationships.insert(rel.id.clone(), rel);
        Ok(())
    }

    /// Remove a relationship and deindex it. No-op if `id` is unknown.
    pub fn remove_relationship(&mut self, id: &str) {
        let Some(rel) = self.relationships.remove(id) else {
            return;
        };
        if let Some(set) = self.by_rel_kind.get_mut(&rel.kind) {
            set.remove(id);
        }
        if let Some(set) = self.outgoing.get_mut(&rel.source_id) {
            set.remove(id);
        }
        if let Some(set) = self.incoming.get_mut(&rel.target_id) {
            set.remove(id);
        }
    }

    /// Remove every node whose `location.file_path == file_path`, cascading
    /// to their relationships (spec §3 lifecycle — used before re-parsing a
    /// file, and covers the `File` node itself).
    pub fn remove_file(&mut self, file_path: &str) {
        let ids: Vec<String> = self
            .nodes
            .values()
            .filter(|n| n.location.file_path == file_path)
            .map(|n| n.id.clone())
            .collect();
        for id in ids {
            self.remove_node(&id);
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn nodes_by_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.by_node_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    pub fn relationships_by_kind(&self, kind: RelationshipKind) -> Vec<&Relationship> {
        self.by_rel_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(|id| self.relationships.get(id))
            .collect()
    }

    /// Exact lookup from `by_name`; fuzzy is a case-insensitive substring scan.
    pub fn find_by_name(&self, name: &str, exact: bool) -> Vec<&Node> {
        if exact {
            return self
                .by_name
                .get(name)
                .into_iter()
                .flatten()
                .filter_map(|id| self.nodes.get(id))
                .collect();
        }
        let needle = name.to_lowercase();
        self.nodes
            .values()
            .filter(|n| n.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn relationships_from(&self, id: &str) -> Vec<&Relationship> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|rid| self.relationships.get(rid))
            .collect()
    }

    pub fn relationships_to(&self, id: &str) -> Vec<&Relationship> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|rid| self.relationships.get(rid))
            .collect()
    }

    /// One-hop traversal, optionally filtered by relationship kind.
    pub fn neighbors(
        &self,
        id: &str,
        direction: Direction,
        kind: Option<RelationshipKind>,
    ) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut push_side = |rels: &[&Relationship], want_target: bool| {
            for r in rels {
                if let Some(k) = kind
                    && r.kind != k
                {
                    continue;
                }
                let other = if want_target { &r.target_id } else { &r.source_id };
                if seen.insert(other.clone())
                    && let Some(n) = self.nodes.get(other)
                {
                    out.push(n);
                }
            }
        };
        match direction {
            Direction::Outgoing => push_side(&self.relationships_from(id), true),
            Direction::Incoming => push_side(&self.relationships_to(id), false),
            Direction::Both => {
                push_side(&self.relationships_from(id), true);
                push_side(&self.relationships_to(id), false);
            }
        }
        out
    }

    pub fn degree(&self, id: &str) -> (usize, usize) {
        let in_degree = self.incoming.get(id).map(|s| s.len()).unwrap_or(0);
        let out_degree = self.outgoing.get(id).map(|s| s.len()).unwrap_or(0);
        (in_degree, out_degree)
    }

    /// BFS expansion up to `depth` hops in either direction from `id`
    /// (spec §4.6), returning the induced node set and all relationships
    /// with both endpoints in that set.
    pub fn subgraph(&self, id: &str, depth: usize) -> (Vec<&Node>, Vec<&Relationship>) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        if !self.nodes.contains_key(id) {
            return (Vec::new(), Vec::new());
        }
        visited.insert(id.to_string());
        queue.push_back((id.to_string(), 0));

        while let Some((current, d)) = queue.pop_front() {
            if d >= depth {
                continue;
            }
            for rel in self
                .relationships_from(&current)
                .into_iter()
                .chain(self.relationships_to(&current))
            {
                let other = if rel.source_id == current {
                    &rel.target_id
                } else {
                    &rel.source_id
                };
                if visited.insert(other.clone()) {
                    queue.push_back((other.clone(), d + 1));
                }
            }
        }

        let nodes: Vec<&Node> = visited.iter().filter_map(|i| self.nodes.get(i)).collect();
        let rels: Vec<&Relationship> = self
            .relationships
            .values()
            .filter(|r| visited.contains(&r.source_id) && visited.contains(&r.target_id))
            .collect();
        (nodes, rels)
    }

    /// Nodes with in-degree 0 and out-degree > 0 (spec glossary: entry point).
    pub fn entry_points(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| {
                let (i, o) = self.degree(&n.id);
                i == 0 && o > 0
            })
            .collect()
    }

    /// Nodes with out-degree 0 and in-degree > 0 (spec glossary: leaf).
    pub fn leaves(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| {
                let (i, o) = self.degree(&n.id);
                o == 0 && i > 0
            })
            .collect()
    }

    /// Top-`limit` nodes by combined (in+out) degree, descending; ties broken
    /// by node id for determinism.
    pub fn hubs(&self, limit: usize) -> Vec<&Node> {
        let mut scored: Vec<(&Node, usize)> = self
            .nodes
            .values()
            .map(|n| {
                let (i, o) = self.degree(&n.id);
                (n, i + o)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        scored.into_iter().take(limit).map(|(n, _)| n).collect()
    }
}
