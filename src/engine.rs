use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::Graph as PetGraph;
use petgraph::Directed;
use rayon::prelude::*;

use crate::cache::{ArtifactCache, CacheKey, CdcBroadcaster, CdcEvent};
use crate::config::CodeGraphConfig;
use crate::errors::{CoreError, CoreResult};
use crate::graph::edge::{Relationship, RelationshipKind};
use crate::graph::node::{Location, Node, NodeKind};
use crate::graph::{CodeGraph, Direction};
use crate::ignore_patterns::IgnorePatternsManager;
use crate::language;
use crate::parser::{self, symbols::ExtractedCall};
use crate::seam::SeamDetector;
use crate::walker::{TraversalDiagnostics, Walker};

/// Per-project rollup of node/relationship counts and derived categories
/// (spec §4.7 `project_statistics`).
#[derive(Debug, Clone)]
pub struct ProjectStatistics {
    pub node_count: usize,
    pub relationship_count: usize,
    pub nodes_by_kind: HashMap<&'static str, usize>,
    pub entry_point_count: usize,
    pub leaf_count: usize,
    pub files_parsed: usize,
    pub files_partial: usize,
    pub diagnostics: TraversalDiagnostics,
}

/// One function/method's complexity score, for ranked complexity reports.
#[derive(Debug, Clone)]
pub struct ComplexityEntry {
    pub node_id: String,
    pub name: String,
    pub complexity: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ComplexityReport {
    pub average: f64,
    pub highest: Vec<ComplexityEntry>,
}

/// A set of files forming a circular import dependency (spec §4.7
/// `dependency_analysis`).
#[derive(Debug, Clone)]
pub struct CircularDependency {
    pub file_paths: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyReport {
    pub cycles: Vec<CircularDependency>,
}

/// Wraps a [`CodeGraph`] with the orchestration the spec assigns to the
/// analysis engine (spec §4.7): parallel parsing with a single-writer
/// commit phase, cross-file name resolution for calls and imports, seam
/// detection, and the derived-query surface (`find_definition`,
/// `find_references`, `complexity_analysis`, `dependency_analysis`,
/// `project_statistics`).
pub struct AnalysisEngine {
    graph: CodeGraph,
    seam_detector: SeamDetector,
    cdc: CdcBroadcaster,
    used_ids: std::collections::HashSet<String>,
}

/// Extract the 1-indexed, inclusive line range `[start_line, end_line]` from
/// `source` — used to slice a callable definition's own textual span out of
/// its file for per-callable seam detection (spec §4.5).
fn slice_lines(source: &str, start_line: usize, end_line: usize) -> String {
    source
        .lines()
        .skip(start_line.saturating_sub(1))
        .take(end_line.saturating_sub(start_line) + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

struct FileParse {
    relative_path: String,
    language: String,
    result: parser::ParseResult,
    source: String,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            graph: CodeGraph::new(),
            seam_detector: SeamDetector::new(),
            cdc: CdcBroadcaster::new(),
            used_ids: std::collections::HashSet::new(),
        }
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    pub fn subscribe_cdc(&self) -> std::sync::mpsc::Receiver<CdcEvent> {
        self.cdc.subscribe()
    }

    /// Make a node id unique by appending `#N` on collision, per spec §3's
    /// id-disambiguation rule.
    fn disambiguate(&mut self, base_id: String) -> String {
        if self.used_ids.insert(base_id.clone()) {
            return base_id;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base_id}#{n}");
            if self.used_ids.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Walk `root`, parse every discovered file in parallel, and commit the
    /// results into the graph on a single thread (spec §5 concurrency
    /// model). Returns the resulting project statistics.
    pub fn analyze_project(
        &mut self,
        root: &Path,
        config: &CodeGraphConfig,
        ignore: &IgnorePatternsManager,
        cancel: &AtomicBool,
    ) -> CoreResult<ProjectStatistics> {
        // Re-entrant: a second call on the same engine starts from an empty
        // graph rather than doubling every node/relationship on top of the
        // previous run (spec §4.7 "idempotent").
        self.graph = CodeGraph::new();
        self.used_ids.clear();

        self.cdc.publish(CdcEvent::AnalysisStarted {
            project_root: root.display().to_string(),
        });

        let extensions = language::supported_extensions();
        let walker = Walker::new(root, ignore, &extensions, config.max_file_size_bytes);
        let (discovered, diagnostics) = walker.traverse();

        let cache = ArtifactCache::new(root);

        let parsed: Vec<Option<FileParse>> = discovered
            .par_iter()
            .map(|file| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let Ok(bytes) = std::fs::read(&file.path) else {
                    return None;
                };
                let key = CacheKey::new(&file.relative_path, &bytes);
                let (language, result) = if let Some(cached) = cache.get(&key) {
                    cached
                } else {
                    let Ok((language, result)) = parser::parse_file(&file.relative_path, &bytes)
                    else {
                        return None;
                    };
                    let _ = cache.put(&key, &language, &result);
                    (language, result)
                };
                let source = String::from_utf8_lossy(&bytes).into_owned();
                Some(FileParse {
                    relative_path: file.relative_path.clone(),
                    language,
                    result,
                    source,
                })
            })
            .collect();

        if cancel.load(Ordering::Relaxed) {
            return Err(CoreError::Cancelled);
        }

        let mut files_parsed = 0;
        let mut files_partial = 0;
        // file_path -> (definition name -> node id), for caller/import resolution.
        let mut per_file_names: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut file_languages: HashMap<String, String> = HashMap::new();
        let mut pending_calls: Vec<(String, ExtractedCall)> = Vec::new();

        for parsed_file in parsed.into_iter().flatten() {
            files_parsed += 1;
            if parsed_file.result.partial {
                files_partial += 1;
            }

            let file_id = self.disambiguate(Node::base_id(&parsed_file.relative_path, &parsed_file.relative_path, 0));
            let file_node = Node {
                id: file_id.clone(),
                name: parsed_file.relative_path.clone(),
                kind: NodeKind::File,
                language: parsed_file.language.clone(),
                location: Location::point(&parsed_file.relative_path, 0),
                complexity: 0,
                doc: None,
                metadata: serde_json::Map::new(),
            };
            self.graph.add_node(file_node);
            self.cdc.publish(CdcEvent::NodeAdded { node_id: file_id.clone() });

            let mut names = HashMap::new();
            // (node id, enclosing container name) — CONTAINS edges are wired
            // in a second pass below, once every definition in this file is
            // indexed by name, so a member can find its container whichever
            // order the two were declared in.
            let mut pending_contains: Vec<(String, Option<String>)> = Vec::new();
            let mut callable_spans: Vec<(String, Location)> = Vec::new();
            for def in &parsed_file.result.definitions {
                let base_id = Node::base_id(&parsed_file.relative_path, &def.name, def.location.start_line);
                let id = self.disambiguate(base_id);
                let mut node = Node {
                    id: id.clone(),
                    name: def.name.clone(),
                    kind: def.kind,
                    language: parsed_file.language.clone(),
                    location: def.location.clone(),
                    complexity: def.complexity,
                    doc: None,
                    metadata: serde_json::Map::new(),
                };
                if parsed_file.result.partial {
                    node.set_metadata("partial", true);
                }
                self.graph.add_node(node);
                self.cdc.publish(CdcEvent::NodeAdded { node_id: id.clone() });

                if def.kind.is_callable() {
                    callable_spans.push((id.clone(), def.location.clone()));
                }
                pending_contains.push((id.clone(), def.enclosing.clone()));
                names.insert(def.name.clone(), id);
            }

            // Nested members (class/struct -> method, namespace/module ->
            // member) attach to their enclosing type's node; everything else
            // attaches to the File node (spec §4.4 step 4).
            for (id, enclosing) in pending_contains {
                let container_id = enclosing
                    .as_ref()
                    .and_then(|name| names.get(name))
                    .cloned()
                    .unwrap_or_else(|| file_id.clone());
                let rel = Relationship::new(container_id, id, RelationshipKind::Contains);
                let rel_id = rel.id.clone();
                if self.graph.add_relationship(rel).is_ok() {
                    self.cdc.publish(CdcEvent::RelationshipAdded { relationship_id: rel_id });
                }
            }
            per_file_names.insert(parsed_file.relative_path.clone(), names);

            for import in &parsed_file.result.imports {
                let import_id = self.disambiguate(Node::base_id(
                    &parsed_file.relative_path,
                    &import.path,
                    import.location.start_line,
                ));
                let import_node = Node {
                    id: import_id.clone(),
                    name: import.path.clone(),
                    kind: NodeKind::Import,
                    language: parsed_file.language.clone(),
                    location: import.location.clone(),
                    complexity: 0,
                    doc: None,
                    metadata: serde_json::Map::new(),
                };
                self.graph.add_node(import_node);
                let rel = Relationship::new(file_id.clone(), import_id, RelationshipKind::Imports);
                let _ = self.graph.add_relationship(rel);
            }

            for call in &parsed_file.result.calls {
                pending_calls.push((parsed_file.relative_path.clone(), call.clone()));
            }
            file_languages.insert(parsed_file.relative_path.clone(), parsed_file.language.clone());

            // Seam detection: every registered (source_language, *) pair is
            // checked against each callable's own textual span, and the
            // SEAM edge is attached from that callable node — not the File
            // node — with the target qualified by the extracted endpoint
            // identifier (spec §4.5, S4: "SEAM relationship from
            // `ProcessData`").
            let seam_targets: Vec<String> = self
                .seam_detector
                .registered_seams()
                .into_iter()
                .filter(|(src, _)| *src == parsed_file.language)
                .map(|(_, target)| target)
                .collect();
            for (def_id, location) in &callable_spans {
                let span_text = slice_lines(&parsed_file.source, location.start_line, location.end_line);
                for target_language in &seam_targets {
                    let Some(endpoint) =
                        self.seam_detector
                            .detect_endpoint(&parsed_file.language, target_language, &span_text)
                    else {
                        continue;
                    };
                    let target_id = format!("external:{target_language}:{endpoint}");
                    if self.graph.get_node(&target_id).is_none() {
                        self.graph.add_node(Node {
                            id: target_id.clone(),
                            name: format!("{target_language}:{endpoint}"),
                            kind: NodeKind::Package,
                            language: target_language.clone(),
                            location: Location::point("<external>", 0),
                            complexity: 0,
                            doc: None,
                            metadata: serde_json::Map::new(),
                        });
                        self.cdc.publish(CdcEvent::NodeAdded { node_id: target_id.clone() });
                    }
                    let rel = Relationship::new(def_id.clone(), target_id, RelationshipKind::Seam);
                    let rel_id = rel.id.clone();
                    if self.graph.add_relationship(rel).is_ok() {
                        self.cdc.publish(CdcEvent::RelationshipAdded { relationship_id: rel_id });
                    }
                }
            }
        }

        // Resolve calls now that every file's definitions are indexed
        // (spec Open Question 3: same-file > same-language > any).
        for (file_path, call) in pending_calls {
            let caller_id = call
                .caller_name
                .as_ref()
                .and_then(|name| per_file_names.get(&file_path).and_then(|m| m.get(name)))
                .cloned();
            let Some(caller_id) = caller_id else { continue };

            if let Some(callee_id) = self.resolve_callee(&file_path, &call.callee_name) {
                if callee_id == caller_id {
                    continue;
                }
                let rel = Relationship::new(caller_id, callee_id, RelationshipKind::Calls);
                let rel_id = rel.id.clone();
                if self.graph.add_relationship(rel).is_ok() {
                    self.cdc.publish(CdcEvent::RelationshipAdded { relationship_id: rel_id });
                }
                continue;
            }

            // No definition anywhere matches the callee name: record a
            // placeholder Reference node and connect it by REFERENCES
            // instead of dropping the call site (spec §4.4 step 6).
            let reference_id = self.disambiguate(Node::base_id(
                &call.location.file_path,
                &call.callee_name,
                call.location.start_line,
            ));
            let reference_node = Node {
                id: reference_id.clone(),
                name: call.callee_name.clone(),
                kind: NodeKind::Reference,
                language: file_languages.get(&file_path).cloned().unwrap_or_default(),
                location: call.location.clone(),
                complexity: 0,
                doc: None,
                metadata: serde_json::Map::new(),
            };
            self.graph.add_node(reference_node);
            self.cdc.publish(CdcEvent::NodeAdded { node_id: reference_id.clone() });

            let rel = Relationship::new(caller_id, reference_id, RelationshipKind::References);
            let rel_id = rel.id.clone();
            if self.graph.add_relationship(rel).is_ok() {
                self.cdc.publish(CdcEvent::RelationshipAdded { relationship_id: rel_id });
            }
        }

        let stats = self.project_statistics(files_parsed, files_partial, diagnostics);
        self.cdc.publish(CdcEvent::AnalysisFinished {
            project_root: root.display().to_string(),
            node_count: stats.node_count,
            relationship_count: stats.relationship_count,
        });
        Ok(stats)
    }

    /// Resolve a callee name to a node id, preferring a definition in the
    /// same file, then the same language, then any match — deterministic
    /// tie-break by node id.
    fn resolve_callee(&self, file_path: &str, callee_name: &str) -> Option<String> {
        let all = self.graph.find_by_name(callee_name, true);
        if all.is_empty() {
            return None;
        }
        let callable: Vec<&Node> = all.iter().copied().filter(|n| n.kind.is_callable()).collect();
        let candidates = if callable.is_empty() { all } else { callable };

        let caller_language = candidates
            .iter()
            .find(|n| n.location.file_path == file_path)
            .map(|n| n.language.clone());

        let mut same_file: Vec<&Node> = candidates
            .iter()
            .copied()
            .filter(|n| n.location.file_path == file_path)
            .collect();
        if !same_file.is_empty() {
            same_file.sort_by(|a, b| a.id.cmp(&b.id));
            return Some(same_file[0].id.clone());
        }

        if let Some(lang) = caller_language {
            let mut same_lang: Vec<&Node> =
                candidates.iter().copied().filter(|n| n.language == lang).collect();
            if !same_lang.is_empty() {
                same_lang.sort_by(|a, b| a.id.cmp(&b.id));
                return Some(same_lang[0].id.clone());
            }
        }

        let mut any: Vec<&Node> = candidates;
        any.sort_by(|a, b| a.id.cmp(&b.id));
        any.first().map(|n| n.id.clone())
    }

    pub fn find_definition(&self, name: &str) -> Vec<&Node> {
        self.graph
            .find_by_name(name, true)
            .into_iter()
            .filter(|n| n.kind.is_definition_kind())
            .collect()
    }

    /// Union of REFERENCES and CALLS relationships targeting `node_id`
    /// (spec Open Question 2).
    pub fn find_references(&self, node_id: &str) -> Vec<&Relationship> {
        self.graph
            .relationships_to(node_id)
            .into_iter()
            .filter(|r| matches!(r.kind, RelationshipKind::References | RelationshipKind::Calls))
            .collect()
    }

    pub fn find_callers(&self, node_id: &str) -> Vec<&Node> {
        self.graph
            .neighbors(node_id, Direction::Incoming, Some(RelationshipKind::Calls))
    }

    pub fn find_callees(&self, node_id: &str) -> Vec<&Node> {
        self.graph
            .neighbors(node_id, Direction::Outgoing, Some(RelationshipKind::Calls))
    }

    pub fn complexity_analysis(&self, top_n: usize) -> ComplexityReport {
        let callables: Vec<&Node> = self
            .graph
            .nodes()
            .filter(|n| n.kind.is_callable())
            .collect();
        if callables.is_empty() {
            return ComplexityReport::default();
        }
        let total: u64 = callables.iter().map(|n| n.complexity as u64).sum();
        let average = total as f64 / callables.len() as f64;

        let mut sorted = callables;
        sorted.sort_by(|a, b| b.complexity.cmp(&a.complexity).then_with(|| a.id.cmp(&b.id)));
        let highest = sorted
            .into_iter()
            .take(top_n)
            .map(|n| ComplexityEntry {
                node_id: n.id.clone(),
                name: n.name.clone(),
                complexity: n.complexity,
            })
            .collect();

        ComplexityReport { average, highest }
    }

    /// Cycle detection over the IMPORTS subgraph of File nodes, via
    /// Kosaraju's SCC algorithm.
    pub fn dependency_analysis(&self) -> DependencyReport {
        let files: Vec<&Node> = self.graph.nodes_by_kind(NodeKind::File);

        let mut pg: PetGraph<String, (), Directed> = PetGraph::new();
        let mut id_to_index = HashMap::new();
        for file in &files {
            let idx = pg.add_node(file.id.clone());
            id_to_index.insert(file.id.clone(), idx);
        }

        for rel in self.graph.relationships_by_kind(RelationshipKind::Imports) {
            // An import edge points at an Import node, not a File node
            // directly — walk one more hop if the target resolves to a
            // file-contained definition in another file.
            if let (Some(&src), Some(target_node)) =
                (id_to_index.get(&rel.source_id), self.graph.get_node(&rel.target_id))
            {
                let target_file = &target_node.location.file_path;
                if let Some(&dst) = files
                    .iter()
                    .find(|f| &f.location.file_path == target_file)
                    .and_then(|f| id_to_index.get(&f.id))
                {
                    pg.add_edge(src, dst, ());
                }
            }
        }

        let cycles = kosaraju_scc(&pg)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut paths: Vec<String> = scc.iter().map(|&idx| pg[idx].clone()).collect();
                paths.sort();
                CircularDependency { file_paths: paths }
            })
            .collect();

        DependencyReport { cycles }
    }

    pub fn project_statistics(
        &self,
        files_parsed: usize,
        files_partial: usize,
        diagnostics: TraversalDiagnostics,
    ) -> ProjectStatistics {
        let mut nodes_by_kind: HashMap<&'static str, usize> = HashMap::new();
        for node in self.graph.nodes() {
            *nodes_by_kind.entry(node.kind.as_str()).or_insert(0) += 1;
        }

        ProjectStatistics {
            node_count: self.graph.node_count(),
            relationship_count: self.graph.relationship_count(),
            nodes_by_kind,
            entry_point_count: self.graph.entry_points().len(),
            leaf_count: self.graph.leaves().len(),
            files_parsed,
            files_partial,
            diagnostics,
        }
    }
}
