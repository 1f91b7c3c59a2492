use serde::Serialize;

use crate::cli::OutputFormat;
use crate::engine::{ComplexityReport, DependencyReport, ProjectStatistics};
use crate::graph::node::Node;
use crate::query::router::RoutingDecision;

/// Print any serializable report either as JSON or via its `Display`-style
/// text renderer, depending on `format`.
pub fn print_report<T: Serialize>(format: &OutputFormat, value: &T, text: impl FnOnce() -> String) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
        }
        OutputFormat::Text => println!("{}", text()),
    }
}

#[derive(Serialize)]
struct NodeLocationView<'a> {
    id: &'a str,
    name: &'a str,
    kind: &'static str,
    language: &'a str,
    file: &'a str,
    line: usize,
}

fn node_view(node: &Node) -> NodeLocationView<'_> {
    NodeLocationView {
        id: &node.id,
        name: &node.name,
        kind: node.kind.as_str(),
        language: &node.language,
        file: &node.location.file_path,
        line: node.location.start_line,
    }
}

pub fn print_nodes(format: &OutputFormat, label: &str, nodes: &[&Node]) {
    let views: Vec<NodeLocationView> = nodes.iter().map(|n| node_view(n)).collect();
    print_report(format, &views, || {
        if nodes.is_empty() {
            format!("no {label} found")
        } else {
            nodes
                .iter()
                .map(|n| format!("{} ({}) — {}:{}", n.name, n.kind.as_str(), n.location.file_path, n.location.start_line))
                .collect::<Vec<_>>()
                .join("\n")
        }
    });
}

pub fn print_stats(format: &OutputFormat, stats: &ProjectStatistics) {
    #[derive(Serialize)]
    struct View<'a> {
        node_count: usize,
        relationship_count: usize,
        nodes_by_kind: &'a std::collections::HashMap<&'static str, usize>,
        entry_point_count: usize,
        leaf_count: usize,
        files_parsed: usize,
        files_partial: usize,
        pruned_dirs: usize,
        skipped_large_files: usize,
    }
    let view = View {
        node_count: stats.node_count,
        relationship_count: stats.relationship_count,
        nodes_by_kind: &stats.nodes_by_kind,
        entry_point_count: stats.entry_point_count,
        leaf_count: stats.leaf_count,
        files_parsed: stats.files_parsed,
        files_partial: stats.files_partial,
        pruned_dirs: stats.diagnostics.pruned_dirs.len(),
        skipped_large_files: stats.diagnostics.skipped_large_files.len(),
    };
    print_report(format, &view, || {
        let mut lines = vec![
            format!("files parsed: {} ({} partial)", stats.files_parsed, stats.files_partial),
            format!("nodes: {}  relationships: {}", stats.node_count, stats.relationship_count),
            format!("entry points: {}  leaves: {}", stats.entry_point_count, stats.leaf_count),
            format!(
                "pruned directories: {}  oversized files skipped: {}",
                stats.diagnostics.pruned_dirs.len(),
                stats.diagnostics.skipped_large_files.len()
            ),
        ];
        let mut kinds: Vec<_> = stats.nodes_by_kind.iter().collect();
        kinds.sort_by_key(|(k, _)| *k);
        for (kind, count) in kinds {
            lines.push(format!("  {kind}: {count}"));
        }
        lines.join("\n")
    });
}

pub fn print_complexity(format: &OutputFormat, report: &ComplexityReport) {
    #[derive(Serialize)]
    struct EntryView<'a> {
        name: &'a str,
        complexity: u32,
    }
    #[derive(Serialize)]
    struct View<'a> {
        average: f64,
        highest: Vec<EntryView<'a>>,
    }
    let view = View {
        average: report.average,
        highest: report
            .highest
            .iter()
            .map(|e| EntryView { name: &e.name, complexity: e.complexity })
            .collect(),
    };
    print_report(format, &view, || {
        let mut lines = vec![format!("average complexity: {:.2}", report.average)];
        for entry in &report.highest {
            lines.push(format!("  {} — {}", entry.name, entry.complexity));
        }
        lines.join("\n")
    });
}

pub fn print_dependency_report(format: &OutputFormat, report: &DependencyReport) {
    #[derive(Serialize)]
    struct View<'a> {
        cycles: Vec<&'a Vec<String>>,
    }
    let view = View {
        cycles: report.cycles.iter().map(|c| &c.file_paths).collect(),
    };
    print_report(format, &view, || {
        if report.cycles.is_empty() {
            "no circular dependencies found".to_string()
        } else {
            report
                .cycles
                .iter()
                .map(|c| c.file_paths.join(" -> "))
                .collect::<Vec<_>>()
                .join("\n")
        }
    });
}

pub fn print_routing_decision(decision: &RoutingDecision) {
    println!(
        "target={:?} score={} confidence={:.2} cached={} reason={}",
        decision.target, decision.estimated_complexity, decision.confidence, decision.cached, decision.reason
    );
}
