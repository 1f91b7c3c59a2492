use std::collections::HashMap;
use std::sync::Mutex;

use regex::Regex;
use std::sync::OnceLock;

/// Where a query should be evaluated (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingTarget {
    /// Answered directly against the in-memory [`crate::graph::CodeGraph`].
    InProcess,
    /// Delegated to an external graph backend better suited to expensive
    /// traversals (e.g. a graph database) — never implemented in this
    /// crate, only decided for.
    External,
}

/// Complexity analysis for one query string (spec §4.8).
#[derive(Debug, Clone)]
pub struct QueryComplexity {
    pub score: i64,
    pub is_simple: bool,
    pub is_complex: bool,
    pub requires_traversal: bool,
    pub requires_aggregation: bool,
    pub has_union: bool,
    pub depth: i64,
    pub operators: Vec<&'static str>,
}

/// A routing decision, cached by exact query string.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub target: RoutingTarget,
    pub confidence: f64,
    pub estimated_complexity: i64,
    pub reason: &'static str,
    pub cached: bool,
}

struct Patterns {
    match_clause: Regex,
    variable_length: Regex,
    depth_capture: Regex,
    directed_arrow: Regex,
    any_edge: Regex,
    and_or: Regex,
    return_clause: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        match_clause: Regex::new(r"\bMATCH\b").unwrap(),
        variable_length: Regex::new(r"\[[^\]]*\*\d+\.\.\d+[^\]]*\]").unwrap(),
        depth_capture: Regex::new(r"\[[^\]]*\*\d+\.\.(\d+)[^\]]*\]").unwrap(),
        directed_arrow: Regex::new(r"-\[.*?\]->").unwrap(),
        any_edge: Regex::new(r"-\[.*?\]-").unwrap(),
        and_or: Regex::new(r"\bAND\b|\bOR\b").unwrap(),
        return_clause: Regex::new(r"(?is)RETURN\s+(.+?)(?:ORDER|SKIP|LIMIT|$)").unwrap(),
    })
}

/// Scores a query string by additive heuristic (spec §4.8), ported verbatim
/// from the reference complexity analyzer. Operates on the query's literal
/// text — it never parses or validates query syntax.
pub struct QueryComplexityAnalyzer {
    low_threshold: i64,
    high_threshold: i64,
}

impl QueryComplexityAnalyzer {
    pub fn new(low_threshold: i64, high_threshold: i64) -> Self {
        Self {
            low_threshold,
            high_threshold,
        }
    }

    fn extract_depth(&self, query: &str) -> i64 {
        let p = patterns();
        if let Some(caps) = p.depth_capture.captures(query)
            && let Some(m) = caps.get(1)
        {
            return m.as_str().parse().unwrap_or(0);
        }
        let arrows = p.directed_arrow.find_iter(query).count() as i64;
        if arrows > 0 {
            return arrows;
        }
        p.any_edge.find_iter(query).count() as i64
    }

    pub fn analyze(&self, query: &str) -> QueryComplexity {
        let p = patterns();
        let query_upper = query.to_uppercase();
        let mut score: i64 = 0;
        let mut operators = Vec::new();

        let match_count = p.match_clause.find_iter(&query_upper).count() as i64;
        score += match_count * 20;

        let has_var_length = p.variable_length.is_match(query);
        if has_var_length {
            score += 80;
            operators.push("VARIABLE_LENGTH_PATH");
        }

        let depth = self.extract_depth(query);
        if depth > 0 {
            score += depth * 30;
        }

        let has_any_traversal = p.any_edge.is_match(query);
        if has_any_traversal {
            score += 40;
            operators.push("EDGE_TRAVERSAL");
        }

        let has_group_by = query_upper.contains("GROUP BY");
        let agg_funcs = ["COUNT", "SUM", "AVG", "MIN", "MAX", "COLLECT"];
        let has_aggregation = has_group_by || agg_funcs.iter().any(|f| query_upper.contains(f));
        if has_aggregation {
            score += 50;
            operators.push(if has_group_by { "GROUP BY" } else { "AGGREGATION" });
        }

        let has_union = query_upper.contains("UNION");
        if has_union {
            score += 40;
            operators.push("UNION");
        }

        let where_conditions = p.and_or.find_iter(&query_upper).count() as i64;
        score += where_conditions * 8;

        if query_upper.contains("ORDER BY") {
            score += 15;
            operators.push("ORDER_BY");
        }
        if query_upper.contains("SKIP") || query_upper.contains("LIMIT") {
            score += 10;
            operators.push("LIMIT");
        }

        if let Some(caps) = p.return_clause.captures(query)
            && let Some(return_clause) = caps.get(1)
            && return_clause.as_str().to_uppercase().contains("DISTINCT")
        {
            score += 20;
            operators.push("DISTINCT");
        }

        let is_simple = score < self.low_threshold;
        let is_complex = score >= self.high_threshold;

        QueryComplexity {
            score,
            is_simple,
            is_complex,
            requires_traversal: has_var_length || has_any_traversal,
            requires_aggregation: has_aggregation,
            has_union,
            depth,
            operators,
        }
    }
}

/// Routes queries to [`RoutingTarget::InProcess`] or [`RoutingTarget::External`]
/// based on [`QueryComplexityAnalyzer`] output, memoizing by exact query text.
pub struct QueryRouter {
    analyzer: QueryComplexityAnalyzer,
    low_threshold: i64,
    high_threshold: i64,
    cache: Mutex<HashMap<String, RoutingDecision>>,
}

impl QueryRouter {
    pub fn new(low_threshold: i64, high_threshold: i64) -> Self {
        Self {
            analyzer: QueryComplexityAnalyzer::new(low_threshold, high_threshold),
            low_threshold,
            high_threshold,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn route(&self, query: &str) -> RoutingDecision {
        if let Some(cached) = self.cache.lock().unwrap().get(query) {
            let mut decision = cached.clone();
            decision.cached = true;
            return decision;
        }

        let complexity = self.analyzer.analyze(query);

        let (target, confidence, reason) = if complexity.score < self.low_threshold {
            (
                RoutingTarget::InProcess,
                if complexity.is_simple { 0.95 } else { 0.8 },
                "simple query, in-process graph sufficient",
            )
        } else if complexity.score >= self.high_threshold {
            (
                RoutingTarget::External,
                0.95,
                "complex query requires an external backend",
            )
        } else {
            (
                RoutingTarget::External,
                0.7,
                "moderate complexity, routing externally for optimization",
            )
        };

        let decision = RoutingDecision {
            target,
            confidence,
            estimated_complexity: complexity.score,
            reason,
            cached: false,
        };

        self.cache
            .lock()
            .unwrap()
            .insert(query.to_string(), decision.clone());
        decision
    }
}

/// Per-target counters and a running mean complexity, observing every
/// routing decision made through a [`QueryRouter`] (spec §4.8 "metrics
/// shadow").
#[derive(Debug, Default)]
pub struct RoutingMetrics {
    total_queries: u64,
    in_process_count: u64,
    external_count: u64,
    complexity_sum: i64,
}

impl RoutingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, decision: &RoutingDecision) {
        self.total_queries += 1;
        match decision.target {
            RoutingTarget::InProcess => self.in_process_count += 1,
            RoutingTarget::External => self.external_count += 1,
        }
        self.complexity_sum += decision.estimated_complexity;
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries
    }

    pub fn in_process_count(&self) -> u64 {
        self.in_process_count
    }

    pub fn external_count(&self) -> u64 {
        self.external_count
    }

    pub fn average_complexity(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.complexity_sum as f64 / self.total_queries as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_lookup_routes_in_process() {
        let router = QueryRouter::new(50, 150);
        let decision = router.route("MATCH (n:Function {name: 'foo'}) RETURN n");
        assert_eq!(decision.target, RoutingTarget::InProcess);
        assert!(!decision.cached);
    }

    #[test]
    fn variable_length_path_routes_external() {
        let router = QueryRouter::new(50, 150);
        let query = "MATCH (a)-[:CALLS*1..5]->(b) RETURN a, b ORDER BY a.name";
        let decision = router.route(query);
        assert_eq!(decision.target, RoutingTarget::External);
    }

    #[test]
    fn repeat_query_is_served_from_cache() {
        let router = QueryRouter::new(50, 150);
        let query = "MATCH (n) RETURN n";
        let first = router.route(query);
        let second = router.route(query);
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.estimated_complexity, second.estimated_complexity);
    }

    #[test]
    fn metrics_track_counts_and_average() {
        let router = QueryRouter::new(50, 150);
        let mut metrics = RoutingMetrics::new();
        metrics.record(&router.route("MATCH (n) RETURN n"));
        metrics.record(&router.route("MATCH (a)-[:CALLS*1..5]->(b) RETURN a, b"));
        assert_eq!(metrics.total_queries(), 2);
        assert!(metrics.average_complexity() > 0.0);
    }
}
