/// Black-box integration test suite. All tests invoke the compiled
/// `code-graph` binary via subprocess against small fixture projects built
/// with `tempfile::TempDir`. `CARGO_BIN_EXE_code-graph` is set automatically
/// by Cargo during `cargo test` to point at the compiled binary.
use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_code-graph"))
}

/// Run a code-graph command and assert it exits successfully. Returns stdout.
fn run_success(args: &[&str]) -> String {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke code-graph binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        out.status.success(),
        "command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
        args,
        out.status,
        stdout,
        stderr
    );
    stdout
}

/// Run a code-graph command and assert it exits with a specific status code.
/// Returns (stdout, stderr).
fn run_with_code(args: &[&str], expected_code: i32) -> (String, String) {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke code-graph binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert_eq!(
        out.status.code(),
        Some(expected_code),
        "command {:?} expected exit code {} but got {:?}\nstdout: {}\nstderr: {}",
        args,
        expected_code,
        out.status.code(),
        stdout,
        stderr
    );
    (stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("expected valid JSON output")
}

// ---------------------------------------------------------------------------
// S1: small multi-language graph — node/relationship categories
// ---------------------------------------------------------------------------

fn small_mixed_project() -> tempfile::TempDir {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let root = tmp.path();

    fs::write(
        root.join("lib.rs"),
        "pub fn helper() -> i32 { 1 }\n\npub fn main() {\n    let x = helper();\n    if x > 0 {\n        helper();\n    }\n}\n",
    )
    .unwrap();

    fs::create_dir_all(root.join("web")).unwrap();
    fs::write(
        root.join("web").join("index.ts"),
        "export function render() {\n  return 1;\n}\n",
    )
    .unwrap();

    tmp
}

#[test]
fn test_stats_reports_node_and_relationship_categories() {
    let tmp = small_mixed_project();
    let stdout = run_success(&["stats", "--format", "json", tmp.path().to_str().unwrap()]);
    let value = json(&stdout);

    assert!(value["node_count"].as_u64().unwrap() > 0);
    assert!(value["files_parsed"].as_u64().unwrap() >= 2);
    let by_kind = value["nodes_by_kind"].as_object().expect("nodes_by_kind object");
    assert!(by_kind.contains_key("file"));
    assert!(by_kind.contains_key("function"));
}

#[test]
fn test_find_locates_definitions_across_languages() {
    let tmp = small_mixed_project();
    let path = tmp.path().to_str().unwrap();

    let rust_stdout = run_success(&["find", "helper", path]);
    assert!(rust_stdout.contains("helper"));

    let ts_stdout = run_success(&["find", "render", path]);
    assert!(ts_stdout.contains("render"));
}

#[test]
fn test_callers_and_callees_resolve_same_file_call() {
    let tmp = small_mixed_project();
    let path = tmp.path().to_str().unwrap();

    let callers_stdout = run_success(&["callers", "helper", path]);
    assert!(
        callers_stdout.contains("main"),
        "helper should be called from main\nstdout: {}",
        callers_stdout
    );

    let callees_stdout = run_success(&["callees", "main", path]);
    assert!(
        callees_stdout.contains("helper"),
        "main should call helper\nstdout: {}",
        callees_stdout
    );
}

// ---------------------------------------------------------------------------
// S2: subgraph / complexity ranking
// ---------------------------------------------------------------------------

#[test]
fn test_complexity_ranks_branchy_function_above_trivial_one() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(
        tmp.path().join("a.rs"),
        "fn simple() {}\n\nfn branchy(x: i32) -> i32 {\n    if x > 0 {\n        if x > 10 {\n            return 2;\n        }\n        return 1;\n    }\n    0\n}\n",
    )
    .unwrap();

    let stdout = run_success(&["complexity", "--format", "json", tmp.path().to_str().unwrap()]);
    let value = json(&stdout);
    let highest = value["highest"].as_array().expect("highest array");
    assert!(!highest.is_empty());
    assert_eq!(highest[0]["name"], "branchy");
}

// ---------------------------------------------------------------------------
// S3: router cost model
// ---------------------------------------------------------------------------

#[test]
fn test_route_simple_query_goes_in_process() {
    let stdout = run_success(&["route", "MATCH (n:Function) RETURN n"]);
    assert!(stdout.contains("InProcess"), "stdout: {}", stdout);
}

#[test]
fn test_route_complex_query_goes_external() {
    let stdout = run_success(&[
        "route",
        "MATCH (a)-[*1..5]->(b) MATCH (c) WHERE a.x > 1 AND b.y < 2 OR c.z = 3 \
         RETURN a, count(b) ORDER BY a.x LIMIT 10 UNION MATCH (d) RETURN DISTINCT d",
    ]);
    assert!(stdout.contains("External"), "stdout: {}", stdout);
}

// ---------------------------------------------------------------------------
// S4: seam detection
// ---------------------------------------------------------------------------

#[test]
fn test_seam_detected_between_typescript_and_python_fetch_call() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(
        tmp.path().join("client.ts"),
        "export async function loadData() {\n  const res = await fetch(\"/api/python/process\");\n  return res.json();\n}\n",
    )
    .unwrap();

    let stdout = run_success(&["stats", "--format", "json", tmp.path().to_str().unwrap()]);
    let value = json(&stdout);
    let by_kind = value["nodes_by_kind"].as_object().unwrap();
    // A seam hit materializes a synthetic external Package node.
    assert!(
        by_kind.get("package").and_then(|v| v.as_u64()).unwrap_or(0) >= 1,
        "expected a synthetic external package node from seam detection\nstats: {}",
        stdout
    );
}

// ---------------------------------------------------------------------------
// S5: idempotent re-parse (same content, same ids)
// ---------------------------------------------------------------------------

#[test]
fn test_reanalyzing_unchanged_project_produces_identical_stats() {
    let tmp = small_mixed_project();
    let path = tmp.path().to_str().unwrap();

    let first = json(&run_success(&["stats", "--format", "json", path]));
    let second = json(&run_success(&["stats", "--format", "json", path]));

    assert_eq!(first["node_count"], second["node_count"]);
    assert_eq!(first["relationship_count"], second["relationship_count"]);
    assert_eq!(first["nodes_by_kind"], second["nodes_by_kind"]);
}

// ---------------------------------------------------------------------------
// S6: ignore-file pruning
// ---------------------------------------------------------------------------

#[test]
fn test_graphignore_prunes_matching_directory() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("kept.rs"), "fn kept() {}\n").unwrap();
    fs::create_dir_all(root.join("vendor")).unwrap();
    fs::write(root.join("vendor").join("dropped.rs"), "fn dropped() {}\n").unwrap();
    fs::write(root.join(".graphignore"), "vendor/\n").unwrap();

    let stdout = run_success(&["stats", "--format", "json", root.to_str().unwrap()]);
    let value = json(&stdout);
    assert_eq!(value["files_parsed"].as_u64().unwrap(), 1);

    let find_stdout = run_success(&["find", "dropped", root.to_str().unwrap()]);
    assert!(find_stdout.contains("no definitions found"));
}

#[test]
fn test_always_skip_dirs_are_never_descended_into() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("app.rs"), "fn app() {}\n").unwrap();
    fs::create_dir_all(root.join("node_modules").join("pkg")).unwrap();
    fs::write(root.join("node_modules").join("pkg").join("index.js"), "function lib() {}\n").unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join(".git").join("config.rs"), "fn ignored_in_git() {}\n").unwrap();

    let stdout = run_success(&["stats", "--format", "json", root.to_str().unwrap()]);
    let value = json(&stdout);
    assert_eq!(value["files_parsed"].as_u64().unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Exit-code contract (spec: 0 success, 1 runtime error, 2 usage error, 3 cancelled)
// ---------------------------------------------------------------------------

#[test]
fn test_nonexistent_path_is_a_usage_error() {
    let (_, stderr) = run_with_code(&["stats", "/no/such/path/at/all"], 2);
    assert!(stderr.contains("not a directory"), "stderr: {}", stderr);
}

#[test]
fn test_find_missing_symbol_reports_empty_result_not_error() {
    let tmp = small_mixed_project();
    let stdout = run_success(&["find", "zzz_nonexistent_symbol_zzz", tmp.path().to_str().unwrap()]);
    assert!(stdout.contains("no definitions found"), "stdout: {}", stdout);
}

// ---------------------------------------------------------------------------
// Circular dependency detection
// ---------------------------------------------------------------------------

#[test]
fn test_circular_reports_none_for_acyclic_project() {
    let tmp = small_mixed_project();
    let stdout = run_success(&["circular", tmp.path().to_str().unwrap()]);
    assert!(stdout.contains("no circular dependencies found"), "stdout: {}", stdout);
}
