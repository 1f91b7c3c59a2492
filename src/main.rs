mod cache;
mod cli;
mod config;
mod engine;
mod errors;
mod graph;
mod ignore_patterns;
mod language;
mod output;
mod parser;
mod query;
mod seam;
mod walker;

use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser as _;

use cli::{Cli, Commands};
use config::CodeGraphConfig;
use engine::AnalysisEngine;
use errors::CoreError;
use ignore_patterns::IgnorePatternsManager;
use query::router::QueryRouter;

const EXIT_SUCCESS: u8 = 0;
const EXIT_RUNTIME_ERROR: u8 = 1;
const EXIT_USAGE_ERROR: u8 = 2;
const EXIT_CANCELLED: u8 = 3;

/// A project path that fails basic validation before analysis even starts
/// (spec exit-code contract: usage errors are distinct from runtime ones).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct UsageError(String);

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            if let Some(CoreError::Cancelled) = err.downcast_ref::<CoreError>() {
                eprintln!("error: operation cancelled");
                return ExitCode::from(EXIT_CANCELLED);
            }
            if err.downcast_ref::<UsageError>().is_some() {
                eprintln!("error: {err:#}");
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn load_project(path: &Path) -> Result<(AnalysisEngine, engine::ProjectStatistics)> {
    if !path.is_dir() {
        return Err(UsageError(format!("not a directory: {}", path.display())).into());
    }
    let config = CodeGraphConfig::load(path);
    let ignore = IgnorePatternsManager::load(path).context("loading .graphignore")?;
    let mut engine = AnalysisEngine::new();
    let cancel = AtomicBool::new(false);
    let stats = engine
        .analyze_project(path, &config, &ignore, &cancel)
        .map_err(|e| match e {
            CoreError::Cancelled => anyhow::Error::new(CoreError::Cancelled),
            other => anyhow::Error::new(other).context("analyzing project"),
        })?;
    Ok((engine, stats))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze { path, format } => {
            let (_engine, stats) = load_project(&path)?;
            output::print_stats(&format, &stats);
        }

        Commands::Find { symbol, path, format } => {
            let (engine, _) = load_project(&path)?;
            let nodes = engine.find_definition(&symbol);
            output::print_nodes(&format, "definitions", &nodes);
        }

        Commands::Refs { symbol, path, format } => {
            let (engine, _) = load_project(&path)?;
            let defs = engine.find_definition(&symbol);
            let mut referencing = Vec::new();
            for def in &defs {
                for rel in engine.find_references(&def.id) {
                    if let Some(node) = engine.graph().get_node(&rel.source_id) {
                        referencing.push(node);
                    }
                }
            }
            output::print_nodes(&format, "references", &referencing);
        }

        Commands::Callers { symbol, path, format } => {
            let (engine, _) = load_project(&path)?;
            let defs = engine.find_definition(&symbol);
            let mut callers = Vec::new();
            for def in &defs {
                callers.extend(engine.find_callers(&def.id));
            }
            output::print_nodes(&format, "callers", &callers);
        }

        Commands::Callees { symbol, path, format } => {
            let (engine, _) = load_project(&path)?;
            let defs = engine.find_definition(&symbol);
            let mut callees = Vec::new();
            for def in &defs {
                callees.extend(engine.find_callees(&def.id));
            }
            output::print_nodes(&format, "callees", &callees);
        }

        Commands::Complexity { path, top, format } => {
            let (engine, _) = load_project(&path)?;
            let report = engine.complexity_analysis(top);
            output::print_complexity(&format, &report);
        }

        Commands::Circular { path, format } => {
            let (engine, _) = load_project(&path)?;
            let report = engine.dependency_analysis();
            output::print_dependency_report(&format, &report);
        }

        Commands::Stats { path, format } => {
            let (_engine, stats) = load_project(&path)?;
            output::print_stats(&format, &stats);
        }

        Commands::Route { query } => {
            let analyzer_defaults = CodeGraphConfig::default();
            let router = QueryRouter::new(
                analyzer_defaults.router_low_threshold,
                analyzer_defaults.router_high_threshold,
            );
            let decision = router.route(&query);
            output::print_routing_decision(&decision);
        }
    }

    Ok(())
}
