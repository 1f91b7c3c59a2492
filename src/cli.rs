use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// A multi-language source-code intelligence engine.
///
/// code-graph indexes a project into a typed code graph — files, functions,
/// classes, imports, calls — and answers navigation and analysis queries
/// against it without re-reading source on every query.
#[derive(Parser, Debug)]
#[command(
    name = "code-graph",
    version,
    about,
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for query results.
#[derive(Clone, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// Structured JSON suitable for programmatic consumption.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a project directory: discover, parse, and build the code graph.
    Analyze {
        /// Path to the project root to analyze.
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Find a symbol's definition site(s).
    Find {
        /// Symbol name to look up.
        symbol: String,

        /// Path to the project root to index and query.
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Find all references to a symbol (REFERENCES and CALLS edges).
    Refs {
        symbol: String,
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the callers of a function or method.
    Callers {
        symbol: String,
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the callees of a function or method.
    Callees {
        symbol: String,
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Report the most complex functions/methods in the project.
    Complexity {
        path: PathBuf,

        /// How many of the highest-complexity entries to show.
        #[arg(long, default_value_t = 20)]
        top: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Detect circular import dependencies (file-level).
    Circular {
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Project statistics overview.
    Stats {
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Route a graph query string to its execution target without running it.
    Route {
        /// Query text (e.g. a Cypher-shaped string) to analyze.
        query: String,
    },
}
