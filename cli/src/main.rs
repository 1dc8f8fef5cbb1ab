use anyhow::Result;
use clap::{Parser, Subcommand};
use search_cli::{
    build_server, load_documents, resolve_stop_words, run_match, run_queries, run_stats,
    QueryOptions,
};
use searchcore::{DocId, DocumentStatus};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Rank documents by TF-IDF relevance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run queries against documents loaded from JSON/JSONL files or a directory
    Query {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Space-separated stop words (defaults to $SEARCH_STOP_WORDS)
        #[arg(long)]
        stop_words: Option<String>,
        /// Only return documents with this status
        #[arg(long, default_value = "actual")]
        status: DocumentStatus,
        /// Remove duplicate documents before searching
        #[arg(long, default_value_t = false)]
        dedup: bool,
        /// Results per page in human output
        #[arg(long, default_value_t = 2)]
        page_size: usize,
        /// Emit one JSON object per hit
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Queries to run; read from stdin, one per line, when omitted
        queries: Vec<String>,
    },
    /// Show which query words a single document contains
    Match {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        stop_words: Option<String>,
        /// Document id
        #[arg(long)]
        id: DocId,
        query: String,
    },
    /// Count how many queries in the last window returned nothing
    Stats {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        stop_words: Option<String>,
        queries: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Query { input, stop_words, status, dedup, page_size, json, queries } => {
            let docs = load_documents(&input)?;
            let mut server = build_server(&resolve_stop_words(stop_words), &docs)?;
            let queries = queries_or_stdin(queries)?;
            let opts = QueryOptions { status, dedup, page_size, json };
            run_queries(&mut server, &queries, &opts, &mut out)?;
        }
        Commands::Match { input, stop_words, id, query } => {
            let docs = load_documents(&input)?;
            let server = build_server(&resolve_stop_words(stop_words), &docs)?;
            run_match(&server, &query, id, &mut out)?;
        }
        Commands::Stats { input, stop_words, queries } => {
            let docs = load_documents(&input)?;
            let server = build_server(&resolve_stop_words(stop_words), &docs)?;
            let queries = queries_or_stdin(queries)?;
            run_stats(&server, &queries, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn queries_or_stdin(queries: Vec<String>) -> Result<Vec<String>> {
    if !queries.is_empty() {
        return Ok(queries);
    }
    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}
