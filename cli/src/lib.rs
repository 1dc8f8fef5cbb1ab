use anyhow::{Context, Result};
use searchcore::{
    process_queries, remove_duplicates, DocId, Document, DocumentStatus, RequestQueue, SearchServer,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Falls back to this variable when `--stop-words` is not given.
pub const STOP_WORDS_ENV: &str = "SEARCH_STOP_WORDS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub status: DocumentStatus,
    pub dedup: bool,
    pub page_size: usize,
    pub json: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { status: DocumentStatus::Actual, dedup: false, page_size: 2, json: false }
    }
}

#[derive(Serialize)]
struct JsonHit<'a> {
    query: &'a str,
    #[serde(flatten)]
    document: &'a Document,
}

/// Logs the wall time of a scope when dropped.
pub struct LogDuration {
    operation: &'static str,
    start: Instant,
}

impl LogDuration {
    pub fn new(operation: &'static str) -> Self {
        Self { operation, start: Instant::now() }
    }
}

impl Drop for LogDuration {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::info!(
            operation = self.operation,
            elapsed_ms = elapsed.as_millis() as u64,
            "finished"
        );
    }
}

pub fn resolve_stop_words(arg: Option<String>) -> String {
    arg.or_else(|| std::env::var(STOP_WORDS_ENV).ok()).unwrap_or_default()
}

/// Load documents from a JSONL/JSON file, or from every such file under a directory.
pub fn load_documents(input: &Path) -> Result<Vec<InputDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            let ext = p.extension().and_then(|s| s.to_str());
            if p.is_file() && matches!(ext, Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else {
        files.push(input.to_path_buf());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("json") {
            load_json(&file, &mut docs)?;
        } else {
            load_jsonl(&file, &mut docs)?;
        }
    }
    tracing::info!(num_docs = docs.len(), input = %input.display(), "loaded documents");
    Ok(docs)
}

fn load_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    for (line_no, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed document", file.display(), line_no + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn load_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        other => docs.push(serde_json::from_value(other)?),
    }
    Ok(())
}

pub fn build_server(stop_words: &str, docs: &[InputDoc]) -> Result<SearchServer> {
    let _timer = LogDuration::new("build_server");
    let mut server = SearchServer::new(stop_words).context("invalid stop words")?;
    for doc in docs {
        server
            .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
            .with_context(|| format!("adding document {}", doc.id))?;
    }
    Ok(server)
}

/// Split results into pages of at most `page_size` items (a size of 0 is treated as 1).
pub fn paginate<T>(items: &[T], page_size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(page_size.max(1))
}

pub fn run_queries<W: Write>(
    server: &mut SearchServer,
    queries: &[String],
    opts: &QueryOptions,
    out: &mut W,
) -> Result<()> {
    if opts.dedup {
        for id in remove_duplicates(server) {
            writeln!(out, "Found duplicate document id {id}")?;
        }
    }

    let results = {
        let _timer = LogDuration::new("process_queries");
        if opts.status == DocumentStatus::Actual {
            process_queries(server, queries)?
        } else {
            queries
                .iter()
                .map(|q| server.find_top_documents_with_status(q, opts.status))
                .collect::<searchcore::Result<Vec<_>>>()?
        }
    };

    for (query, docs) in queries.iter().zip(&results) {
        if opts.json {
            for document in docs {
                writeln!(out, "{}", serde_json::to_string(&JsonHit { query, document })?)?;
            }
            continue;
        }
        writeln!(out, "Results for request: {query}")?;
        for (i, page) in paginate(docs, opts.page_size).enumerate() {
            if i > 0 {
                writeln!(out, "Page break")?;
            }
            for doc in page {
                writeln!(out, "{doc}")?;
            }
        }
    }
    Ok(())
}

pub fn run_match<W: Write>(
    server: &SearchServer,
    query: &str,
    id: DocId,
    out: &mut W,
) -> Result<()> {
    let (words, status) = server.match_document(query, id)?;
    writeln!(out, "{{ document_id = {id}, status = {status}, words = {} }}", words.join(" "))?;
    Ok(())
}

/// Feed queries through a [`RequestQueue`] and report how many came back empty.
pub fn run_stats<W: Write>(server: &SearchServer, queries: &[String], out: &mut W) -> Result<()> {
    let mut queue = RequestQueue::new(server);
    for query in queries {
        queue.add_find_request(query)?;
    }
    writeln!(out, "requests: {}, no results: {}", queue.len(), queue.no_result_requests())?;
    Ok(())
}
