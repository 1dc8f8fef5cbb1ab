//! In-memory TF-IDF document search with plus/minus query words.

pub mod document;
pub mod error;
pub mod process_queries;
pub mod query;
pub mod remove_duplicates;
pub mod request_queue;
pub mod server;
pub mod shared;
pub mod tokenizer;

pub use document::{DocId, Document, DocumentStatus, ParseStatusError};
pub use error::{Result, SearchError};
pub use process_queries::{process_queries, process_queries_joined};
pub use remove_duplicates::remove_duplicates;
pub use request_queue::{RequestQueue, MIN_IN_DAY};
pub use server::{
    DocumentIds, ExecutionPolicy, SearchServer, MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON,
};
pub use shared::SharedSearchServer;
