//! Run many independent queries against one server on the rayon pool.

use rayon::prelude::*;

use crate::document::Document;
use crate::error::Result;
use crate::server::SearchServer;

/// `result[i]` holds the top documents for `queries[i]`. Fails with the error of
/// the first malformed query.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    queries
        .par_iter()
        .map(|query| server.find_top_documents(query.as_ref()))
        .collect()
}

/// All results of [`process_queries`] flattened in query order.
///
/// Scoring runs in parallel, the join is a sequential fold so the output keeps
/// query order followed by rank order.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    let per_query = process_queries(server, queries)?;
    Ok(per_query.into_iter().flatten().collect())
}
