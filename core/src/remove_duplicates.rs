use std::collections::{BTreeSet, HashSet};

use crate::document::DocId;
use crate::server::SearchServer;

/// Remove every document whose set of words equals that of a document with a
/// smaller id. Frequencies, ratings and statuses are ignored.
///
/// Duplicates are collected during the scan and removed afterwards. Returns
/// the removed ids in ascending order.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocId> {
    let duplicates = find_duplicates(server);
    for &document_id in &duplicates {
        tracing::info!(document_id, "found duplicate document");
        server.remove_document(document_id);
    }
    duplicates
}

fn find_duplicates(server: &SearchServer) -> Vec<DocId> {
    let mut seen: HashSet<BTreeSet<&str>> = HashSet::new();
    let mut duplicates = Vec::new();
    for document_id in server {
        let words: BTreeSet<&str> =
            server.word_frequencies(document_id).keys().map(String::as_str).collect();
        if !seen.insert(words) {
            duplicates.push(document_id);
        }
    }
    duplicates
}
