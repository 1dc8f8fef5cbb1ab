//! The inverted index and its TF-IDF query path.
//!
//! `SearchServer` holds no locks. Reads take `&self` and may run from many
//! threads at once; `add_document` and `remove_document` take `&mut self`.
//! Callers that share one server between threads should go through
//! [`crate::SharedSearchServer`].

use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap, HashSet};

use crate::document::{DocId, Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::query::Query;
use crate::tokenizer::{is_valid_word, make_unique_non_empty_strings, split_into_words};

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
pub const RELEVANCE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    /// Fan the work out on the rayon pool.
    Parallel,
}

type WordFreqs = BTreeMap<String, f64>;
type Postings = BTreeMap<DocId, f64>;

#[derive(Debug, Clone, Copy)]
struct DocumentData {
    rating: i32,
    status: DocumentStatus,
}

/// Term -> document -> TF, plus the per-document view used for removal.
/// Both sides change only through `update`.
#[derive(Debug, Default)]
struct TermIndex {
    word_to_document_freqs: HashMap<String, Postings>,
    document_to_word_freqs: BTreeMap<DocId, WordFreqs>,
}

impl TermIndex {
    /// Replace the postings of `document_id` with `freqs` (or drop them on `None`).
    /// Returns the frequencies that were there before.
    fn update(
        &mut self,
        policy: ExecutionPolicy,
        document_id: DocId,
        freqs: Option<WordFreqs>,
    ) -> Option<WordFreqs> {
        let previous = self.document_to_word_freqs.remove(&document_id);
        if let Some(previous) = &previous {
            match policy {
                ExecutionPolicy::Sequential => {
                    for word in previous.keys() {
                        if let Some(postings) = self.word_to_document_freqs.get_mut(word) {
                            postings.remove(&document_id);
                            if postings.is_empty() {
                                self.word_to_document_freqs.remove(word);
                            }
                        }
                    }
                }
                ExecutionPolicy::Parallel => {
                    let mut touched: Vec<(String, Postings)> = previous
                        .keys()
                        .filter_map(|word| self.word_to_document_freqs.remove_entry(word))
                        .collect();
                    touched.par_iter_mut().for_each(|(_, postings)| {
                        postings.remove(&document_id);
                    });
                    self.word_to_document_freqs
                        .extend(touched.into_iter().filter(|(_, postings)| !postings.is_empty()));
                }
            }
        }
        if let Some(freqs) = freqs {
            for (word, &tf) in &freqs {
                self.word_to_document_freqs
                    .entry(word.clone())
                    .or_default()
                    .insert(document_id, tf);
            }
            self.document_to_word_freqs.insert(document_id, freqs);
        }
        previous
    }

    fn postings(&self, word: &str) -> Option<&Postings> {
        self.word_to_document_freqs.get(word)
    }

    fn word_freqs(&self, document_id: DocId) -> Option<&WordFreqs> {
        self.document_to_word_freqs.get(&document_id)
    }
}

#[derive(Debug, Default)]
pub struct SearchServer {
    stop_words: BTreeSet<String>,
    index: TermIndex,
    documents: BTreeMap<DocId, DocumentData>,
}

impl SearchServer {
    /// Build a server from a space-separated stop word list.
    pub fn new(stop_words_text: &str) -> Result<Self> {
        Self::with_stop_words(split_into_words(stop_words_text))
    }

    pub fn with_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = make_unique_non_empty_strings(stop_words);
        if let Some(bad) = stop_words.iter().find(|w| !is_valid_word(w)) {
            return Err(SearchError::invalid_content(format!(
                "stop word {bad:?} contains control characters"
            )));
        }
        Ok(Self { stop_words, ..Self::default() })
    }

    pub fn stop_words(&self) -> &BTreeSet<String> {

        &self.stop_words

    }

    pub fn add_document(
        &mut self,
        document_id: DocId,
        document: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if document_id < 0 {
            return Err(SearchError::InvalidId(document_id));
        }
        if self.documents.contains_key(&document_id) {
            return Err(SearchError::DuplicateId(document_id));
        }
        if !is_valid_word(document) {
            return Err(SearchError::invalid_content(format!(
                "document {document_id} contains control characters"
            )));
        }

        let words = self.split_into_words_no_stop(document);
        let inv_word_count = 1.0 / words.len() as f64;
        let mut freqs = WordFreqs::new();
        for word in &words {
            *freqs.entry((*word).to_string()).or_insert(0.0) += inv_word_count;
        }
        let distinct = freqs.len();
        self.index.update(ExecutionPolicy::Sequential, document_id, Some(freqs));
        self.documents
            .insert(document_id, DocumentData { rating: compute_average_rating(ratings), status });
        tracing::debug!(document_id, words = words.len(), distinct, "indexed document");
        Ok(())
    }

    /// Top documents with status `Actual`.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_with_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    pub fn find_top_documents_by<F>(&self, raw_query: &str, predicate: F) -> Result<Vec<Document>>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_policy(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    /// Same results under either policy.
    pub fn find_top_documents_policy<F>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: F,
    ) -> Result<Vec<Document>>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let mut matched = match policy {
            ExecutionPolicy::Sequential => {
                let query = Query::parse(raw_query, &self.stop_words)?;
                self.find_all_documents(&query, &predicate)
            }
            ExecutionPolicy::Parallel => {
                let query = Query::parse_raw(raw_query, &self.stop_words)?;
                self.find_all_documents_par(&query, &predicate)
            }
        };
        sort_by_relevance(&mut matched, policy);
        matched.truncate(MAX_RESULT_DOCUMENT_COUNT);
        Ok(matched)
    }

    /// Plus words of the query found in the document, or nothing if any minus word is.
    pub fn match_document<'q>(
        &self,
        raw_query: &'q str,
        document_id: DocId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        self.match_document_policy(ExecutionPolicy::Sequential, raw_query, document_id)
    }

    pub fn match_document_policy<'q>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &'q str,
        document_id: DocId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        let status = self
            .documents
            .get(&document_id)
            .map(|data| data.status)
            .ok_or(SearchError::NotFound(document_id))?;
        let word_freqs = self.word_frequencies(document_id);
        let in_document = |word: &&str| word_freqs.contains_key(*word);

        match policy {
            ExecutionPolicy::Sequential => {
                let query = Query::parse(raw_query, &self.stop_words)?;
                if query.minus_words.iter().any(in_document) {
                    return Ok((Vec::new(), status));
                }
                let matched = query.plus_words.into_iter().filter(in_document).collect();
                Ok((matched, status))
            }
            ExecutionPolicy::Parallel => {
                let query = Query::parse_raw(raw_query, &self.stop_words)?;
                if query.minus_words.par_iter().any(in_document) {
                    return Ok((Vec::new(), status));
                }
                let matched: Vec<&'q str> =
                    query.plus_words.par_iter().copied().filter(in_document).collect();
                let unique: BTreeSet<&'q str> = matched.into_iter().collect();
                Ok((unique.into_iter().collect(), status))
            }
        }
    }

    /// Drop a document and all its postings. Removing an absent id does nothing
    /// and returns `false`.
    pub fn remove_document(&mut self, document_id: DocId) -> bool {
        self.remove_document_policy(ExecutionPolicy::Sequential, document_id)
    }

    /// The parallel policy purges the document's postings on the rayon pool.
    pub fn remove_document_policy(&mut self, policy: ExecutionPolicy, document_id: DocId) -> bool {
        if self.documents.remove(&document_id).is_none() {
            return false;
        }
        let purged = self.index.update(policy, document_id, None).map_or(0, |freqs| freqs.len());
        tracing::debug!(document_id, purged, "removed document");
        true
    }

    /// Term frequencies of a document; empty for an unknown id.
    pub fn word_frequencies(&self, document_id: DocId) -> &BTreeMap<String, f64> {
        static EMPTY: BTreeMap<String, f64> = BTreeMap::new();
        self.index.word_freqs(document_id).unwrap_or(&EMPTY)
    }

    /// Number of present documents containing `word`.
    pub fn document_frequency(&self, word: &str) -> usize {
        self.index.postings(word).map_or(0, |postings| postings.len())
    }

    pub fn document_count(&self) -> usize {

        self.documents.len()

    }

    pub fn is_empty(&self) -> bool {

        self.documents.is_empty()

    }

    pub fn contains(&self, document_id: DocId) -> bool {

        self.documents.contains_key(&document_id)

    }

    /// Present document ids in ascending order.
    pub fn iter(&self) -> DocumentIds<'_> {
        DocumentIds(self.documents.keys())
    }

    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Vec<&'t str> {
        split_into_words(text)
            .into_iter()
            .filter(|word| !self.stop_words.contains(*word))
            .collect()
    }

    fn inverse_document_freq(&self, postings: &Postings) -> f64 {
        (self.document_count() as f64 / postings.len() as f64).ln()
    }

    fn find_all_documents<F>(&self, query: &Query<'_>, predicate: &F) -> Vec<Document>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.index.postings(word) else { continue };
            let idf = self.inverse_document_freq(postings);
            for (&document_id, &tf) in postings {
                let Some(data) = self.documents.get(&document_id) else { continue };
                if predicate(document_id, data.status, data.rating) {
                    *document_to_relevance.entry(document_id).or_insert(0.0) += tf * idf;
                }
            }
        }

        for word in &query.minus_words {
            let Some(postings) = self.index.postings(word) else { continue };
            for document_id in postings.keys() {
                document_to_relevance.remove(document_id);
            }
        }

        self.materialize(document_to_relevance)
    }

    fn find_all_documents_par<F>(&self, query: &Query<'_>, predicate: &F) -> Vec<Document>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let plus_words: BTreeSet<&str> = query.plus_words.iter().copied().collect();
        // Scored per word in parallel, summed in word order so relevances are
        // bit-identical to the sequential path.
        let per_word: Vec<Vec<(DocId, f64)>> = plus_words
            .par_iter()
            .filter_map(|word| self.index.postings(word))
            .map(|postings| {
                let idf = self.inverse_document_freq(postings);
                postings
                    .iter()
                    .filter(|&(&document_id, _)| {
                        self.documents
                            .get(&document_id)
                            .is_some_and(|data| predicate(document_id, data.status, data.rating))
                    })
                    .map(|(&document_id, &tf)| (document_id, tf * idf))
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut relevance: BTreeMap<DocId, f64> = BTreeMap::new();
        for (document_id, value) in per_word.into_iter().flatten() {
            *relevance.entry(document_id).or_insert(0.0) += value;
        }

        let excluded: HashSet<DocId> = query
            .minus_words
            .par_iter()
            .filter_map(|word| self.index.postings(word))
            .flat_map_iter(|postings| postings.keys().copied())
            .collect();

        self.materialize(relevance.into_iter().filter(|(id, _)| !excluded.contains(id)))
    }

    fn materialize<I>(&self, relevance: I) -> Vec<Document>
    where
        I: IntoIterator<Item = (DocId, f64)>,
    {
        relevance
            .into_iter()
            .filter_map(|(id, relevance)| {
                self.documents.get(&id).map(|data| Document::new(id, relevance, data.rating))
            })
            .collect()
    }
}

/// Ascending iterator over present document ids.
pub struct DocumentIds<'a>(btree_map::Keys<'a, DocId, DocumentData>);

impl Iterator for DocumentIds<'_> {
    type Item = DocId;

    fn next(&mut self) -> Option<DocId> {

        self.0.next().copied()

    }

    fn size_hint(&self) -> (usize, Option<usize>) {

        self.0.size_hint()

    }
}

impl DoubleEndedIterator for DocumentIds<'_> {
    fn next_back(&mut self) -> Option<DocId> {
        self.0.next_back().copied()
    }
}

impl ExactSizeIterator for DocumentIds<'_> {}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocId;
    type IntoIter = DocumentIds<'a>;

    fn into_iter(self) -> DocumentIds<'a> {

        self.iter()

    }
}

fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as i32
}

/// Descending relevance; within a run of relevances closer than
/// `RELEVANCE_EPSILON` to the run's highest, descending rating.
fn sort_by_relevance(documents: &mut [Document], policy: ExecutionPolicy) {
    let by_relevance = |l: &Document, r: &Document| r.relevance.total_cmp(&l.relevance);
    match policy {
        ExecutionPolicy::Sequential => documents.sort_by(by_relevance),
        ExecutionPolicy::Parallel => documents.par_sort_by(by_relevance),
    }

    let mut start = 0;
    while start < documents.len() {
        let mut end = start + 1;
        while end < documents.len()
            && documents[start].relevance - documents[end].relevance < RELEVANCE_EPSILON
        {
            end += 1;
        }
        documents[start..end].sort_by_key(|doc| Reverse(doc.rating));
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_with(docs: &[(DocId, &str)]) -> SearchServer {
        let mut server = SearchServer::new("and in on").unwrap();
        for &(id, text) in docs {
            server.add_document(id, text, DocumentStatus::Actual, &[1]).unwrap();
        }
        server
    }

    fn assert_consistent(server: &SearchServer) {
        let index = &server.index;
        for (word, postings) in &index.word_to_document_freqs {
            assert!(!postings.is_empty(), "empty postings left for {word}");
            for (id, tf) in postings {
                assert_eq!(index.document_to_word_freqs[id].get(word), Some(tf));
            }
        }
        for (id, freqs) in &index.document_to_word_freqs {
            assert!(server.documents.contains_key(id));
            for (word, tf) in freqs {
                assert_eq!(index.word_to_document_freqs[word].get(id), Some(tf));
            }
        }
        assert_eq!(index.document_to_word_freqs.len(), server.documents.len());
    }

    #[test]
    fn average_rating_truncates() {
        assert_eq!(compute_average_rating(&[]), 0);
        assert_eq!(compute_average_rating(&[1, 2, 3]), 2);
        assert_eq!(compute_average_rating(&[1, 2]), 1);
        assert_eq!(compute_average_rating(&[-1, -2]), -1);
        assert_eq!(compute_average_rating(&[i32::MAX, i32::MAX]), i32::MAX);
    }

    #[test]
    fn term_frequencies_sum_to_one() {
        let server = server_with(&[(1, "white cat and fancy collar cat")]);
        let freqs = server.word_frequencies(1);
        assert_eq!(freqs.len(), 4);
        assert!((freqs["cat"] - 0.4).abs() < 1e-12);
        let total: f64 = freqs.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn index_stays_consistent_through_add_and_remove() {
        let mut server = server_with(&[
            (0, "white cat and fancy collar"),
            (1, "fluffy cat fluffy tail"),
            (2, "groomed dog expressive eyes"),
        ]);
        assert_consistent(&server);

        assert!(server.remove_document(1));
        assert_consistent(&server);
        assert!(!server.index.word_to_document_freqs.contains_key("fluffy"));
        assert_eq!(server.document_frequency("cat"), 1);

        server.add_document(1, "fluffy dog", DocumentStatus::Banned, &[]).unwrap();
        assert_consistent(&server);
        assert_eq!(server.document_frequency("dog"), 2);
    }

    #[test]
    fn empty_and_stop_word_only_documents_are_stored() {
        let server = server_with(&[(3, ""), (4, "and in on")]);
        assert_eq!(server.document_count(), 2);
        assert!(server.word_frequencies(3).is_empty());
        assert!(server.word_frequencies(4).is_empty());
        assert_consistent(&server);
    }

    #[test]
    fn idf_uses_total_document_count() {
        let server = server_with(&[(0, "cat"), (1, "dog"), (2, "dog"), (3, "bird")]);
        let docs = server.find_top_documents("cat").unwrap();
        assert_eq!(docs.len(), 1);
        assert!((docs[0].relevance - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn near_equal_relevance_orders_by_rating() {
        let mut docs = vec![
            Document::new(1, 0.5, 1),
            Document::new(2, 0.5 + RELEVANCE_EPSILON / 4.0, 3),
            Document::new(3, 0.9, 0),
            Document::new(4, 0.5, 7),
        ];
        sort_by_relevance(&mut docs, ExecutionPolicy::Sequential);
        let ids: Vec<DocId> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![3, 4, 2, 1]);
    }

    #[test]
    fn chained_near_equal_steps_keep_relevance_order() {
        let step = RELEVANCE_EPSILON * 0.9;
        let mut docs = vec![
            Document::new(3, 1.0 - 2.0 * step, 3),
            Document::new(1, 1.0, 1),
            Document::new(2, 1.0 - step, 0),
        ];
        sort_by_relevance(&mut docs, ExecutionPolicy::Sequential);
        let ids: Vec<DocId> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        for pair in docs.windows(2) {
            assert!(pair[0].relevance + RELEVANCE_EPSILON > pair[1].relevance);
        }
    }

    #[test]
    fn removal_policies_leave_identical_indexes() {
        let docs = [
            (0, "white cat and fancy collar"),
            (1, "fluffy cat fluffy tail"),
            (2, "groomed dog expressive eyes"),
            (3, "cat dog tail"),
        ];
        let mut sequential = server_with(&docs);
        let mut parallel = server_with(&docs);

        for id in [1, 3, 42] {
            let removed = sequential.remove_document_policy(ExecutionPolicy::Sequential, id);
            assert_eq!(parallel.remove_document_policy(ExecutionPolicy::Parallel, id), removed);
        }
        assert_consistent(&sequential);
        assert_consistent(&parallel);
        assert_eq!(
            sequential.index.word_to_document_freqs,
            parallel.index.word_to_document_freqs
        );
        assert_eq!(
            sequential.index.document_to_word_freqs,
            parallel.index.document_to_word_freqs
        );
        assert!(!parallel.index.word_to_document_freqs.contains_key("tail"));
        assert_eq!(parallel.document_frequency("cat"), 1);
        assert_eq!(parallel.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn parallel_relevances_match_sequential_exactly() {
        let server = server_with(&[
            (0, "white cat and fancy collar"),
            (1, "fluffy cat fluffy tail"),
            (2, "groomed dog expressive eyes"),
            (3, "cat dog tail collar"),
        ]);
        let query = "cat tail dog collar fluffy cat -eyes";
        let actual = |_: DocId, status: DocumentStatus, _: i32| status == DocumentStatus::Actual;
        let seq = server
            .find_top_documents_policy(ExecutionPolicy::Sequential, query, actual)
            .unwrap();
        let par = server
            .find_top_documents_policy(ExecutionPolicy::Parallel, query, actual)
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn iteration_is_ascending() {
        let server = server_with(&[(5, "a"), (1, "b"), (3, "c")]);
        assert_eq!(server.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!((&server).into_iter().len(), 3);
        assert_eq!(server.iter().next_back(), Some(5));
    }
}
