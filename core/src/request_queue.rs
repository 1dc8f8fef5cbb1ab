use std::collections::VecDeque;

use crate::document::{DocId, Document, DocumentStatus};
use crate::error::Result;
use crate::server::SearchServer;

/// Size of the trailing window: one request per minute for a day.
pub const MIN_IN_DAY: usize = 1440;

/// Forwards queries to a [`SearchServer`] and remembers, for the last
/// [`MIN_IN_DAY`] requests, which ones came back empty.
#[derive(Debug)]
pub struct RequestQueue<'a> {
    server: &'a SearchServer,
    requests: VecDeque<bool>,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(server: &'a SearchServer) -> Self {
        Self { server, requests: VecDeque::with_capacity(MIN_IN_DAY), no_result_requests: 0 }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        let result = self.server.find_top_documents(raw_query)?;
        self.record(result.is_empty());
        Ok(result)
    }

    pub fn add_find_request_with_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        let result = self.server.find_top_documents_with_status(raw_query, status)?;
        self.record(result.is_empty());
        Ok(result)
    }

    pub fn add_find_request_by<F>(&mut self, raw_query: &str, predicate: F) -> Result<Vec<Document>>
    where
        F: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let result = self.server.find_top_documents_by(raw_query, predicate)?;
        self.record(result.is_empty());
        Ok(result)
    }

    /// Empty results among the requests currently in the window.
    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    /// Requests currently in the window.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {

        self.requests.is_empty()

    }

    fn record(&mut self, empty: bool) {
        if self.requests.len() == MIN_IN_DAY && self.requests.pop_front() == Some(true) {
            self.no_result_requests -= 1;
        }
        self.requests.push_back(empty);
        if empty {
            self.no_result_requests += 1;
        }
    }
}
