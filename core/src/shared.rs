//! A cloneable handle that enforces single-writer / multi-reader access to a
//! [`SearchServer`] shared between threads.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use crate::document::{DocId, Document, DocumentStatus};
use crate::error::Result;
use crate::process_queries::process_queries;
use crate::remove_duplicates::remove_duplicates;
use crate::server::SearchServer;

#[derive(Debug, Clone, Default)]
pub struct SharedSearchServer {
    inner: Arc<RwLock<SearchServer>>,
}

impl SharedSearchServer {
    pub fn new(server: SearchServer) -> Self {
        Self { inner: Arc::new(RwLock::new(server)) }
    }

    /// Hold the read lock across several reads that must see the same index.
    pub fn read(&self) -> RwLockReadGuard<'_, SearchServer> {
        self.inner.read()
    }

    /// Hold the write lock; no reader runs until the guard is dropped.
    pub fn write(&self) -> RwLockWriteGuard<'_, SearchServer> {
        self.inner.write()
    }

    pub fn add_document(
        &self,
        document_id: DocId,
        document: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        self.inner.write().add_document(document_id, document, status, ratings)
    }

    pub fn remove_document(&self, document_id: DocId) -> bool {
        self.inner.write().remove_document(document_id)
    }

    pub fn remove_duplicates(&self) -> Vec<DocId> {

        remove_duplicates(&mut self.inner.write())

    }

    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.inner.read().find_top_documents(raw_query)
    }

    /// Like [`SearchServer::match_document`], but the words are owned since the
    /// lock is released on return.
    pub fn match_document(
        &self,
        raw_query: &str,
        document_id: DocId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        let (words, status) = self.inner.read().match_document(raw_query, document_id)?;
        Ok((words.into_iter().map(str::to_string).collect(), status))
    }

    pub fn process_queries<S>(&self, queries: &[S]) -> Result<Vec<Vec<Document>>>
    where
        S: AsRef<str> + Sync,
    {
        process_queries(&self.inner.read(), queries)
    }

    pub fn document_count(&self) -> usize {

        self.inner.read().document_count()

    }

    /// Unwrap the server if this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<SearchServer, Self> {
        Arc::try_unwrap(self.inner).map(RwLock::into_inner).map_err(|inner| Self { inner })
    }
}

impl From<SearchServer> for SharedSearchServer {
    fn from(server: SearchServer) -> Self {
        Self::new(server)
    }
}
