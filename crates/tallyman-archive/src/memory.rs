//! In-memory repository
//!
//! Holds documents and handles keyed by accession number and counts every
//! fetch, so callers can check how often the archive would have been hit.
//! Handles record each query they receive.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tallyman_domain::{
    DocumentRepository, FilingRef, HandleCapabilities, ParsedDocument, StructuredFact,
};
use tallyman_http::NetworkError;

use crate::ArchiveError;

/// A scripted parsed-document handle
#[derive(Debug, Clone, Default)]
pub struct MemoryHandle {
    capabilities: HandleCapabilities,
    exact: HashMap<String, Vec<StructuredFact>>,
    indexed: HashMap<String, Vec<StructuredFact>>,
    history: HashMap<String, Vec<StructuredFact>>,
    listed: Vec<StructuredFact>,
    failing: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MemoryHandle {
    /// Empty handle advertising `capabilities`
    pub fn new(capabilities: HandleCapabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Handle whose every query fails
    pub fn failing(capabilities: HandleCapabilities) -> Self {
        Self {
            capabilities,
            failing: true,
            ..Self::default()
        }
    }

    /// Answer exact-name queries for `concept` with `fact`
    pub fn with_exact(mut self, concept: &str, fact: StructuredFact) -> Self {
        self.exact.entry(concept.to_string()).or_default().push(fact);
        self
    }

    /// Answer concept-indexed queries for `concept` (any case) with `fact`
    pub fn with_indexed(mut self, concept: &str, fact: StructuredFact) -> Self {
        self.indexed
            .entry(concept.to_lowercase())
            .or_default()
            .push(fact);
        self
    }

    /// Append `fact` to the history of `concept`
    pub fn with_history(mut self, concept: &str, fact: StructuredFact) -> Self {
        self.history.entry(concept.to_string()).or_default().push(fact);
        self
    }

    /// Append `fact` to the filing-wide listing
    pub fn with_listed(mut self, fact: StructuredFact) -> Self {
        self.listed.push(fact);
        self
    }

    /// Queries received so far, as `method:concept`
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn answer(
        &self,
        method: &str,
        concept: &str,
        enabled: bool,
        source: &HashMap<String, Vec<StructuredFact>>,
        key: String,
    ) -> Result<Vec<StructuredFact>, ArchiveError> {
        self.admit(method, concept)?;
        if !enabled {
            return Ok(Vec::new());
        }
        Ok(source.get(&key).cloned().unwrap_or_default())
    }

    /// Record the call, failing if this handle is scripted to fail
    fn admit(&self, method: &str, argument: &str) -> Result<(), ArchiveError> {
        lock(&self.calls).push(format!("{}:{}", method, argument));
        if self.failing {
            return Err(ArchiveError::Network(NetworkError::GenericTransportFailure {
                url: format!("memory://handle/{}", method),
                message: "handle unavailable".to_string(),
            }));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ParsedDocument for MemoryHandle {
    type Error = ArchiveError;

    fn capabilities(&self) -> HandleCapabilities {
        self.capabilities
    }

    fn query_concept(&self, concept: &str) -> Result<Vec<StructuredFact>, ArchiveError> {
        self.answer(
            "query_concept",
            concept,
            self.capabilities.query,
            &self.exact,
            concept.to_string(),
        )
    }

    fn query_by_concept(&self, concept: &str) -> Result<Vec<StructuredFact>, ArchiveError> {
        self.answer(
            "query_by_concept",
            concept,
            self.capabilities.query,
            &self.indexed,
            concept.to_lowercase(),
        )
    }

    fn concept_history(&self, concept: &str) -> Result<Vec<StructuredFact>, ArchiveError> {
        self.answer(
            "concept_history",
            concept,
            self.capabilities.history,
            &self.history,
            concept.to_string(),
        )
    }

    fn all_facts(&self, namespace: Option<&str>) -> Result<Vec<StructuredFact>, ArchiveError> {
        self.admit("all_facts", namespace.unwrap_or("*"))?;
        if !self.capabilities.listing {
            return Ok(Vec::new());
        }
        Ok(self
            .listed
            .iter()
            .filter(|f| namespace.map_or(true, |ns| f.in_namespace(ns)))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<String, String>,
    handles: HashMap<String, MemoryHandle>,
    document_fetches: usize,
    handle_fetches: usize,
}

/// Repository serving filings from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    /// Empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the raw text of a filing
    pub fn insert_document(&self, filing: &FilingRef, text: impl Into<String>) {
        lock(&self.state)
            .documents
            .insert(filing.accession_number().to_string(), text.into());
    }

    /// Store the parsed handle of a filing
    pub fn insert_handle(&self, filing: &FilingRef, handle: MemoryHandle) {
        lock(&self.state)
            .handles
            .insert(filing.accession_number().to_string(), handle);
    }

    /// Number of document fetches so far
    pub fn document_fetches(&self) -> usize {
        lock(&self.state).document_fetches
    }

    /// Number of handle fetches so far
    pub fn handle_fetches(&self) -> usize {
        lock(&self.state).handle_fetches
    }
}

impl DocumentRepository for MemoryRepository {
    type Error = ArchiveError;
    type Handle = MemoryHandle;

    fn get_document_text(&self, filing: &FilingRef) -> Result<String, ArchiveError> {
        let mut state = lock(&self.state);
        state.document_fetches += 1;
        state
            .documents
            .get(filing.accession_number())
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(format!("document for {}", filing)))
    }

    fn parsed_handle(&self, filing: &FilingRef) -> Result<MemoryHandle, ArchiveError> {
        let mut state = lock(&self.state);
        state.handle_fetches += 1;
        state
            .handles
            .get(filing.accession_number())
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(format!("handle for {}", filing)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallyman_domain::FactValue;

    fn fact(value: f64) -> StructuredFact {
        StructuredFact {
            concept: "Assets".to_string(),
            value: FactValue::Number(value),
            unit: Some("USD".to_string()),
            context_ref: None,
            period_end: None,
            period_instant: Some("2023-09-30".to_string()),
            accession: None,
        }
    }

    fn filing() -> FilingRef {
        FilingRef::new("320193", "0000320193-23-000106").unwrap()
    }

    #[test]
    fn test_counts_fetches() {
        let repo = MemoryRepository::new();
        repo.insert_document(&filing(), "<html/>");

        assert_eq!(repo.get_document_text(&filing()).unwrap(), "<html/>");
        assert!(matches!(
            repo.parsed_handle(&filing()),
            Err(ArchiveError::NotFound(_))
        ));
        assert_eq!(repo.document_fetches(), 1);
        assert_eq!(repo.handle_fetches(), 1);
    }

    #[test]
    fn test_handle_records_calls_across_clones() {
        let handle = MemoryHandle::new(HandleCapabilities::all())
            .with_exact("Assets", fact(1.0))
            .with_indexed("Assets", fact(2.0));
        let repo = MemoryRepository::new();
        repo.insert_handle(&filing(), handle.clone());

        let served = repo.parsed_handle(&filing()).unwrap();
        assert_eq!(served.query_concept("Assets").unwrap().len(), 1);
        assert_eq!(served.query_by_concept("ASSETS").unwrap().len(), 1);
        assert!(served.concept_history("Assets").unwrap().is_empty());

        assert_eq!(
            handle.calls(),
            vec![
                "query_concept:Assets",
                "query_by_concept:ASSETS",
                "concept_history:Assets"
            ]
        );
    }

    #[test]
    fn test_disabled_capability_answers_empty() {
        let handle =
            MemoryHandle::new(HandleCapabilities::none()).with_exact("Assets", fact(1.0));
        assert!(handle.query_concept("Assets").unwrap().is_empty());
    }

    #[test]
    fn test_listing_filters_by_namespace() {
        let handle = MemoryHandle::new(HandleCapabilities::all())
            .with_listed(StructuredFact {
                concept: "us-gaap:Assets".to_string(),
                ..fact(1.0)
            })
            .with_listed(StructuredFact {
                concept: "dei:EntityCommonStockSharesOutstanding".to_string(),
                ..fact(2.0)
            });

        assert_eq!(handle.all_facts(None).unwrap().len(), 2);
        let gaap = handle.all_facts(Some("us-gaap")).unwrap();
        assert_eq!(gaap.len(), 1);
        assert_eq!(gaap[0].concept, "us-gaap:Assets");
        assert_eq!(handle.calls(), vec!["all_facts:*", "all_facts:us-gaap"]);

        let unlisted = MemoryHandle::new(HandleCapabilities::none())
            .with_listed(fact(1.0));
        assert!(unlisted.all_facts(None).unwrap().is_empty());
    }

    #[test]
    fn test_failing_handle() {
        let handle = MemoryHandle::failing(HandleCapabilities::all());
        assert!(handle.query_concept("Assets").is_err());
        assert_eq!(handle.calls().len(), 1);
    }
}
