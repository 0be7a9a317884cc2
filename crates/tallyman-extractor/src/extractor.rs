//! Core Extractor implementation
//!
//! Resolution strategies, in order, stopping at the first hit:
//!
//! 1. direct pattern extraction over the raw filing text;
//! 2. structured query against the parsed handle (exact name, then the
//!    concept-indexed lookup);
//! 3. the most recent entry of the handle's concept history.
//!
//! A failing strategy is logged and treated as "nothing found". No concept
//! lookup ever returns an error: absence is `None`.

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

use tallyman_domain::catalog::{all_concepts, concepts_for};
use tallyman_domain::{
    DocumentRepository, ExtractedFact, FactSource, FilingRef, ParsedDocument, StatementFamily,
    StructuredFact,
};
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::matcher::{ConceptMatcher, TaggedDocument};
use crate::normalize::PlaceholderPolicy;
use crate::types::{ConceptDiscovery, ConceptListing, ConceptSummary};

/// Resolves financial concepts from filings held by a repository
#[derive(Debug)]
pub struct FactExtractor<R>
where
    R: DocumentRepository,
{
    repository: R,
    config: ExtractorConfig,
    matcher: ConceptMatcher,
}

impl<R> FactExtractor<R>
where
    R: DocumentRepository,
{
    /// Create a new extractor
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Config` if the configuration is invalid.
    pub fn new(repository: R, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let matcher = ConceptMatcher::new(
            PlaceholderPolicy::new(&config.placeholder_sentinels),
            config.default_unit.clone(),
        );
        Ok(Self {
            repository,
            config,
            matcher,
        })
    }

    /// Create an extractor with the default configuration
    pub fn with_defaults(repository: R) -> Self {
        let config = ExtractorConfig::default();
        let matcher = ConceptMatcher::new(
            PlaceholderPolicy::new(&config.placeholder_sentinels),
            config.default_unit.clone(),
        );
        Self {
            repository,
            config,
            matcher,
        }
    }

    /// Underlying repository
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Resolve one concept in one filing
    pub fn extract_concept(&self, filing: &FilingRef, concept: &str) -> Option<ExtractedFact> {
        let concept = concept.trim();
        if concept.is_empty() {
            return None;
        }
        FilingSession::new(self, filing).resolve(concept)
    }

    /// Resolve an explicit list of concepts in one filing
    ///
    /// The filing text and the parsed handle are each fetched at most once
    /// for the whole list. Blank and repeated names are ignored.
    pub fn extract_concepts<S: AsRef<str>>(
        &self,
        filing: &FilingRef,
        concepts: &[S],
    ) -> ConceptDiscovery {
        let session = FilingSession::new(self, filing);
        let mut seen = HashSet::new();
        let mut discovery = ConceptDiscovery::default();

        for concept in concepts.iter().map(|c| c.as_ref().trim()) {
            if concept.is_empty() || !seen.insert(concept) {
                continue;
            }
            discovery.record(concept, session.resolve(concept));
        }

        info!(
            filing = %filing,
            requested = seen.len(),
            resolved = discovery.count,
            "Bulk extraction complete"
        );
        discovery
    }

    /// Resolve every catalogued concept in one filing
    pub fn get_all_financial_concepts(&self, filing: &FilingRef) -> ConceptDiscovery {
        self.extract_concepts(filing, &all_concepts())
    }

    /// Resolve the catalogued concepts of one statement family
    pub fn discover_statement_concepts(
        &self,
        filing: &FilingRef,
        family: StatementFamily,
    ) -> ConceptDiscovery {
        debug!(filing = %filing, family = %family, "Discovering statement concepts");
        self.extract_concepts(filing, &concepts_for(family))
    }

    /// List every concept the filing's structured view reports
    ///
    /// Facts are grouped by qualified concept name in first-reported order.
    /// Each summary carries the concept's latest value (greatest period,
    /// later entries winning ties) and how many facts it has. A handle
    /// without a listing, or one that fails, yields an empty listing.
    pub fn discover_xbrl_concepts(
        &self,
        filing: &FilingRef,
        namespace: Option<&str>,
    ) -> ConceptListing {
        let namespace = namespace.map(str::trim).filter(|ns| !ns.is_empty());
        let mut listing = ConceptListing {
            namespace: namespace.map(str::to_string),
            ..ConceptListing::default()
        };

        let session = FilingSession::new(self, filing);
        let Some(handle) = session.handle() else {
            return listing;
        };
        if !handle.capabilities().listing {
            debug!(filing = %filing, "Handle has no fact listing, skipping");
            return listing;
        }
        let facts = match handle.all_facts(namespace) {
            Ok(facts) => facts,
            Err(e) => {
                warn!(filing = %filing, error = %e, "Fact listing failed");
                return listing;
            }
        };

        listing.total_facts = facts.len();
        let mut groups: Vec<(StructuredFact, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for fact in facts {
            match positions.get(&fact.concept) {
                Some(&i) => {
                    let (latest, count) = &mut groups[i];
                    *count += 1;
                    if fact.period() >= latest.period() {
                        *latest = fact;
                    }
                }
                None => {
                    positions.insert(fact.concept.clone(), groups.len());
                    groups.push((fact, 1));
                }
            }
        }

        listing.concepts = groups
            .into_iter()
            .map(|(latest, count)| {
                let concept = latest.concept.clone();
                ConceptSummary {
                    latest: latest.into_extracted(&concept, FactSource::StructuredQuery),
                    concept,
                    count,
                }
            })
            .collect();

        info!(
            filing = %filing,
            facts = listing.total_facts,
            concepts = listing.concepts.len(),
            "Concept listing complete"
        );
        listing
    }

    /// Direct pattern extraction over already-fetched filing text
    pub fn extract_from_text(&self, document: &str, concept: &str) -> Option<ExtractedFact> {
        self.matcher.extract(&TaggedDocument::scan(document), concept)
    }
}

/// Per-filing state shared by every concept lookup in one call
///
/// The document and the handle are fetched lazily, at most once. A failed
/// fetch is remembered as `None` and not retried.
struct FilingSession<'a, R>
where
    R: DocumentRepository,
{
    extractor: &'a FactExtractor<R>,
    filing: &'a FilingRef,
    document: OnceCell<Option<TaggedDocument<'static>>>,
    handle: OnceCell<Option<R::Handle>>,
}

impl<'a, R> FilingSession<'a, R>
where
    R: DocumentRepository,
{
    fn new(extractor: &'a FactExtractor<R>, filing: &'a FilingRef) -> Self {
        Self {
            extractor,
            filing,
            document: OnceCell::new(),
            handle: OnceCell::new(),
        }
    }

    fn document(&self) -> Option<&TaggedDocument<'static>> {
        self.document
            .get_or_init(|| {
                match self.extractor.repository.get_document_text(self.filing) {
                    Ok(text) => Some(TaggedDocument::scan(text)),
                    Err(e) => {
                        let err = ExtractorError::Document(e.to_string());
                        warn!(filing = %self.filing, error = %err, "Direct extraction unavailable");
                        None
                    }
                }
            })
            .as_ref()
    }

    fn handle(&self) -> Option<&R::Handle> {
        self.handle
            .get_or_init(|| match self.extractor.repository.parsed_handle(self.filing) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    let err = ExtractorError::Handle(e.to_string());
                    warn!(filing = %self.filing, error = %err, "Parsed handle unavailable");
                    None
                }
            })
            .as_ref()
    }

    fn resolve(&self, concept: &str) -> Option<ExtractedFact> {
        if let Some(fact) = self.direct(concept) {
            return Some(fact);
        }
        if self.extractor.config.enable_structured_fallback {
            if let Some(fact) = self.structured(concept) {
                return Some(fact);
            }
        }
        if self.extractor.config.enable_history_fallback {
            if let Some(fact) = self.history(concept) {
                return Some(fact);
            }
        }
        debug!(filing = %self.filing, concept, "Concept not found");
        None
    }

    fn direct(&self, concept: &str) -> Option<ExtractedFact> {
        let document = self.document()?;
        self.extractor.matcher.extract(document, concept)
    }

    fn structured(&self, concept: &str) -> Option<ExtractedFact> {
        let handle = self.handle()?;
        if !handle.capabilities().query {
            debug!(concept, "Handle has no query support, skipping");
            return None;
        }

        let first = |result: Result<Vec<StructuredFact>, <R::Handle as ParsedDocument>::Error>,
                     method: &str| {
            match result {
                Ok(facts) => facts.into_iter().next(),
                Err(e) => {
                    warn!(concept, method, error = %e, "Structured query failed");
                    None
                }
            }
        };

        first(handle.query_concept(concept), "query_concept")
            .or_else(|| first(handle.query_by_concept(concept), "query_by_concept"))
            .map(|fact| fact.into_extracted(concept, FactSource::StructuredQuery))
    }

    fn history(&self, concept: &str) -> Option<ExtractedFact> {
        let handle = self.handle()?;
        if !handle.capabilities().history {
            debug!(concept, "Handle has no history support, skipping");
            return None;
        }

        match handle.concept_history(concept) {
            Ok(history) => history
                .into_iter()
                .last()
                .map(|fact| fact.into_extracted(concept, FactSource::ConceptHistory)),
            Err(e) => {
                warn!(concept, error = %e, "Concept history failed");
                None
            }
        }
    }
}
