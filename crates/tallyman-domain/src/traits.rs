//! Trait definitions for external interactions
//!
//! These traits define the boundaries between extraction logic and the
//! archive. Infrastructure implementations live in other crates.

use std::fmt::Display;

use crate::{FilingRef, StructuredFact};

/// Trait for fetching filings from an archive
///
/// Implemented by the infrastructure layer (tallyman-archive)
pub trait DocumentRepository {
    /// Error type for repository operations
    type Error: Display;

    /// Parsed-document handle handed out by this repository
    type Handle: ParsedDocument;

    /// Fetch the raw tagged text of a filing
    fn get_document_text(&self, filing: &FilingRef) -> Result<String, Self::Error>;

    /// Obtain a structured view over a filing's facts
    fn parsed_handle(&self, filing: &FilingRef) -> Result<Self::Handle, Self::Error>;
}

/// Which optional query facilities a handle supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleCapabilities {
    /// Exact-name and concept-indexed queries
    pub query: bool,
    /// Per-concept history view
    pub history: bool,
    /// Listing of every fact in the filing
    pub listing: bool,
}

impl HandleCapabilities {
    /// Every facility available
    pub fn all() -> Self {
        Self {
            query: true,
            history: true,
            listing: true,
        }
    }

    /// No facilities available
    pub fn none() -> Self {
        Self::default()
    }
}

/// Structured fact view over one filing
///
/// Every query method defaults to an empty result, so implementors only
/// provide what they support and advertise it through `capabilities`.
pub trait ParsedDocument {
    /// Error type for handle queries
    type Error: Display;

    /// Facilities this handle supports
    fn capabilities(&self) -> HandleCapabilities {
        HandleCapabilities::none()
    }

    /// Facts whose concept name matches exactly
    fn query_concept(&self, _concept: &str) -> Result<Vec<StructuredFact>, Self::Error> {
        Ok(Vec::new())
    }

    /// Facts indexed under a concept, matched leniently
    fn query_by_concept(&self, _concept: &str) -> Result<Vec<StructuredFact>, Self::Error> {
        Ok(Vec::new())
    }

    /// Historical values of a concept, oldest first
    fn concept_history(&self, _concept: &str) -> Result<Vec<StructuredFact>, Self::Error> {
        Ok(Vec::new())
    }

    /// Every fact reported in this filing, in document order
    ///
    /// With `namespace`, only concepts under that prefix are listed.
    fn all_facts(&self, _namespace: Option<&str>) -> Result<Vec<StructuredFact>, Self::Error> {
        Ok(Vec::new())
    }
}
