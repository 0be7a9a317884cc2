//! Filing-wide concept listing tool

use serde::{Deserialize, Serialize};
use tallyman_domain::DocumentRepository;
use tallyman_extractor::{ConceptSummary, FactExtractor};

use super::fact::{FactInfo, FilingParams};
use crate::error::McpError;

/// Concepts returned when the caller gives no limit
pub const DEFAULT_LISTING_LIMIT: usize = 20;

/// Parameters for `discover_xbrl_concepts`
#[derive(Debug, Deserialize)]
pub struct DiscoverConceptsParams {
    /// Filing to read
    #[serde(flatten)]
    pub filing: FilingParams,
    /// Restrict to one namespace (`us-gaap`, `dei`, ...)
    #[serde(default)]
    pub namespace: Option<String>,
    /// Maximum concepts to return
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One listed concept
#[derive(Debug, Serialize)]
pub struct ConceptEntry {
    /// Qualified concept name
    pub concept: String,
    /// Facts reported under the concept
    pub count: usize,
    /// Latest reported value
    pub latest: FactInfo,
}

impl From<ConceptSummary> for ConceptEntry {
    fn from(summary: ConceptSummary) -> Self {
        Self {
            concept: summary.concept,
            count: summary.count,
            latest: summary.latest.into(),
        }
    }
}

/// Result of `discover_xbrl_concepts`
#[derive(Debug, Serialize)]
pub struct DiscoverConceptsResult {
    /// Namespace filter applied, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Facts behind the listing
    pub total_facts: usize,
    /// Distinct concepts found
    pub total_concepts: usize,
    /// The first `limit` concepts
    pub concepts: Vec<ConceptEntry>,
}

/// Handle `discover_xbrl_concepts` tool invocation
///
/// # Errors
///
/// `McpError::InvalidParams` for a malformed filing or a zero limit.
pub fn handle_discover_concepts<R: DocumentRepository>(
    extractor: &FactExtractor<R>,
    params: DiscoverConceptsParams,
) -> Result<DiscoverConceptsResult, McpError> {
    let filing = params.filing.filing()?;
    let limit = params.limit.unwrap_or(DEFAULT_LISTING_LIMIT);
    if limit == 0 {
        return Err(McpError::InvalidParams("limit must be positive".to_string()));
    }

    let listing = extractor.discover_xbrl_concepts(&filing, params.namespace.as_deref());
    Ok(DiscoverConceptsResult {
        namespace: listing.namespace,
        total_facts: listing.total_facts,
        total_concepts: listing.concepts.len(),
        concepts: listing
            .concepts
            .into_iter()
            .take(limit)
            .map(ConceptEntry::from)
            .collect(),
    })
}
