//! Bulk concept lookup tool

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tallyman_domain::DocumentRepository;
use tallyman_extractor::{ConceptDiscovery, FactExtractor};

use super::fact::{FactInfo, FilingParams};
use crate::error::McpError;

/// Parameters for `get_xbrl_concepts`
#[derive(Debug, Deserialize)]
pub struct GetConceptsParams {
    /// Filing to read
    #[serde(flatten)]
    pub filing: FilingParams,
    /// Concepts to resolve; the whole catalog when absent
    #[serde(default)]
    pub concepts: Option<Vec<String>>,
}

/// Result of `get_xbrl_concepts`
#[derive(Debug, Serialize)]
pub struct GetConceptsResult {
    /// Number of resolved concepts
    pub count: usize,
    /// Resolved facts keyed by concept
    pub concepts: BTreeMap<String, FactInfo>,
    /// Concepts nothing could resolve
    pub missing: Vec<String>,
}

impl From<ConceptDiscovery> for GetConceptsResult {
    fn from(discovery: ConceptDiscovery) -> Self {
        Self {
            count: discovery.count,
            concepts: discovery
                .facts
                .into_iter()
                .map(|(name, fact)| (name, FactInfo::from(fact)))
                .collect(),
            missing: discovery.missing,
        }
    }
}

/// Handle `get_xbrl_concepts` tool invocation
pub fn handle_get_concepts<R: DocumentRepository>(
    extractor: &FactExtractor<R>,
    params: GetConceptsParams,
) -> Result<GetConceptsResult, McpError> {
    let filing = params.filing.filing()?;
    let discovery = match params.concepts {
        Some(concepts) => extractor.extract_concepts(&filing, &concepts),
        None => extractor.get_all_financial_concepts(&filing),
    };
    Ok(discovery.into())
}
