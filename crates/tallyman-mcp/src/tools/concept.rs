//! Single-concept lookup tool

use serde::{Deserialize, Serialize};
use tallyman_domain::DocumentRepository;
use tallyman_extractor::FactExtractor;
use tracing::debug;

use super::fact::{FactInfo, FilingParams};
use crate::error::McpError;

/// Parameters for `get_xbrl_concept`
#[derive(Debug, Deserialize)]
pub struct GetConceptParams {
    /// Filing to read
    #[serde(flatten)]
    pub filing: FilingParams,
    /// Concept name, with or without namespace prefix
    pub concept: String,
}

/// Result of `get_xbrl_concept`
#[derive(Debug, Serialize)]
pub struct GetConceptResult {
    /// Whether any strategy resolved the concept
    pub found: bool,
    /// The resolved fact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact: Option<FactInfo>,
}

/// Handle `get_xbrl_concept` tool invocation
///
/// # Errors
///
/// `McpError::InvalidParams` for a malformed filing or blank concept.
/// Absence of the concept is a successful `found: false`.
pub fn handle_get_concept<R: DocumentRepository>(
    extractor: &FactExtractor<R>,
    params: GetConceptParams,
) -> Result<GetConceptResult, McpError> {
    let filing = params.filing.filing()?;
    if params.concept.trim().is_empty() {
        return Err(McpError::InvalidParams("concept must not be empty".to_string()));
    }

    let fact = extractor.extract_concept(&filing, &params.concept);
    debug!(filing = %filing, concept = %params.concept, found = fact.is_some(), "get_xbrl_concept");

    Ok(GetConceptResult {
        found: fact.is_some(),
        fact: fact.map(FactInfo::from),
    })
}
