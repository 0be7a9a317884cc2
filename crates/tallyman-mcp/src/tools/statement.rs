//! Statement-family discovery tool

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tallyman_domain::{DocumentRepository, StatementFamily};
use tallyman_extractor::FactExtractor;
use tracing::info;

use super::fact::{FactInfo, FilingParams};
use crate::error::McpError;

/// Parameters for `discover_statement_concepts`
#[derive(Debug, Deserialize)]
pub struct DiscoverStatementParams {
    /// Filing to read
    #[serde(flatten)]
    pub filing: FilingParams,
    /// `income`, `balance`, `cash_flow` or `other`
    pub statement_type: String,
}

/// Result of `discover_statement_concepts`
#[derive(Debug, Serialize)]
pub struct DiscoverStatementResult {
    /// Canonical family name
    pub statement_type: String,
    /// Number of resolved concepts
    pub count: usize,
    /// Resolved facts keyed by concept
    pub concepts: BTreeMap<String, FactInfo>,
    /// Catalogued concepts nothing could resolve
    pub missing: Vec<String>,
}

/// Handle `discover_statement_concepts` tool invocation
///
/// # Errors
///
/// `McpError::InvalidParams` for a malformed filing or an unknown
/// statement type.
pub fn handle_discover_statement<R: DocumentRepository>(
    extractor: &FactExtractor<R>,
    params: DiscoverStatementParams,
) -> Result<DiscoverStatementResult, McpError> {
    let filing = params.filing.filing()?;
    let family: StatementFamily = params
        .statement_type
        .parse()
        .map_err(McpError::InvalidParams)?;

    let discovery = extractor.discover_statement_concepts(&filing, family);
    info!(
        filing = %filing,
        family = %family,
        count = discovery.count,
        "Statement discovery complete"
    );

    Ok(DiscoverStatementResult {
        statement_type: family.as_str().to_string(),
        count: discovery.count,
        concepts: discovery
            .facts
            .into_iter()
            .map(|(name, fact)| (name, FactInfo::from(fact)))
            .collect(),
        missing: discovery.missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialize() {
        let json = r#"{
            "cik": "320193",
            "accession_number": "0000320193-23-000106",
            "statement_type": "cash"
        }"#;
        let params: DiscoverStatementParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.statement_type, "cash");
    }
}
