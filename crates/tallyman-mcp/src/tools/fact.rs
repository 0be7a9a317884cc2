//! Shared tool types: filing arguments and fact rendering

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tallyman_domain::{ExtractedFact, FactValue, FilingRef};

use crate::error::McpError;

/// Arguments identifying one filing
#[derive(Debug, Clone, Deserialize)]
pub struct FilingParams {
    /// Filer CIK, as a string or a number
    #[serde(deserialize_with = "cik_from_string_or_number")]
    pub cik: String,
    /// Accession number, dashed or compact
    pub accession_number: String,
}

impl FilingParams {
    /// Validate into a filing reference
    pub fn filing(&self) -> Result<FilingRef, McpError> {
        FilingRef::new(&self.cik, &self.accession_number).map_err(McpError::InvalidParams)
    }
}

fn cik_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cik {
        Text(String),
        Number(u64),
    }

    Ok(match Cik::deserialize(deserializer)? {
        Cik::Text(s) => s,
        Cik::Number(n) => n.to_string(),
    })
}

/// Fact as reported to tool callers
#[derive(Debug, Clone, Serialize)]
pub struct FactInfo {
    /// Requested concept name
    pub concept: String,
    /// Number or text
    pub value: Value,
    /// Display text the value came from
    pub raw_value: String,
    /// Unit of measure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Period end or instant date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Context identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_ref: Option<String>,
    /// Power-of-ten scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
    /// Resolution strategy
    pub source: String,
}

impl From<ExtractedFact> for FactInfo {
    fn from(fact: ExtractedFact) -> Self {
        let value = match fact.value {
            FactValue::Number(n) => Value::from(n),
            FactValue::Text(s) => Value::String(s),
        };
        Self {
            concept: fact.concept,
            value,
            raw_value: fact.raw_value,
            unit: fact.unit,
            period: fact.period,
            context_ref: fact.context_ref,
            scale: fact.scale,
            source: fact.source.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tallyman_domain::FactSource;

    #[test]
    fn test_numeric_cik() {
        let params: FilingParams = serde_json::from_value(json!({
            "cik": 320193,
            "accession_number": "000032019323000106"
        }))
        .unwrap();
        let filing = params.filing().unwrap();
        assert_eq!(filing.cik_number(), "320193");
        assert_eq!(filing.accession_number(), "0000320193-23-000106");
    }

    #[test]
    fn test_invalid_filing() {
        let params: FilingParams = serde_json::from_value(json!({
            "cik": "apple",
            "accession_number": "0000320193-23-000106"
        }))
        .unwrap();
        assert!(matches!(params.filing(), Err(McpError::InvalidParams(_))));
    }

    #[test]
    fn test_fact_info_text() {
        let fact = ExtractedFact::text("DocumentType", "10-K", FactSource::DirectPattern);
        let value = serde_json::to_value(FactInfo::from(fact)).unwrap();
        assert_eq!(value["value"], "10-K");
        assert_eq!(value["source"], "direct_pattern");
        assert!(value.get("unit").is_none());
    }
}
