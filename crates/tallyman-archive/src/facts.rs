//! Company-facts handle
//!
//! The archive's company-facts endpoint lists every XBRL fact a filer has
//! reported, across all of its filings:
//!
//! ```json
//! {"cik": 320193, "entityName": "Apple Inc.",
//!  "facts": {"us-gaap": {"Assets": {"units": {"USD": [
//!      {"end": "2023-09-30", "val": 352583000000, "accn": "0000320193-23-000106"}
//!  ]}}}}}
//! ```
//!
//! The handle flattens that tree into facts named `taxonomy:Concept` and
//! scopes direct queries and the listing to one filing, while the history
//! view spans every filing.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use tallyman_domain::{FactValue, FilingRef, HandleCapabilities, ParsedDocument, StructuredFact};
use tracing::debug;

use crate::ArchiveError;

#[derive(Debug, Deserialize)]
struct CompanyFactsDocument {
    #[serde(default)]
    cik: Option<serde_json::Value>,
    #[serde(rename = "entityName", default)]
    entity_name: Option<String>,
    #[serde(default)]
    facts: BTreeMap<String, BTreeMap<String, ConceptBlock>>,
}

#[derive(Debug, Deserialize)]
struct ConceptBlock {
    #[serde(default)]
    units: BTreeMap<String, Vec<FactEntry>>,
}

#[derive(Debug, Deserialize)]
struct FactEntry {
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    val: serde_json::Value,
    #[serde(default)]
    accn: Option<String>,
}

/// Structured view over one filing's facts, backed by company-facts JSON
#[derive(Debug, Clone)]
pub struct CompanyFactsHandle {
    accession: String,
    entity_name: Option<String>,
    facts: Vec<StructuredFact>,
}

impl CompanyFactsHandle {
    /// Decode company-facts JSON and scope it to `filing`
    ///
    /// # Errors
    ///
    /// `Decode` for malformed JSON; `InvalidFiling` if the document belongs
    /// to a different filer.
    pub fn from_json(json: &str, filing: &FilingRef) -> Result<Self, ArchiveError> {
        let document: CompanyFactsDocument = serde_json::from_str(json)?;

        if let Some(cik) = document.cik.as_ref().and_then(cik_string) {
            if cik.trim_start_matches('0') != filing.cik_number() {
                return Err(ArchiveError::InvalidFiling(format!(
                    "company facts are for CIK {}, expected {}",
                    cik,
                    filing.cik_number()
                )));
            }
        }

        let mut facts = Vec::new();
        for (taxonomy, concepts) in document.facts {
            for (concept, block) in concepts {
                for (unit, entries) in block.units {
                    for entry in entries {
                        let Some(value) = entry_value(&entry.val) else {
                            continue;
                        };
                        // Entries with a start date are durations; the rest are instants
                        let (period_end, period_instant) = match entry.start {
                            Some(_) => (entry.end, None),
                            None => (None, entry.end),
                        };
                        facts.push(StructuredFact {
                            concept: format!("{}:{}", taxonomy, concept),
                            value,
                            unit: Some(unit.clone()),
                            context_ref: None,
                            period_end,
                            period_instant,
                            accession: entry.accn,
                        });
                    }
                }
            }
            debug!(taxonomy = %taxonomy, "Flattened company facts taxonomy");
        }

        debug!(
            filing = %filing,
            facts = facts.len(),
            "Company facts decoded"
        );

        Ok(Self {
            accession: filing.accession_number().to_string(),
            entity_name: document.entity_name,
            facts,
        })
    }

    /// Filer name, if the document carried one
    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name.as_deref()
    }

    /// Accession number direct queries are scoped to
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// Total facts across every filing
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the document held no facts
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    fn in_filing<'a>(
        &'a self,
        matches: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a StructuredFact> + 'a {
        self.facts.iter().filter(move |f| {
            f.accession.as_deref() == Some(self.accession.as_str()) && matches(f.local_name())
        })
    }
}

fn cik_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn entry_value(value: &serde_json::Value) -> Option<FactValue> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(FactValue::Number),
        serde_json::Value::String(s) => Some(FactValue::Text(s.trim().to_string())),
        serde_json::Value::Bool(b) => Some(FactValue::Text(b.to_string())),
        _ => None,
    }
}

/// Strip a namespace prefix (`us-gaap:Assets` → `Assets`)
fn local_name(concept: &str) -> &str {
    concept.rsplit(':').next().unwrap_or(concept)
}

fn latest_first(a: &StructuredFact, b: &StructuredFact) -> Ordering {
    b.period().cmp(&a.period())
}

impl ParsedDocument for CompanyFactsHandle {
    type Error = ArchiveError;

    fn capabilities(&self) -> HandleCapabilities {
        HandleCapabilities::all()
    }

    fn query_concept(&self, concept: &str) -> Result<Vec<StructuredFact>, ArchiveError> {
        let wanted = local_name(concept).to_string();
        let mut found: Vec<StructuredFact> =
            self.in_filing(move |c| c == wanted).cloned().collect();
        found.sort_by(latest_first);
        Ok(found)
    }

    fn query_by_concept(&self, concept: &str) -> Result<Vec<StructuredFact>, ArchiveError> {
        let wanted = local_name(concept).to_lowercase();
        let mut found: Vec<StructuredFact> = self
            .in_filing(move |c| c.to_lowercase() == wanted)
            .cloned()
            .collect();
        found.sort_by(latest_first);
        Ok(found)
    }

    fn concept_history(&self, concept: &str) -> Result<Vec<StructuredFact>, ArchiveError> {
        let wanted = local_name(concept).to_lowercase();
        let mut history: Vec<StructuredFact> = self
            .facts
            .iter()
            .filter(|f| f.local_name().to_lowercase() == wanted)
            .cloned()
            .collect();
        history.sort_by(|a, b| a.period().cmp(&b.period()));

        let mut seen = HashSet::new();
        history.retain(|f| {
            seen.insert((
                f.period().map(str::to_string),
                f.accession.clone(),
                f.unit.clone(),
            ))
        });
        Ok(history)
    }

    fn all_facts(&self, namespace: Option<&str>) -> Result<Vec<StructuredFact>, ArchiveError> {
        Ok(self
            .in_filing(|_| true)
            .filter(|f| namespace.map_or(true, |ns| f.in_namespace(ns)))
            .cloned()
            .collect())
    }
}
