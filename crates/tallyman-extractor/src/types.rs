//! Result types for bulk extraction

use std::collections::BTreeMap;

use tallyman_domain::ExtractedFact;

/// Outcome of resolving a list of concepts against one filing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptDiscovery {
    /// Resolved facts keyed by requested concept name
    pub facts: BTreeMap<String, ExtractedFact>,

    /// Concepts that no strategy could resolve, in request order
    pub missing: Vec<String>,

    /// Number of resolved concepts
    pub count: usize,
}

impl ConceptDiscovery {
    /// Record the outcome for one concept
    pub fn record(&mut self, concept: &str, fact: Option<ExtractedFact>) {
        match fact {
            Some(fact) => {
                self.facts.insert(concept.to_string(), fact);
                self.count = self.facts.len();
            }
            None => self.missing.push(concept.to_string()),
        }
    }

    /// Fact for `concept`, if resolved
    pub fn get(&self, concept: &str) -> Option<&ExtractedFact> {
        self.facts.get(concept)
    }

    /// Whether nothing was resolved
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// One concept in a filing-wide listing
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptSummary {
    /// Namespace-qualified concept name
    pub concept: String,

    /// Most recent value reported for the concept
    pub latest: ExtractedFact,

    /// Number of facts reported under the concept
    pub count: usize,
}

/// Every concept a filing reports, grouped from its fact listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptListing {
    /// Namespace the listing was restricted to
    pub namespace: Option<String>,

    /// Number of facts behind the listing
    pub total_facts: usize,

    /// Concepts in first-reported order
    pub concepts: Vec<ConceptSummary>,
}

impl ConceptListing {
    /// Summary for a qualified concept name
    pub fn get(&self, concept: &str) -> Option<&ConceptSummary> {
        self.concepts.iter().find(|s| s.concept == concept)
    }

    /// Whether the listing is empty
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallyman_domain::FactSource;

    #[test]
    fn test_record() {
        let mut discovery = ConceptDiscovery::default();
        discovery.record(
            "DocumentType",
            Some(ExtractedFact::text("DocumentType", "10-K", FactSource::DirectPattern)),
        );
        discovery.record("Goodwill", None);

        assert_eq!(discovery.count, 1);
        assert_eq!(discovery.missing, vec!["Goodwill"]);
        assert!(discovery.get("DocumentType").is_some());
        assert!(!discovery.is_empty());
    }
}
