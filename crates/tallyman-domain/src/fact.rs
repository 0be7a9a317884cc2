//! Fact value types

use std::fmt;

/// The value carried by a fact
///
/// A value is numeric only when its display text parsed as a number;
/// anything else is kept verbatim (trimmed) as text.
#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    /// Parsed, scaled numeric value
    Number(f64),
    /// Display text that is not a number
    Text(String),
}

impl FactValue {
    /// Numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Number(n) => Some(*n),
            FactValue::Text(_) => None,
        }
    }

    /// Text value, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Number(_) => None,
            FactValue::Text(t) => Some(t),
        }
    }

    /// Whether this value is numeric
    pub fn is_number(&self) -> bool {
        matches!(self, FactValue::Number(_))
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Number(n) => write!(f, "{}", n),
            FactValue::Text(t) => f.write_str(t),
        }
    }
}

/// Which retrieval strategy produced a fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactSource {
    /// Pattern match over the raw filing text
    DirectPattern,
    /// Query against the parsed-document handle
    StructuredQuery,
    /// Most recent entry of the handle's concept history
    ConceptHistory,
}

impl FactSource {
    /// Stable name used in tool output
    pub fn as_str(&self) -> &'static str {
        match self {
            FactSource::DirectPattern => "direct_pattern",
            FactSource::StructuredQuery => "structured_query",
            FactSource::ConceptHistory => "concept_history",
        }
    }
}

impl fmt::Display for FactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved value for one concept
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFact {
    /// Concept name that was requested
    pub concept: String,

    /// Normalized value
    pub value: FactValue,

    /// Trimmed display text the value was derived from
    pub raw_value: String,

    /// Unit of measure (numeric facts only)
    pub unit: Option<String>,

    /// Period end or instant date (`YYYY-MM-DD`)
    pub period: Option<String>,

    /// Identifier of the context the fact was reported under
    pub context_ref: Option<String>,

    /// Power-of-ten scale applied to the display value (numeric facts only)
    pub scale: Option<i32>,

    /// Strategy that produced this fact
    pub source: FactSource,
}

impl ExtractedFact {
    /// Build a text-valued fact with no unit, scale or period
    pub fn text(concept: impl Into<String>, raw: impl Into<String>, source: FactSource) -> Self {
        let raw = raw.into();
        Self {
            concept: concept.into(),
            value: FactValue::Text(raw.clone()),
            raw_value: raw,
            unit: None,
            period: None,
            context_ref: None,
            scale: None,
            source,
        }
    }
}

/// A context block resolved from a tagged document
///
/// Transient: built on demand for one lookup and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRecord {
    /// Context identifier (`id` attribute)
    pub id: String,

    /// End date of a duration context
    pub end_date: Option<String>,

    /// Date of a point-in-time context
    pub instant: Option<String>,
}

impl ContextRecord {
    /// The period a fact in this context applies to, preferring the end date
    pub fn period(&self) -> Option<&str> {
        self.end_date.as_deref().or(self.instant.as_deref())
    }
}

/// A fact record handed out by a parsed-document handle
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredFact {
    /// Concept name as reported by the handle
    pub concept: String,

    /// Reported value
    pub value: FactValue,

    /// Unit of measure
    pub unit: Option<String>,

    /// Context identifier, when the handle knows it
    pub context_ref: Option<String>,

    /// End date of a duration fact
    pub period_end: Option<String>,

    /// Date of an instant fact
    pub period_instant: Option<String>,

    /// Accession number of the filing the fact was reported in
    pub accession: Option<String>,
}

impl StructuredFact {
    /// Period end, falling back to the instant date
    pub fn period(&self) -> Option<&str> {
        self.period_end.as_deref().or(self.period_instant.as_deref())
    }

    /// Namespace prefix of the concept (`us-gaap` in `us-gaap:Assets`)
    pub fn namespace(&self) -> Option<&str> {
        self.concept.split_once(':').map(|(ns, _)| ns)
    }

    /// Concept name without its namespace prefix
    pub fn local_name(&self) -> &str {
        self.concept
            .split_once(':')
            .map(|(_, name)| name)
            .unwrap_or(&self.concept)
    }

    /// Whether the concept lives in `namespace`
    ///
    /// Compared case-insensitively; a trailing `:` on `namespace` is ignored.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        let wanted = namespace.trim().trim_end_matches(':');
        self.namespace()
            .map(|ns| ns.eq_ignore_ascii_case(wanted))
            .unwrap_or(false)
    }

    /// Convert into an extracted fact attributed to `source`
    pub fn into_extracted(self, requested: &str, source: FactSource) -> ExtractedFact {
        let period = self.period().map(str::to_string);
        let raw_value = self.value.to_string();
        ExtractedFact {
            concept: requested.to_string(),
            value: self.value,
            raw_value,
            unit: self.unit,
            period,
            context_ref: self.context_ref,
            scale: None,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefers_end_date() {
        let ctx = ContextRecord {
            id: "c1".to_string(),
            end_date: Some("2023-12-31".to_string()),
            instant: Some("2023-06-30".to_string()),
        };
        assert_eq!(ctx.period(), Some("2023-12-31"));

        let instant_only = ContextRecord {
            id: "c2".to_string(),
            end_date: None,
            instant: Some("2023-06-30".to_string()),
        };
        assert_eq!(instant_only.period(), Some("2023-06-30"));
    }

    #[test]
    fn test_structured_fact_conversion() {
        let fact = StructuredFact {
            concept: "Assets".to_string(),
            value: FactValue::Number(352_583_000_000.0),
            unit: Some("USD".to_string()),
            context_ref: None,
            period_end: None,
            period_instant: Some("2023-09-30".to_string()),
            accession: Some("0000320193-23-000106".to_string()),
        };

        let extracted = fact.into_extracted("Assets", FactSource::StructuredQuery);
        assert_eq!(extracted.period.as_deref(), Some("2023-09-30"));
        assert_eq!(extracted.raw_value, "352583000000");
        assert_eq!(extracted.scale, None);
        assert_eq!(extracted.source, FactSource::StructuredQuery);
    }

    #[test]
    fn test_namespace() {
        let fact = StructuredFact {
            concept: "us-gaap:Assets".to_string(),
            value: FactValue::Number(1.0),
            unit: None,
            context_ref: None,
            period_end: None,
            period_instant: None,
            accession: None,
        };
        assert_eq!(fact.namespace(), Some("us-gaap"));
        assert_eq!(fact.local_name(), "Assets");
        assert!(fact.in_namespace("US-GAAP"));
        assert!(fact.in_namespace("us-gaap:"));
        assert!(!fact.in_namespace("dei"));

        let bare = StructuredFact {
            concept: "Assets".to_string(),
            ..fact
        };
        assert_eq!(bare.namespace(), None);
        assert_eq!(bare.local_name(), "Assets");
        assert!(!bare.in_namespace("us-gaap"));
    }

    #[test]
    fn test_text_fact_has_no_unit_or_scale() {
        let fact = ExtractedFact::text("DocumentType", "10-K", FactSource::DirectPattern);
        assert_eq!(fact.value, FactValue::Text("10-K".to_string()));
        assert!(fact.unit.is_none());
        assert!(fact.scale.is_none());
    }
}
