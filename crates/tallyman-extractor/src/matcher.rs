//! Direct pattern extraction
//!
//! A filing's inline tags are scanned once into [`FactNode`]s. A concept is
//! then resolved by walking six matcher stages in a fixed order:
//!
//! | Stage | Name tier | Node kind |
//! |---|---|---|
//! | 1 | `name="prefix:Concept"` | `ix:nonFraction` |
//! | 2 | `name="prefix:Concept"` | `ix:nonNumeric` |
//! | 3 | `name="Concept"` | `ix:nonFraction` |
//! | 4 | `name="Concept"` | `ix:nonNumeric` |
//! | 5 | name contains `Concept` | `ix:nonFraction` |
//! | 6 | name contains `Concept` | `ix:nonNumeric` |
//!
//! Names compare case-insensitively. Placeholder texts are skipped and the
//! scan moves on to the next candidate, as are numbers whose `scale` puts
//! them out of range. A numeric node whose text will not
//! parse is kept aside as a text fact; if nothing better turns up within
//! its name tier, that text fact is the tier's answer.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tallyman_domain::{ExtractedFact, FactSource, FactValue};
use tracing::debug;

use crate::context::DocumentIndex;
use crate::normalize::{apply_scale, parse_display_number, PlaceholderPolicy};

static NON_FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<ix:nonFraction\b([^>]*)>([^<]*)</ix:nonFraction>")
        .expect("valid nonFraction regex")
});

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<ix:nonNumeric\b([^>]*)>([^<]*)</ix:nonNumeric>")
        .expect("valid nonNumeric regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

/// How a node's `name` must relate to the requested concept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTier {
    /// `prefix:Concept`
    Qualified,
    /// `Concept`
    Bare,
    /// Any name containing `Concept`
    Contains,
}

impl NameTier {
    /// Whether `name` matches `concept` in this tier (case-insensitive)
    pub fn matches(&self, name: &str, concept: &str) -> bool {
        self.matches_folded(&name.to_lowercase(), &concept.to_lowercase())
    }

    /// Same as [`NameTier::matches`] for already lowercased inputs
    fn matches_folded(&self, name: &str, concept: &str) -> bool {
        match self {
            NameTier::Qualified => name
                .strip_suffix(concept)
                .and_then(|head| head.strip_suffix(':'))
                .is_some(),
            NameTier::Bare => name == concept,
            NameTier::Contains => name.contains(concept),
        }
    }
}

/// Which inline element a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `ix:nonFraction`
    Numeric,
    /// `ix:nonNumeric`
    Text,
}

/// One step of the matcher pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherStage {
    /// Name rule
    pub tier: NameTier,
    /// Element kind
    pub kind: NodeKind,
}

/// Stages in the order they are tried
pub const STAGES: [MatcherStage; 6] = [
    MatcherStage { tier: NameTier::Qualified, kind: NodeKind::Numeric },
    MatcherStage { tier: NameTier::Qualified, kind: NodeKind::Text },
    MatcherStage { tier: NameTier::Bare, kind: NodeKind::Numeric },
    MatcherStage { tier: NameTier::Bare, kind: NodeKind::Text },
    MatcherStage { tier: NameTier::Contains, kind: NodeKind::Numeric },
    MatcherStage { tier: NameTier::Contains, kind: NodeKind::Text },
];

/// An inline fact element with plain-text content
#[derive(Debug, Clone, PartialEq)]
pub struct FactNode {
    /// Element kind
    pub kind: NodeKind,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Untrimmed text content
    pub content: String,
    folded_name: Option<String>,
}

impl FactNode {
    fn parse(kind: NodeKind, attrs: &str, content: &str) -> Self {
        let attributes = ATTRIBUTE
            .captures_iter(attrs)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str().to_string();
                let value = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
                Some((name, value))
            })
            .collect::<Vec<(String, String)>>();
        let folded_name = attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("name"))
            .map(|(_, v)| v.to_lowercase());
        Self {
            kind,
            attributes,
            content: content.to_string(),
            folded_name,
        }
    }

    /// Attribute value, name matched case-insensitively
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }

    /// The `contextRef` attribute
    pub fn context_ref(&self) -> Option<&str> {
        self.attr("contextRef").filter(|c| !c.is_empty())
    }

    /// The `unitRef` attribute
    pub fn unit_ref(&self) -> Option<&str> {
        self.attr("unitRef").filter(|u| !u.is_empty())
    }

    /// The `scale` attribute, 0 when absent or malformed
    pub fn scale(&self) -> i32 {
        self.attr("scale")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Whether `sign="-"` is set
    pub fn is_negated(&self) -> bool {
        self.attr("sign").map(str::trim) == Some("-")
    }
}

/// A filing's text together with its scanned fact nodes
#[derive(Debug, Clone)]
pub struct TaggedDocument<'t> {
    text: Cow<'t, str>,
    numeric: Vec<FactNode>,
    textual: Vec<FactNode>,
    index: DocumentIndex,
}

impl<'t> TaggedDocument<'t> {
    /// Scan `text` for inline fact elements
    pub fn scan(text: impl Into<Cow<'t, str>>) -> Self {
        let text = text.into();
        let collect = |re: &Regex, kind: NodeKind| -> Vec<FactNode> {
            re.captures_iter(&text)
                .filter_map(|caps| {
                    let attrs = caps.get(1)?.as_str();
                    let content = caps.get(2)?.as_str();
                    Some(FactNode::parse(kind, attrs, content))
                })
                .collect()
        };
        let numeric = collect(&NON_FRACTION, NodeKind::Numeric);
        let textual = collect(&NON_NUMERIC, NodeKind::Text);
        let index = DocumentIndex::build(&text);

        debug!(
            bytes = text.len(),
            numeric = numeric.len(),
            textual = textual.len(),
            contexts = index.context_count(),
            units = index.unit_count(),
            "Scanned tagged document"
        );

        Self {
            text,
            numeric,
            textual,
            index,
        }
    }

    /// Contexts and units found by the scan
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Full document text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Nodes of one kind, in document order
    pub fn nodes(&self, kind: NodeKind) -> &[FactNode] {
        match kind {
            NodeKind::Numeric => &self.numeric,
            NodeKind::Text => &self.textual,
        }
    }

    /// Nodes selected by `stage` for `concept`, in document order
    pub fn candidates<'a>(
        &'a self,
        stage: MatcherStage,
        concept: &str,
    ) -> impl Iterator<Item = &'a FactNode> + 'a {
        self.folded_candidates(stage, concept.to_lowercase())
    }

    fn folded_candidates<'a>(
        &'a self,
        stage: MatcherStage,
        folded_concept: impl AsRef<str> + 'a,
    ) -> impl Iterator<Item = &'a FactNode> + 'a {
        self.nodes(stage.kind).iter().filter(move |node| {
            node.folded_name
                .as_deref()
                .map(|name| stage.tier.matches_folded(name, folded_concept.as_ref()))
                .unwrap_or(false)
        })
    }
}

/// Resolves concepts against a [`TaggedDocument`]
#[derive(Debug, Clone)]
pub struct ConceptMatcher {
    placeholders: PlaceholderPolicy,
    default_unit: String,
}

enum Candidate {
    Resolved(ExtractedFact),
    Unparsed(ExtractedFact),
    Skipped,
}

impl ConceptMatcher {
    /// Matcher with the given placeholder policy and fallback unit
    pub fn new(placeholders: PlaceholderPolicy, default_unit: impl Into<String>) -> Self {
        Self {
            placeholders,
            default_unit: default_unit.into(),
        }
    }

    /// First fact for `concept`, walking the stages in order
    pub fn extract(&self, document: &TaggedDocument<'_>, concept: &str) -> Option<ExtractedFact> {
        let concept = concept.trim();
        if concept.is_empty() {
            return None;
        }

        let folded = concept.to_lowercase();
        let mut retained: Option<ExtractedFact> = None;
        for (i, stage) in STAGES.iter().enumerate() {
            for node in document.folded_candidates(*stage, folded.as_str()) {
                match self.evaluate(document, node, concept) {
                    Candidate::Resolved(fact) => {
                        debug!(concept, stage = i + 1, "Direct match");
                        return Some(fact);
                    }
                    Candidate::Unparsed(fact) => {
                        debug!(concept, raw = %fact.raw_value, "Numeric text did not parse, keeping as text");
                        retained.get_or_insert(fact);
                    }
                    Candidate::Skipped => {}
                }
            }

            // Tier boundary: a retained text fact wins over later tiers
            let tier_done = STAGES
                .get(i + 1)
                .map(|next| next.tier != stage.tier)
                .unwrap_or(true);
            if tier_done && retained.is_some() {
                return retained;
            }
        }
        None
    }

    fn evaluate(&self, document: &TaggedDocument<'_>, node: &FactNode, concept: &str) -> Candidate {
        let raw = node.content.trim();
        if self.placeholders.is_placeholder(raw) {
            return Candidate::Skipped;
        }

        match node.kind {
            NodeKind::Text => {
                let mut fact = ExtractedFact::text(concept, raw, FactSource::DirectPattern);
                fact.context_ref = node.context_ref().map(str::to_string);
                fact.period = node
                    .context_ref()
                    .and_then(|c| document.index().period(c))
                    .map(str::to_string);
                Candidate::Resolved(fact)
            }
            NodeKind::Numeric => match parse_display_number(raw, node.is_negated()) {
                Ok(number) => {
                    let scale = node.scale();
                    let Some(value) = apply_scale(number, scale) else {
                        debug!(concept, raw, scale, "Scale out of range, skipping");
                        return Candidate::Skipped;
                    };
                    let context_ref = node.context_ref().map(str::to_string);
                    let period = node
                        .context_ref()
                        .and_then(|c| document.index().period(c))
                        .map(str::to_string);
                    let unit = match node.unit_ref() {
                        Some(unit_ref) => document
                            .index()
                            .unit(unit_ref)
                            .unwrap_or(unit_ref)
                            .to_string(),
                        None => self.default_unit.clone(),
                    };
                    Candidate::Resolved(ExtractedFact {
                        concept: concept.to_string(),
                        value: FactValue::Number(value),
                        raw_value: raw.to_string(),
                        unit: Some(unit),
                        period,
                        context_ref,
                        scale: Some(scale),
                        source: FactSource::DirectPattern,
                    })
                }
                Err(_) => Candidate::Unparsed(ExtractedFact::text(
                    concept,
                    raw,
                    FactSource::DirectPattern,
                )),
            },
        }
    }
}

impl Default for ConceptMatcher {
    fn default() -> Self {
        Self::new(PlaceholderPolicy::default(), "USD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(doc: &str, concept: &str) -> Option<ExtractedFact> {
        ConceptMatcher::default().extract(&TaggedDocument::scan(doc), concept)
    }

    #[test]
    fn test_name_tiers() {
        assert!(NameTier::Qualified.matches("us-gaap:Assets", "Assets"));
        assert!(NameTier::Qualified.matches("US-GAAP:ASSETS", "assets"));
        assert!(!NameTier::Qualified.matches("Assets", "Assets"));
        assert!(!NameTier::Qualified.matches("us-gaap:AssetsCurrent", "Assets"));
        assert!(!NameTier::Qualified.matches("us-gaap:OtherAssets", "Assets"));

        assert!(NameTier::Bare.matches("assets", "Assets"));
        assert!(!NameTier::Bare.matches("us-gaap:Assets", "Assets"));

        assert!(NameTier::Contains.matches("us-gaap:AssetsCurrent", "Assets"));
        assert!(!NameTier::Contains.matches("us-gaap:Liabilities", "Assets"));
    }

    #[test]
    fn test_stage_order() {
        let order: Vec<_> = STAGES.iter().map(|s| (s.tier, s.kind)).collect();
        assert_eq!(
            order,
            vec![
                (NameTier::Qualified, NodeKind::Numeric),
                (NameTier::Qualified, NodeKind::Text),
                (NameTier::Bare, NodeKind::Numeric),
                (NameTier::Bare, NodeKind::Text),
                (NameTier::Contains, NodeKind::Numeric),
                (NameTier::Contains, NodeKind::Text),
            ]
        );
    }

    #[test]
    fn test_attribute_parsing() {
        let doc = TaggedDocument::scan(
            r#"<ix:nonFraction unitRef='usd' name="us-gaap:Assets" contextRef="c1" scale="6" sign="-" decimals="-6">1</ix:nonFraction>"#,
        );
        let node = &doc.nodes(NodeKind::Numeric)[0];
        assert_eq!(node.name(), Some("us-gaap:Assets"));
        assert_eq!(node.context_ref(), Some("c1"));
        assert_eq!(node.unit_ref(), Some("usd"));
        assert_eq!(node.attr("CONTEXTREF"), Some("c1"));
        assert_eq!(node.scale(), 6);
        assert!(node.is_negated());
    }

    #[test]
    fn test_nested_markup_is_not_a_candidate() {
        let doc = TaggedDocument::scan(
            r#"<ix:nonNumeric name="dei:DocumentType"><span>10-K</span></ix:nonNumeric>"#,
        );
        assert!(doc.nodes(NodeKind::Text).is_empty());
    }

    #[test]
    fn test_qualified_beats_bare() {
        let doc = r#"
            <ix:nonFraction name="Revenues">1</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Revenues">2</ix:nonFraction>
        "#;
        assert_eq!(extract(doc, "Revenues").unwrap().value, FactValue::Number(2.0));
    }

    #[test]
    fn test_text_in_qualified_tier_beats_numeric_in_bare_tier() {
        let doc = r#"
            <ix:nonFraction name="DocumentPeriodEndDate">7</ix:nonFraction>
            <ix:nonNumeric name="dei:DocumentPeriodEndDate">September 30, 2023</ix:nonNumeric>
        "#;
        let fact = extract(doc, "DocumentPeriodEndDate").unwrap();
        assert_eq!(fact.value, FactValue::Text("September 30, 2023".to_string()));
        assert!(fact.unit.is_none());
        assert!(fact.scale.is_none());
    }

    #[test]
    fn test_placeholders_are_skipped_within_stage() {
        let doc = r#"
            <ix:nonFraction name="us-gaap:Goodwill">—</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Goodwill">--</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Goodwill"> </ix:nonFraction>
            <ix:nonFraction name="us-gaap:Goodwill">--06-30</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Goodwill">1,500</ix:nonFraction>
        "#;
        let fact = extract(doc, "Goodwill").unwrap();
        assert_eq!(fact.value, FactValue::Number(1_500.0));
        assert_eq!(fact.raw_value, "1,500");
    }

    #[test]
    fn test_only_placeholders_yield_nothing() {
        let doc = r#"<ix:nonFraction name="us-gaap:Goodwill">—</ix:nonFraction>"#;
        assert!(extract(doc, "Goodwill").is_none());
    }

    #[test]
    fn test_unparsed_numeric_is_retained_until_tier_ends() {
        let doc = r#"
            <ix:nonFraction name="us-gaap:InventoryNet">n/a</ix:nonFraction>
            <ix:nonFraction name="us-gaap:InventoryNet">see note</ix:nonFraction>
            <ix:nonFraction name="InventoryNet">99</ix:nonFraction>
        "#;
        let fact = extract(doc, "InventoryNet").unwrap();
        assert_eq!(fact.value, FactValue::Text("n/a".to_string()));
        assert_eq!(fact.source, FactSource::DirectPattern);
        assert!(fact.unit.is_none());
        assert!(fact.period.is_none());
        assert!(fact.scale.is_none());
    }

    #[test]
    fn test_later_parsed_value_in_same_tier_wins_over_retained() {
        let doc = r#"
            <ix:nonFraction name="us-gaap:InventoryNet">n/a</ix:nonFraction>
            <ix:nonFraction name="us-gaap:InventoryNet">(12)</ix:nonFraction>
        "#;
        assert_eq!(extract(doc, "InventoryNet").unwrap().value, FactValue::Number(-12.0));
    }

    #[test]
    fn test_contains_tier_is_last_resort() {
        let doc = r#"<ix:nonFraction name="us-gaap:AssetsCurrent" scale="3">10</ix:nonFraction>"#;
        let fact = extract(doc, "Assets").unwrap();
        assert_eq!(fact.value, FactValue::Number(10_000.0));
    }

    #[test]
    fn test_case_insensitive_tags_and_names() {
        let doc = r#"<IX:NONFRACTION NAME="US-GAAP:NETINCOMELOSS">42</IX:NONFRACTION>"#;
        assert_eq!(extract(doc, "NetIncomeLoss").unwrap().value, FactValue::Number(42.0));
    }

    #[test]
    fn test_units() {
        let doc = r#"
            <xbrli:unit id="usdPerShare"><xbrli:divide>
              <xbrli:unitNumerator><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unitNumerator>
              <xbrli:unitDenominator><xbrli:measure>xbrli:shares</xbrli:measure></xbrli:unitDenominator>
            </xbrli:divide></xbrli:unit>
            <ix:nonFraction name="us-gaap:EarningsPerShareBasic" unitRef="usdPerShare">6.16</ix:nonFraction>
            <ix:nonFraction name="us-gaap:CommonStockSharesOutstanding" unitRef="shares">15,550</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Revenues">1</ix:nonFraction>
        "#;
        assert_eq!(
            extract(doc, "EarningsPerShareBasic").unwrap().unit.as_deref(),
            Some("USD/shares")
        );
        assert_eq!(
            extract(doc, "CommonStockSharesOutstanding").unwrap().unit.as_deref(),
            Some("shares")
        );
        assert_eq!(extract(doc, "Revenues").unwrap().unit.as_deref(), Some("USD"));
    }

    #[test]
    fn test_out_of_range_scale_is_skipped() {
        let doc = r#"
            <ix:nonFraction name="us-gaap:Revenues" scale="-2147483648">5</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Revenues" scale="400">5</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Revenues" scale="306">99,999</ix:nonFraction>
            <ix:nonFraction name="us-gaap:Revenues" scale="3">7</ix:nonFraction>
        "#;
        let fact = extract(doc, "Revenues").unwrap();
        assert_eq!(fact.value, FactValue::Number(7_000.0));
        assert_eq!(fact.scale, Some(3));
    }

    #[test]
    fn test_out_of_range_scale_alone_yields_nothing() {
        let doc = r#"<ix:nonFraction name="us-gaap:Revenues" scale="-2147483648">5</ix:nonFraction>"#;
        assert!(extract(doc, "Revenues").is_none());

        let doc = r#"<ix:nonFraction name="us-gaap:Revenues" scale="400">5</ix:nonFraction>"#;
        assert!(extract(doc, "Revenues").is_none());
    }

    #[test]
    fn test_periods_come_from_scanned_index() {
        let doc = TaggedDocument::scan(
            r#"
            <xbrli:context id="FY23"><xbrli:period><xbrli:endDate>2023-09-30</xbrli:endDate></xbrli:period></xbrli:context>
            <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
            <ix:nonFraction name="us-gaap:Assets" contextRef="FY23" unitRef="usd">1</ix:nonFraction>
            <ix:nonNumeric name="dei:DocumentType" contextRef="FY23">10-K</ix:nonNumeric>
            <ix:nonFraction name="us-gaap:Liabilities" contextRef="FY22" unitRef="eur">2</ix:nonFraction>
            "#,
        );
        assert_eq!(doc.index().context_count(), 1);
        assert_eq!(doc.index().unit_count(), 1);

        let matcher = ConceptMatcher::default();
        let assets = matcher.extract(&doc, "Assets").unwrap();
        assert_eq!(assets.period.as_deref(), Some("2023-09-30"));
        assert_eq!(assets.unit.as_deref(), Some("USD"));
        let doc_type = matcher.extract(&doc, "DocumentType").unwrap();
        assert_eq!(doc_type.period.as_deref(), Some("2023-09-30"));
        // Unknown ids: no period, unit id kept verbatim
        let liabilities = matcher.extract(&doc, "Liabilities").unwrap();
        assert_eq!(liabilities.period, None);
        assert_eq!(liabilities.unit.as_deref(), Some("eur"));
    }

    #[test]
    fn test_candidates_fold_case_once() {
        let doc = TaggedDocument::scan(
            r#"
            <ix:nonFraction name="US-GAAP:Assets">1</ix:nonFraction>
            <ix:nonFraction name="us-gaap:AssetsCurrent">2</ix:nonFraction>
            <ix:nonFraction contextRef="c1">3</ix:nonFraction>
            "#,
        );
        let qualified: Vec<_> = doc.candidates(STAGES[0], "ASSETS").map(|n| n.content.as_str()).collect();
        assert_eq!(qualified, vec!["1"]);
        let contains: Vec<_> = doc.candidates(STAGES[4], "assets").map(|n| n.content.as_str()).collect();
        assert_eq!(contains, vec!["1", "2"]);
        assert_eq!(doc.candidates(STAGES[2], "Assets").count(), 0);
    }

    #[test]
    fn test_blank_concept() {
        assert!(extract(r#"<ix:nonFraction name="us-gaap:Assets">1</ix:nonFraction>"#, "  ").is_none());
    }
}
