//! Context and unit resolution
//!
//! Facts point at their period and unit by id (`contextRef`, `unitRef`).
//! A [`DocumentIndex`] reads every context and unit block in one pass;
//! namespace prefixes on the block elements are optional. When two blocks
//! share an id, the first one counts.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tallyman_domain::ContextRecord;

static CONTEXT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?context\b([^>]*)>(.*?)</(?:[\w.-]+:)?context>")
        .expect("valid context block regex")
});

static UNIT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?unit\b([^>]*)>(.*?)</(?:[\w.-]+:)?unit>")
        .expect("valid unit block regex")
});

static ID_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bid\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid id regex")
});

static END_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?endDate\b[^>]*>\s*([^<]*?)\s*</(?:[\w.-]+:)?endDate>")
        .expect("valid endDate regex")
});

static INSTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?instant\b[^>]*>\s*([^<]*?)\s*</(?:[\w.-]+:)?instant>")
        .expect("valid instant regex")
});

static MEASURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?measure\b[^>]*>\s*([^<]*?)\s*</(?:[\w.-]+:)?measure>")
        .expect("valid measure regex")
});

static NUMERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?unitNumerator\b[^>]*>(.*?)</(?:[\w.-]+:)?unitNumerator>")
        .expect("valid unitNumerator regex")
});

static DENOMINATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?unitDenominator\b[^>]*>(.*?)</(?:[\w.-]+:)?unitDenominator>")
        .expect("valid unitDenominator regex")
});

/// `(id, body)` of every block matched by `re`, in document order
fn blocks<'t>(re: &'static Regex, document: &'t str) -> impl Iterator<Item = (&'t str, &'t str)> {
    re.captures_iter(document).filter_map(|caps| {
        let id = ID_ATTRIBUTE.captures(caps.get(1)?.as_str())?;
        let id = id.get(1).or_else(|| id.get(2))?.as_str();
        Some((id, caps.get(2)?.as_str()))
    })
}

/// Body of the first block with the given id
fn block_body<'t>(re: &'static Regex, document: &'t str, id: &str) -> Option<&'t str> {
    blocks(re, document).find(|(block_id, _)| *block_id == id).map(|(_, body)| body)
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve a context id to its period dates
///
/// Returns `None` when no block with that id exists.
pub fn resolve_context(document: &str, context_ref: &str) -> Option<ContextRecord> {
    block_body(&CONTEXT_BLOCK, document, context_ref).map(|body| context_record(context_ref, body))
}

fn context_record(id: &str, body: &str) -> ContextRecord {
    ContextRecord {
        id: id.to_string(),
        end_date: first_capture(&END_DATE, body),
        instant: first_capture(&INSTANT, body),
    }
}

/// Period (end date, else instant) for a context id
pub fn resolve_period(document: &str, context_ref: &str) -> Option<String> {
    resolve_context(document, context_ref).and_then(|ctx| ctx.period().map(str::to_string))
}

fn strip_prefix(measure: &str) -> &str {
    measure.rsplit(':').next().unwrap_or(measure)
}

fn render_measures(body: &str) -> Option<String> {
    let measures: Vec<&str> = MEASURE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_prefix(m.as_str()))
        .filter(|m| !m.is_empty())
        .collect();
    if measures.is_empty() {
        None
    } else {
        Some(measures.join("*"))
    }
}

/// Resolve a unit id to a display unit
///
/// `iso4217:USD` renders as `USD`; a divide renders as `USD/shares`.
pub fn resolve_unit(document: &str, unit_ref: &str) -> Option<String> {
    block_body(&UNIT_BLOCK, document, unit_ref).and_then(render_unit)
}

fn render_unit(body: &str) -> Option<String> {
    let numerator = NUMERATOR.captures(body).and_then(|c| c.get(1));
    let denominator = DENOMINATOR.captures(body).and_then(|c| c.get(1));
    if let (Some(num), Some(den)) = (numerator, denominator) {
        let num = render_measures(num.as_str())?;
        let den = render_measures(den.as_str())?;
        return Some(format!("{}/{}", num, den));
    }

    render_measures(body)
}

/// Contexts and units of one document, keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentIndex {
    contexts: HashMap<String, ContextRecord>,
    units: HashMap<String, Option<String>>,
}

impl DocumentIndex {
    /// Read every context and unit block of `document`
    pub fn build(document: &str) -> Self {
        let mut contexts = HashMap::new();
        for (id, body) in blocks(&CONTEXT_BLOCK, document) {
            contexts
                .entry(id.to_string())
                .or_insert_with(|| context_record(id, body));
        }

        let mut units = HashMap::new();
        for (id, body) in blocks(&UNIT_BLOCK, document) {
            units.entry(id.to_string()).or_insert_with(|| render_unit(body));
        }

        Self { contexts, units }
    }

    /// Context record for an id
    pub fn context(&self, context_ref: &str) -> Option<&ContextRecord> {
        self.contexts.get(context_ref)
    }

    /// Period (end date, else instant) for a context id
    pub fn period(&self, context_ref: &str) -> Option<&str> {
        self.context(context_ref).and_then(ContextRecord::period)
    }

    /// Display unit for a unit id
    pub fn unit(&self, unit_ref: &str) -> Option<&str> {
        self.units.get(unit_ref).and_then(|unit| unit.as_deref())
    }

    /// Number of distinct context ids
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Number of distinct unit ids
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}
