//! Tallyman Extractor
//!
//! Pulls named financial facts out of inline-tagged filings.
//!
//! # Overview
//!
//! Given a filing and a concept name (`NetIncomeLoss`, `Assets`, ...), the
//! extractor first scans the filing's own markup for the fact, normalizes
//! the display value, and resolves its period and unit. When the markup has
//! nothing usable it falls back to the repository's structured view of the
//! filing, then to the concept's reported history.
//!
//! # Architecture
//!
//! ```text
//! concept → FactExtractor → DocumentRepository → (text | parsed handle)
//!                 │
//!                 └─ matcher stages → normalize → context/unit
//! ```
//!
//! # Key Features
//!
//! - **Ordered matcher stages**: qualified, bare, then substring names;
//!   numeric before text within each
//! - **Placeholder skipping**: em-dashes, `--`, truncated dates
//! - **Provenance**: every fact records which strategy produced it
//! - **Bulk discovery**: one document fetch and one handle fetch per run
//!
//! # Example Usage
//!
//! ```
//! use tallyman_archive::MemoryRepository;
//! use tallyman_domain::{FactValue, FilingRef};
//! use tallyman_extractor::FactExtractor;
//!
//! let filing = FilingRef::new("320193", "0000320193-23-000106").unwrap();
//! let repository = MemoryRepository::new();
//! repository.insert_document(
//!     &filing,
//!     r#"<ix:nonFraction name="us-gaap:NetIncomeLoss" scale="6">96,995</ix:nonFraction>"#,
//! );
//!
//! let extractor = FactExtractor::with_defaults(repository);
//! let fact = extractor.extract_concept(&filing, "NetIncomeLoss").unwrap();
//! assert_eq!(fact.value, FactValue::Number(96_995_000_000.0));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod matcher;
pub mod normalize;
pub mod types;


pub use config::ExtractorConfig;
pub use context::DocumentIndex;
pub use error::{ExtractorError, NumberParseError};
pub use extractor::FactExtractor;
pub use matcher::{ConceptMatcher, MatcherStage, NameTier, NodeKind, TaggedDocument, STAGES};
pub use normalize::{apply_scale, parse_display_number, PlaceholderPolicy, MAX_SCALE};
pub use types::{ConceptDiscovery, ConceptListing, ConceptSummary};
