//! Tallyman Domain Layer
//!
//! Core value types and collaborator interfaces for extracting financial facts
//! from archive filings. This crate has no external dependencies: it defines
//! what a fact is, which concepts the system knows about, and the trait
//! boundaries that infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **ExtractedFact**: a resolved value for one concept, tagged with the
//!   strategy that produced it
//! - **ConceptCatalog**: the fixed table of well-known concepts grouped by
//!   statement family
//! - **FilingRef**: the identity of one filing (filer CIK + accession number)
//! - **DocumentRepository / ParsedDocument**: the external collaborators that
//!   hand out raw filing text and structured fact views
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Infrastructure implementations live in other crates
//!   (`tallyman-archive` for the EDGAR archive, `tallyman-http` for transport)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod fact;
pub mod filing;
pub mod traits;

// Re-exports for convenience
pub use catalog::{ConceptSpec, StatementFamily, CONCEPT_CATALOG};
pub use fact::{ContextRecord, ExtractedFact, FactSource, FactValue, StructuredFact};
pub use filing::FilingRef;
pub use traits::{DocumentRepository, HandleCapabilities, ParsedDocument};
