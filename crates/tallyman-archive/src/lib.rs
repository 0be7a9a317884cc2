//! Tallyman Archive Layer
//!
//! Implementations of the `DocumentRepository` and `ParsedDocument` traits
//! from `tallyman-domain`.
//!
//! # Repositories
//!
//! - `EdgarArchive`: live SEC EDGAR access through the governed client
//! - `MemoryRepository`: in-memory filings for tests and embedders
//!
//! # Handles
//!
//! - `CompanyFactsHandle`: structured view over company-facts JSON
//! - `MemoryHandle`: scripted handle that records every query

#![warn(missing_docs)]

pub mod archive;
pub mod error;
pub mod facts;
pub mod memory;

pub use archive::{EdgarArchive, DEFAULT_API_BASE, DEFAULT_ARCHIVE_BASE};
pub use error::ArchiveError;
pub use facts::CompanyFactsHandle;
pub use memory::{MemoryHandle, MemoryRepository};
