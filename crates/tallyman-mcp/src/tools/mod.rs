//! MCP tool implementations

mod concept;
mod concepts;
mod fact;
mod listing;
mod statement;

pub use concept::handle_get_concept;
pub use concepts::handle_get_concepts;
pub use listing::handle_discover_concepts;
pub use statement::handle_discover_statement;
