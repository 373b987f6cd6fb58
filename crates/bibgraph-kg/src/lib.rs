//! bibgraph-kg — Reconciliation of parsed citations against the knowledge graph.
//!
//! - `store`: graph query/update seam and the VIVO SPARQL API client
//! - `queries`: SPARQL SELECT statements used for lookups
//! - `rdf` / `templates`: entity → triples, INSERT DATA and N-Triples rendering
//! - `identifier`: unused n-number generation
//! - `resolver`: label and precise-key entity matching
//! - `writer`: creation of authors, journals, articles and authorships
//! - `reconciliation`: per-run log of created, ambiguous and skipped records

pub mod store;
pub mod queries;
pub mod rdf;
pub mod templates;
pub mod identifier;
pub mod resolver;
pub mod reconciliation;
pub mod writer;

pub use identifier::IdentifierGenerator;
pub use reconciliation::{ReconciliationLog, SkipRecord};
pub use resolver::{EntityResolver, LabelMatch};
pub use store::{GraphStore, Row, VivoClient};
pub use writer::{BatchIds, GraphWriter, TripleHandler};
