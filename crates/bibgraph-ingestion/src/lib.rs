//! bibgraph-ingestion — Bibliographic metadata intake.
//! - Metadata search against PubMed E-utilities
//! - Generic XML document tree with safe nested lookup
//! - Citation parsing into flat publication/author/journal records
//! - Name cleaning

pub mod sources;
pub mod xml;
pub mod citation;
pub mod models;
pub mod normalise;

pub use citation::CitationParser;
pub use models::{JournalRecord, ParsedBatch, PublicationRecord};
pub use xml::XmlNode;
