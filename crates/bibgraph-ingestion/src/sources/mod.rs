//! Metadata source clients.

pub mod pubmed;

use async_trait::async_trait;
use bibgraph_common::Result;

use crate::xml::XmlNode;

/// What to search for and how far back.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text search expression in the source's query syntax.
    pub term: String,
    /// Only records entered within this many days.
    pub window_days: u32,
    pub max_results: usize,
}

/// Raw search response: the matched record ids and the fetched document.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub ids: Vec<String>,
    pub document: XmlNode,
}

/// Common interface for bibliographic metadata sources.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse>;
}
