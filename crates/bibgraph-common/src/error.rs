//! Error types shared across bibgraph crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BibgraphError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Graph endpoint error: {0}")]
    Graph(String),

    #[error("Could not find an unused identifier after {0} attempts")]
    IdentifierExhausted(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BibgraphError>;
