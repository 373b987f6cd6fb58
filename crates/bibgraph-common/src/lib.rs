//! bibgraph-common — Shared entity types, errors, and configuration used across all bibgraph crates.

pub mod config;
pub mod entities;
pub mod error;

pub use config::Config;
pub use entities::{non_empty, Article, ArticleKind, Author, Category, Entity, Journal, Publisher, Thing};
pub use error::{BibgraphError, Result};
