//! bibgraph-db — optional PostgreSQL mirror of parsed citation batches.
//!
//! Publications are keyed by PMID and journals by ISSN: new rows are inserted,
//! changed rows updated with a fresh `modified_dt`, identical rows left alone.
//! Authors and link rows are insert-if-absent. A whole batch is written in one
//! transaction.

pub mod error;
pub mod schema;
pub mod mirror;

pub use error::{DbError, Result};
pub use mirror::{MirrorStore, MirrorSummary, RowChange, Tally};
