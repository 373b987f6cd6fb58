//! Graph identifier (n-number) generation.
//!
//! Candidates are random `n<digits>` strings checked against the live graph.
//! Retries are bounded: an endpoint that keeps failing or claims every
//! candidate is taken ends the run with `IdentifierExhausted`.

use bibgraph_common::{BibgraphError, Result};
use rand::Rng;
use tracing::{debug, warn};

use crate::queries;
use crate::rdf::node_uri;
use crate::store::GraphStore;

const MAX_SUFFIX: u64 = 9_999_999_999;

#[derive(Debug, Clone)]
pub struct IdentifierGenerator {
    max_attempts: u32,
}

impl Default for IdentifierGenerator {
    fn default() -> Self { Self::new(50) }
}

impl IdentifierGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1) }
    }

    /// Produce an n-number that the graph reports as unused.
    pub async fn generate(&self, store: &dyn GraphStore, base_url: &str) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = random_candidate();
            match is_in_use(store, base_url, &candidate).await {
                Ok(false) => {
                    debug!(n = %candidate, attempt, "Generated identifier");
                    return Ok(candidate);
                }
                Ok(true) => debug!(n = %candidate, attempt, "Identifier taken, retrying"),
                Err(e) => warn!(n = %candidate, attempt, error = %e, "Identifier check failed, retrying"),
            }
        }
        Err(BibgraphError::IdentifierExhausted(self.max_attempts))
    }
}

fn random_candidate() -> String {
    let suffix: u64 = rand::thread_rng().gen_range(1..=MAX_SUFFIX);
    format!("n{suffix}")
}

/// Whether the graph has any triple mentioning the n-number.
pub async fn is_in_use(store: &dyn GraphStore, base_url: &str, n_number: &str) -> Result<bool> {
    let rows = store.select(&queries::uri_in_use(&node_uri(base_url, n_number))).await?;
    Ok(!rows.is_empty())
}
