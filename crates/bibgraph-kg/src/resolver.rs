//! Entity resolution against the live graph.
//!
//! Free-text labels go through two stages: trimmed case-insensitive equality,
//! then (only when nothing matched exactly) case-insensitive containment of
//! the input within a candidate label. More than one hit at a stage is an
//! ambiguity: it is recorded for review and nothing is returned.
//!
//! Precise keys (ISSN for journals, DOI for articles) match only when exactly
//! one entity carries the key.

use bibgraph_common::entities::PreciseKey;
use bibgraph_common::{Category, Result};
use tracing::{debug, instrument, warn};

use crate::queries;
use crate::reconciliation::ReconciliationLog;
use crate::store::GraphStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelMatch {
    Unique(String),
    Ambiguous(Vec<String>),
    NoMatch,
}

impl LabelMatch {
    fn from_hits(hits: Vec<String>) -> Option<Self> {
        match hits.len() {
            0 => None,
            1 => hits.into_iter().next().map(LabelMatch::Unique),
            _ => Some(LabelMatch::Ambiguous(hits)),
        }
    }
}

/// Match `label` against `(n_number, label)` candidates.
pub fn match_candidates(label: &str, candidates: &[(String, String)]) -> LabelMatch {
    let wanted = label.trim().to_lowercase();
    if wanted.is_empty() {
        return LabelMatch::NoMatch;
    }

    let normalised: Vec<(&str, String)> = candidates
        .iter()
        .map(|(n, l)| (n.as_str(), l.trim().to_lowercase()))
        .collect();

    let exact = distinct_ids(normalised.iter().filter(|(_, l)| *l == wanted));
    if let Some(found) = LabelMatch::from_hits(exact) {
        return found;
    }

    let partial = distinct_ids(normalised.iter().filter(|(_, l)| l.contains(&wanted)));
    LabelMatch::from_hits(partial).unwrap_or(LabelMatch::NoMatch)
}

fn distinct_ids<'a>(hits: impl Iterator<Item = &'a (&'a str, String)>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for (n, _) in hits {
        if !ids.iter().any(|id| id == n) {
            ids.push(n.to_string());
        }
    }
    ids
}

pub struct EntityResolver<'a> {
    store: &'a dyn GraphStore,
    base_url: &'a str,
}

impl<'a> EntityResolver<'a> {
    pub fn new(store: &'a dyn GraphStore, base_url: &'a str) -> Self {
        Self { store, base_url }
    }

    /// Run the label stages without touching any log.
    #[instrument(skip(self))]
    pub async fn lookup_label(&self, label: &str, category: Category) -> Result<LabelMatch> {
        if label.trim().is_empty() {
            return Ok(LabelMatch::NoMatch);
        }
        let rows = self.store.select(&queries::labels_for_category(category)).await?;
        let candidates: Vec<(String, String)> = rows
            .iter()
            .filter_map(|row| {
                let n = row.get("n")?;
                let l = row.get("label")?;
                Some((queries::n_number_of(n, self.base_url), l.clone()))
            })
            .collect();
        debug!(candidates = candidates.len(), "Fetched labels");
        Ok(match_candidates(label, &candidates))
    }

    /// Label match; ambiguities are recorded in `log`. Lookup failures count as no match.
    pub async fn match_label(
        &self,
        label: &str,
        category: Category,
        log: &mut ReconciliationLog,
    ) -> Option<String> {
        match self.lookup_label(label, category).await {
            Ok(LabelMatch::Unique(n)) => Some(n),
            Ok(LabelMatch::Ambiguous(ids)) => {
                debug!(label, ?ids, "Ambiguous label");
                log.track_ambiguity(label, ids);
                None
            }
            Ok(LabelMatch::NoMatch) => None,
            Err(e) => {
                warn!(label, %category, error = %e, "Label lookup failed, treating as no match");
                None
            }
        }
    }

    /// Precise-key match. Zero or several hits are both "no confident match".
    #[instrument(skip(self))]
    pub async fn match_precise(&self, key: &str, category: Category) -> Option<String> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let query = match category.precise_key()? {
            PreciseKey::Issn => queries::journals_with_issn(key),
            PreciseKey::Doi  => queries::entities_with_doi(key, category),
        };

        let rows = match self.store.select(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Precise lookup failed, treating as no match");
                return None;
            }
        };

        let mut ids: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("n"))
            .map(|n| queries::n_number_of(n, self.base_url))
            .collect();
        ids.sort();
        ids.dedup();
        match ids.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        }
    }

    /// Label first, then the precise key if one is given.
    pub async fn resolve(
        &self,
        label: &str,
        precise: Option<&str>,
        category: Category,
        log: &mut ReconciliationLog,
    ) -> Option<String> {
        if let Some(n) = self.match_label(label, category, log).await {
            return Some(n);
        }
        match precise {
            Some(key) => self.match_precise(key, category).await,
            None => None,
        }
    }
}
