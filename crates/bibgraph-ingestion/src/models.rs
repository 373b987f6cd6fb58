//! Flat records produced by the citation parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One publication as read from the metadata source. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub doi: String,
    pub title: String,
    pub year: String,
    pub volume: String,
    pub issue: String,
    pub start_page: String,
    pub end_page: String,
    /// First publication type listed for the record, e.g. "Journal Article".
    pub pub_type: String,
    pub pmid: String,
}

impl PublicationRecord {
    /// Page range as stored in the mirror ("start-end", or just "start").
    pub fn pages(&self) -> String {
        if self.end_page.is_empty() {
            self.start_page.clone()
        } else {
            format!("{}-{}", self.start_page, self.end_page)
        }
    }
}

/// A journal as cited. Either field may be empty, but not both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub issn: String,
    pub title: String,
}

/// Everything extracted from one search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedBatch {
    pub publications: Vec<PublicationRecord>,
    /// pmid → author display names, in order of appearance.
    pub pub_authors: BTreeMap<String, Vec<String>>,
    /// Unique author display names, first-seen order.
    pub authors: Vec<String>,
    /// Journal key → journal. The key is the ISSN, or the title for journals
    /// cited without one; the first title seen for a key wins.
    pub journals: BTreeMap<String, JournalRecord>,
    /// pmid → journal key.
    pub pub_journals: BTreeMap<String, String>,
}

impl ParsedBatch {
    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }
}
