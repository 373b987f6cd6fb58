//! Per-run record of created entities, ambiguous matches and skipped publications.
//!
//! Owned by a single ingestion run and rendered into plain-text reports at the end.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

use bibgraph_common::Category;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEntry {
    pub category: Category,
    pub label: String,
    pub url: String,
}

/// A publication that was not written because its type maps to no graph class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub pmid: String,
    pub pub_type: String,
    pub title: String,
    /// Non-empty field values that would have been written.
    pub fields: Vec<(String, String)>,
    /// Author links that were attempted for the publication.
    pub authors: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ReconciliationLog {
    created: Vec<CreatedEntry>,
    ambiguities: BTreeMap<String, Vec<String>>,
    skips: BTreeMap<String, SkipRecord>,
}

impl ReconciliationLog {
    pub fn add_created(&mut self, category: Category, label: &str, url: &str) {
        self.created.push(CreatedEntry {
            category,
            label: label.to_string(),
            url: url.to_string(),
        });
    }

    /// Record competing candidates for a label. Repeated calls merge the candidate lists.
    pub fn track_ambiguity(&mut self, label: &str, candidates: Vec<String>) {
        let entry = self.ambiguities.entry(label.to_string()).or_default();
        for n in candidates {
            if !entry.contains(&n) {
                entry.push(n);
            }
        }
    }

    /// Append a newly created identifier to an existing ambiguity record.
    pub fn add_n_to_ambiguity(&mut self, label: &str, n_number: &str) {
        if let Some(entry) = self.ambiguities.get_mut(label) {
            if !entry.iter().any(|n| n == n_number) {
                entry.push(n_number.to_string());
            }
        }
    }

    pub fn track_skip(&mut self, record: SkipRecord) {
        self.skips.insert(record.pmid.clone(), record);
    }

    pub fn add_author_to_skip(&mut self, pmid: &str, author: &str) {
        if let Some(record) = self.skips.get_mut(pmid) {
            record.authors.push(author.to_string());
        }
    }

    pub fn is_skipped(&self, pmid: &str) -> bool {
        self.skips.contains_key(pmid)
    }

    /// Whether anything was created this run.
    pub fn has_uploads(&self) -> bool {
        !self.created.is_empty()
    }

    pub fn created(&self) -> &[CreatedEntry] {
        &self.created
    }

    pub fn ambiguities(&self) -> &BTreeMap<String, Vec<String>> {
        &self.ambiguities
    }

    pub fn skips(&self) -> &BTreeMap<String, SkipRecord> {
        &self.skips
    }

    // ── Reports ──────────────────────────────────────────────────────────────

    /// Created entities grouped under "Authors", "Journals", "Articles", "Other".
    pub fn render_uploads(&self) -> String {
        let mut sections: BTreeMap<u8, (&str, Vec<&CreatedEntry>)> = BTreeMap::new();
        for entry in &self.created {
            let (order, heading) = section_of(entry.category);
            sections.entry(order).or_insert((heading, Vec::new())).1.push(entry);
        }

        let mut out = String::new();
        for (heading, entries) in sections.values() {
            let _ = writeln!(out, "{heading}:");
            for e in entries {
                let _ = writeln!(out, "{}: {}", e.label, e.url);
            }
            out.push('\n');
        }
        out
    }

    /// Each ambiguous label followed by its candidate identifiers, one per line.
    pub fn render_disambiguation(&self) -> String {
        let mut out = String::new();
        for (label, candidates) in &self.ambiguities {
            let _ = writeln!(out, "{label}");
            for n in candidates {
                let _ = writeln!(out, "    {n}");
            }
            out.push('\n');
        }
        out
    }

    pub fn render_skips(&self) -> String {
        let mut out = String::new();
        for record in self.skips.values() {
            let _ = writeln!(out, "pmid: {}", record.pmid);
            let _ = writeln!(out, "type: {}", record.pub_type);
            let _ = writeln!(out, "title: {}", record.title);
            for (field, value) in &record.fields {
                let _ = writeln!(out, "{field}: {value}");
            }
            if !record.authors.is_empty() {
                out.push_str("authors:\n");
                for author in &record.authors {
                    let _ = writeln!(out, "    {author}");
                }
            }
            out.push('\n');
        }
        out
    }

    /// Write the upload log. Returns whether anything was created.
    pub fn write_uploads(&self, path: &Path) -> io::Result<bool> {
        std::fs::write(path, self.render_uploads())?;
        Ok(self.has_uploads())
    }

    pub fn write_disambiguation(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.render_disambiguation())
    }

    pub fn write_skips(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.render_skips())
    }
}

fn section_of(category: Category) -> (u8, &'static str) {
    match category {
        Category::Person => (0, "Authors"),
        Category::Journal => (1, "Journals"),
        c if c.is_article() => (2, "Articles"),
        _ => (3, "Other"),
    }
}
