//! Citation parsing.
//!
//! Turns a PubMed `efetch` document into flat publication records, the list
//! of author names, the journal map, and the publication→author /
//! publication→journal linkages.

use std::collections::btree_map::Entry;

use bibgraph_common::{non_empty, Author};
use tracing::{debug, warn};

use crate::models::{JournalRecord, ParsedBatch, PublicationRecord};
use crate::normalise::clean_name;
use crate::xml::XmlNode;

/// Name-cleaning collaborator applied to titles and name parts.
pub type NameCleaner = fn(&str) -> String;

pub struct CitationParser {
    cleaner: NameCleaner,
}

impl Default for CitationParser {
    fn default() -> Self { Self::new() }
}

impl CitationParser {
    pub fn new() -> Self {
        Self { cleaner: clean_name }
    }

    pub fn with_cleaner(cleaner: NameCleaner) -> Self {
        Self { cleaner }
    }

    /// Parse every `PubmedArticle/MedlineCitation` in the document.
    pub fn parse(&self, document: &XmlNode) -> ParsedBatch {
        let mut batch = ParsedBatch::default();

        let Some(set) = document.child("PubmedArticleSet") else {
            warn!(root = %document.name, "Document has no PubmedArticleSet");
            return batch;
        };

        for article in set.children_named("PubmedArticle") {
            match article.child("MedlineCitation") {
                Some(citation) => self.parse_citation(citation, &mut batch),
                None => warn!("PubmedArticle without MedlineCitation, skipping"),
            }
        }

        debug!(
            publications = batch.publications.len(),
            authors = batch.authors.len(),
            journals = batch.journals.len(),
            "Parsed citation batch"
        );
        batch
    }

    fn parse_citation(&self, citation: &XmlNode, batch: &mut ParsedBatch) {
        let clean = self.cleaner;
        let pmid = citation.lookup(&["PMID"]);
        if !pmid.is_empty() && batch.publications.iter().any(|p| p.pmid == pmid) {
            debug!(%pmid, "Duplicate citation in response, skipping");
            return;
        }
        let (start_page, end_page) = split_pages(&citation.lookup(&["Article", "Pagination", "MedlinePgn"]));

        let record = PublicationRecord {
            doi: extract_doi(citation),
            title: clean(&citation.lookup(&["Article", "ArticleTitle"])),
            year: citation.lookup(&["Article", "Journal", "JournalIssue", "PubDate", "Year"]),
            volume: citation.lookup(&["Article", "Journal", "JournalIssue", "Volume"]),
            issue: citation.lookup(&["Article", "Journal", "JournalIssue", "Issue"]),
            start_page,
            end_page,
            pub_type: citation.lookup(&["Article", "PublicationTypeList", "PublicationType"]),
            pmid: pmid.clone(),
        };

        if let Some(author_list) = citation.find(&["Article", "AuthorList"]) {
            for person in author_list.children_named("Author") {
                let last = clean(&person.lookup(&["LastName"]));
                let fore = clean(&person.lookup(&["ForeName"]));
                let Some(name) = author_name(&last, &fore) else {
                    continue;
                };

                if !batch.authors.contains(&name) {
                    batch.authors.push(name.clone());
                }
                let linked = batch.pub_authors.entry(pmid.clone()).or_default();
                if !linked.contains(&name) {
                    linked.push(name);
                }
            }
        }

        let journal = JournalRecord {
            issn: citation.lookup(&["Article", "Journal", "ISSN"]),
            title: clean(&citation.lookup(&["Article", "Journal", "Title"])),
        };
        match journal_key(&journal) {
            Some(key) => {
                if let Entry::Vacant(slot) = batch.journals.entry(key.clone()) {
                    slot.insert(journal);
                }
                batch.pub_journals.insert(pmid, key);
            }
            None => debug!(%pmid, "Citation names no journal"),
        }

        batch.publications.push(record);
    }
}

/// "Last, Fore" display name. Authors with neither part are dropped.
fn author_name(last: &str, fore: &str) -> Option<String> {
    let label = Author::from_parts(fore, "", last).label;
    (!label.is_empty()).then_some(label)
}

/// ISSN when the citation has one, otherwise the journal title.
pub fn journal_key(journal: &JournalRecord) -> Option<String> {
    non_empty(&journal.issn).or_else(|| non_empty(&journal.title))
}

/// First `ELocationID` tagged as a DOI, or empty.
fn extract_doi(citation: &XmlNode) -> String {
    citation
        .find(&["Article"])
        .and_then(|article| {
            article
                .children_named("ELocationID")
                .find(|loc| loc.attr("EIdType") == Some("doi"))
        })
        .map(|loc| loc.text().trim().to_string())
        .unwrap_or_default()
}

/// Split "123-130" into start and end. Anything that isn't exactly two
/// hyphen-separated parts is kept whole as the start page.
pub fn split_pages(pages: &str) -> (String, String) {
    let mut parts = pages.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(start), Some(end), None) => (start.to_string(), end.to_string()),
        _ => (pages.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn citation_xml(pmid: &str, body: &str) -> String {
        format!(
            "<PubmedArticle><MedlineCitation><PMID Version=\"1\">{pmid}</PMID>{body}</MedlineCitation></PubmedArticle>"
        )
    }

    fn parse(articles: &[String]) -> ParsedBatch {
        let xml = format!("<PubmedArticleSet>{}</PubmedArticleSet>", articles.join(""));
        CitationParser::new().parse(&XmlNode::parse(&xml).unwrap())
    }

    const FULL_ARTICLE: &str = r#"<Article>
        <Journal>
          <ISSN IssnType="Electronic">1234-5678</ISSN>
          <JournalIssue><Volume>12</Volume><Issue>3</Issue><PubDate><Year>2017</Year></PubDate></JournalIssue>
          <Title>Journal of Tests.</Title>
        </Journal>
        <ArticleTitle>Parsing   citations.</ArticleTitle>
        <Pagination><MedlinePgn>123-130</MedlinePgn></Pagination>
        <ELocationID EIdType="pii">S0001</ELocationID>
        <ELocationID EIdType="doi">10.1000/test.1</ELocationID>
        <AuthorList>
          <Author><LastName>Doe</LastName><ForeName>Jane</ForeName></Author>
          <Author><CollectiveName>Test Consortium</CollectiveName></Author>
          <Author><LastName>Roe</LastName></Author>
        </AuthorList>
        <PublicationTypeList>
          <PublicationType UI="D016428">Journal Article</PublicationType>
          <PublicationType UI="D013485">Research Support</PublicationType>
        </PublicationTypeList>
      </Article>"#;

    #[test]
    fn test_parse_full_citation() {
        let batch = parse(&[citation_xml("111", FULL_ARTICLE)]);

        assert_eq!(
            batch.publications,
            vec![PublicationRecord {
                doi: "10.1000/test.1".into(),
                title: "Parsing citations".into(),
                year: "2017".into(),
                volume: "12".into(),
                issue: "3".into(),
                start_page: "123".into(),
                end_page: "130".into(),
                pub_type: "Journal Article".into(),
                pmid: "111".into(),
            }]
        );
        assert_eq!(batch.authors, vec!["Doe, Jane".to_string(), "Roe".to_string()]);
        assert_eq!(batch.pub_authors["111"], vec!["Doe, Jane".to_string(), "Roe".to_string()]);
        assert_eq!(batch.journals["1234-5678"].title, "Journal of Tests");
        assert_eq!(batch.journals["1234-5678"].issn, "1234-5678");
        assert_eq!(batch.pub_journals["111"], "1234-5678");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let batch = parse(&[citation_xml("222", "<Article><ArticleTitle>Bare</ArticleTitle></Article>")]);
        let pub_ = &batch.publications[0];
        assert_eq!(pub_.doi, "");
        assert_eq!(pub_.year, "");
        assert_eq!(pub_.pub_type, "");
        assert_eq!(pub_.start_page, "");
        assert_eq!(pub_.end_page, "");
        assert!(batch.pub_authors.is_empty());
        assert!(batch.journals.is_empty());
        assert!(batch.pub_journals.is_empty());
    }

    #[test]
    fn test_authors_unique_across_batch_and_first_journal_title_wins() {
        let second = FULL_ARTICLE.replace("Journal of Tests.", "J Tests");
        let batch = parse(&[citation_xml("111", FULL_ARTICLE), citation_xml("333", &second)]);

        assert_eq!(batch.authors.len(), 2);
        assert_eq!(batch.pub_authors.len(), 2);
        assert_eq!(batch.journals.len(), 1);
        assert_eq!(batch.journals["1234-5678"].title, "Journal of Tests");
        assert_eq!(batch.pub_journals["333"], "1234-5678");
    }

    #[test]
    fn test_journal_without_issn_is_keyed_by_title() {
        let body = FULL_ARTICLE.replace(r#"<ISSN IssnType="Electronic">1234-5678</ISSN>"#, "");
        let batch = parse(&[citation_xml("555", &body)]);

        let journal = &batch.journals["Journal of Tests"];
        assert_eq!(journal.issn, "");
        assert_eq!(journal.title, "Journal of Tests");
        assert_eq!(batch.pub_journals["555"], "Journal of Tests");
    }

    #[test]
    fn test_duplicate_pmid_is_parsed_once() {
        let retitled = FULL_ARTICLE.replace("Parsing   citations.", "Parsing citations again");
        let batch = parse(&[citation_xml("111", FULL_ARTICLE), citation_xml("111", &retitled)]);

        assert_eq!(batch.publications.len(), 1);
        assert_eq!(batch.publications[0].title, "Parsing citations");
        assert_eq!(batch.pub_authors["111"].len(), 2);
    }

    #[test]
    fn test_title_with_inline_markup_keeps_word_breaks() {
        let body = "<Article><ArticleTitle><i>Escherichia coli</i> <i>in vitro</i> growth.</ArticleTitle>\
                    <PublicationTypeList><PublicationType>Journal Article</PublicationType></PublicationTypeList>\
                    </Article>";
        let batch = parse(&[citation_xml("444", body)]);
        assert_eq!(batch.publications[0].title, "Escherichia coli in vitro growth");
    }

    #[test]
    fn test_split_pages() {
        assert_eq!(split_pages("123-130"), ("123".to_string(), "130".to_string()));
        assert_eq!(split_pages("45"), ("45".to_string(), String::new()));
        assert_eq!(split_pages(""), (String::new(), String::new()));
        assert_eq!(split_pages("e1-e2-e3"), ("e1-e2-e3".to_string(), String::new()));
    }

    #[test]
    fn test_author_name_forms() {
        assert_eq!(author_name("Doe", "Jane").as_deref(), Some("Doe, Jane"));
        assert_eq!(author_name("Doe", "").as_deref(), Some("Doe"));
        assert_eq!(author_name("", "Jane").as_deref(), Some("Jane"));
        assert_eq!(author_name("", ""), None);
    }

    #[test]
    fn test_custom_cleaner_is_used() {
        fn upper(s: &str) -> String { s.to_uppercase() }
        let xml = format!("<PubmedArticleSet>{}</PubmedArticleSet>", citation_xml("1", FULL_ARTICLE));
        let batch = CitationParser::with_cleaner(upper).parse(&XmlNode::parse(&xml).unwrap());
        assert_eq!(batch.authors[0], "DOE, JANE");
    }

    #[test]
    fn test_document_without_article_set() {
        let batch = CitationParser::new().parse(&XmlNode::parse("<eSearchResult/>").unwrap());
        assert!(batch.is_empty());
    }
}
