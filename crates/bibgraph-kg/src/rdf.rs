//! RDF vocabulary and per-entity triple construction.

use std::fmt;

use bibgraph_common::{Article, Author, Entity, Journal};
use serde::Serialize;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

pub const BIBO_ISSN: &str = "http://purl.org/ontology/bibo/issn";
pub const BIBO_EISSN: &str = "http://purl.org/ontology/bibo/eissn";
pub const BIBO_DOI: &str = "http://purl.org/ontology/bibo/doi";
pub const BIBO_PMID: &str = "http://purl.org/ontology/bibo/pmid";
pub const BIBO_VOLUME: &str = "http://purl.org/ontology/bibo/volume";
pub const BIBO_ISSUE: &str = "http://purl.org/ontology/bibo/issue";
pub const BIBO_PAGE_START: &str = "http://purl.org/ontology/bibo/pageStart";
pub const BIBO_PAGE_END: &str = "http://purl.org/ontology/bibo/pageEnd";

pub const OBO_CONTACT_INFO: &str = "http://purl.obolibrary.org/obo/ARG_2000028";
pub const VCARD_INDIVIDUAL: &str = "http://www.w3.org/2006/vcard/ns#Individual";
pub const VCARD_HAS_NAME: &str = "http://www.w3.org/2006/vcard/ns#hasName";
pub const VCARD_NAME: &str = "http://www.w3.org/2006/vcard/ns#Name";
pub const VCARD_GIVEN_NAME: &str = "http://www.w3.org/2006/vcard/ns#givenName";
pub const VCARD_FAMILY_NAME: &str = "http://www.w3.org/2006/vcard/ns#familyName";

pub const VIVO_MIDDLE_NAME: &str = "http://vivoweb.org/ontology/core#middleName";
pub const VIVO_HAS_VENUE: &str = "http://vivoweb.org/ontology/core#hasPublicationVenue";
pub const VIVO_VENUE_FOR: &str = "http://vivoweb.org/ontology/core#publicationVenueFor";
pub const VIVO_DATE_TIME_VALUE: &str = "http://vivoweb.org/ontology/core#dateTimeValue";
pub const VIVO_DATE_TIME_VALUE_CLASS: &str = "http://vivoweb.org/ontology/core#DateTimeValue";
pub const VIVO_DATE_TIME: &str = "http://vivoweb.org/ontology/core#dateTime";
pub const VIVO_DATE_TIME_PRECISION: &str = "http://vivoweb.org/ontology/core#dateTimePrecision";
pub const VIVO_YEAR_PRECISION: &str = "http://vivoweb.org/ontology/core#yearPrecision";
pub const VIVO_AUTHORSHIP: &str = "http://vivoweb.org/ontology/core#Authorship";
pub const VIVO_RELATES: &str = "http://vivoweb.org/ontology/core#relates";
pub const VIVO_RELATED_BY: &str = "http://vivoweb.org/ontology/core#relatedBy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Object {
    Uri(String),
    Literal(String),
    Typed(String, &'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: &'static str,
    pub object: Object,
}

impl Triple {
    fn uri(subject: &str, predicate: &'static str, object: &str) -> Self {
        Self { subject: subject.to_string(), predicate, object: Object::Uri(object.to_string()) }
    }

    fn literal(subject: &str, predicate: &'static str, value: &str) -> Self {
        Self { subject: subject.to_string(), predicate, object: Object::Literal(value.to_string()) }
    }
}

/// Escape a value for use inside a double-quoted SPARQL / N-Triples literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"'  => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _    => out.push(c),
        }
    }
    out
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> <{}> ", self.subject, self.predicate)?;
        match &self.object {
            Object::Uri(uri) => write!(f, "<{uri}>")?,
            Object::Literal(v) => write!(f, "\"{}\"", escape_literal(v))?,
            Object::Typed(v, datatype) => write!(f, "\"{}\"^^<{datatype}>", escape_literal(v))?,
        }
        f.write_str(" .")
    }
}

pub fn node_uri(base_url: &str, n_number: &str) -> String {
    format!("{base_url}{n_number}")
}

/// Extra graph nodes an entity needs besides its own, e.g. vcard records.
pub fn aux_node_count(entity: &Entity) -> usize {
    match entity {
        Entity::Author(_) => 2,
        Entity::Article(a) if year_date_time(a).is_some() => 1,
        _ => 0,
    }
}

/// Build the triples that create `entity` at its node under `base_url`. `aux`
/// holds the URIs of the extra nodes reported by `aux_node_count`. `None`
/// until the entity has been given an identifier.
pub fn entity_triples(entity: &Entity, base_url: &str, aux: &[String]) -> Option<Vec<Triple>> {
    let subject = &node_uri(base_url, entity.n_number()?);
    let mut triples = vec![Triple::uri(subject, RDF_TYPE, entity.category().rdf_class())];
    if !entity.label().is_empty() {
        triples.push(Triple::literal(subject, RDFS_LABEL, entity.label()));
    }

    match entity {
        Entity::Author(author) => person_triples(author, subject, aux, &mut triples),
        Entity::Journal(journal) => journal_triples(journal, subject, &mut triples),
        Entity::Article(article) => article_triples(article, subject, base_url, aux, &mut triples),
        Entity::Publisher(_) | Entity::Thing(_) => {}
    }
    Some(triples)
}

fn person_triples(author: &Author, subject: &str, aux: &[String], triples: &mut Vec<Triple>) {
    let [vcard, name] = match aux {
        [vcard, name, ..] => [vcard, name],
        _ => return,
    };
    triples.push(Triple::uri(subject, OBO_CONTACT_INFO, vcard));
    triples.push(Triple::uri(vcard, RDF_TYPE, VCARD_INDIVIDUAL));
    triples.push(Triple::uri(vcard, VCARD_HAS_NAME, name));
    triples.push(Triple::uri(name, RDF_TYPE, VCARD_NAME));
    if let Some(first) = &author.first {
        triples.push(Triple::literal(name, VCARD_GIVEN_NAME, first));
    }
    if let Some(middle) = &author.middle {
        triples.push(Triple::literal(name, VIVO_MIDDLE_NAME, middle));
    }
    if let Some(last) = &author.last {
        triples.push(Triple::literal(name, VCARD_FAMILY_NAME, last));
    }
}

fn journal_triples(journal: &Journal, subject: &str, triples: &mut Vec<Triple>) {
    if let Some(issn) = &journal.issn {
        triples.push(Triple::literal(subject, BIBO_ISSN, issn));
    }
}

fn article_triples(
    article: &Article,
    subject: &str,
    base_url: &str,
    aux: &[String],
    triples: &mut Vec<Triple>,
) {
    let fields = [
        (BIBO_VOLUME, &article.volume),
        (BIBO_ISSUE, &article.issue),
        (BIBO_DOI, &article.doi),
        (BIBO_PMID, &article.pmid),
        (BIBO_PAGE_START, &article.start_page),
        (BIBO_PAGE_END, &article.end_page),
    ];
    for (predicate, value) in fields {
        if let Some(value) = value {
            triples.push(Triple::literal(subject, predicate, value));
        }
    }

    if let (Some(date_time), Some(date_node)) = (year_date_time(article), aux.first()) {
        triples.push(Triple::uri(subject, VIVO_DATE_TIME_VALUE, date_node));
        triples.push(Triple::uri(date_node, RDF_TYPE, VIVO_DATE_TIME_VALUE_CLASS));
        triples.push(Triple {
            subject: date_node.clone(),
            predicate: VIVO_DATE_TIME,
            object: Object::Typed(date_time, XSD_DATE_TIME),
        });
        triples.push(Triple::uri(date_node, VIVO_DATE_TIME_PRECISION, VIVO_YEAR_PRECISION));
    }

    if let Some(journal_n) = &article.journal {
        let journal = node_uri(base_url, journal_n);
        triples.push(Triple::uri(subject, VIVO_HAS_VENUE, &journal));
        triples.push(Triple::uri(&journal, VIVO_VENUE_FOR, subject));
    }
}

/// Publication year as a year-precision xsd:dateTime, if it is a plain four-digit year.
fn year_date_time(article: &Article) -> Option<String> {
    article
        .publication_year
        .as_deref()
        .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        .map(|y| format!("{y}-01-01T00:00:00"))
}

/// Relationship node linking an author to an article.
pub fn authorship_triples(relation: &str, article: &str, author: &str) -> Vec<Triple> {
    vec![
        Triple::uri(relation, RDF_TYPE, VIVO_AUTHORSHIP),
        Triple::uri(relation, VIVO_RELATES, article),
        Triple::uri(relation, VIVO_RELATES, author),
        Triple::uri(article, VIVO_RELATED_BY, relation),
        Triple::uri(author, VIVO_RELATED_BY, relation),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibgraph_common::ArticleKind;

    const BASE: &str = "http://vivo.example.edu/individual/";

    #[test]
    fn test_triple_display_escapes_literals() {
        let t = Triple::literal("http://x/n1", RDFS_LABEL, "A \"quoted\" title");
        assert_eq!(
            t.to_string(),
            r#"<http://x/n1> <http://www.w3.org/2000/01/rdf-schema#label> "A \"quoted\" title" ."#
        );
    }

    #[test]
    fn test_person_triples_include_vcard_nodes() {
        let mut entity = Entity::Author(Author::from_display_name("Doe, Jane Q"));
        assert_eq!(aux_node_count(&entity), 2);
        let aux = vec![format!("{BASE}n2"), format!("{BASE}n3")];
        assert!(entity_triples(&entity, BASE, &aux).is_none());

        entity.assign_n_number("n1");
        let triples = entity_triples(&entity, BASE, &aux).unwrap();

        assert!(triples.contains(&Triple::uri(&format!("{BASE}n1"), RDF_TYPE, "http://xmlns.com/foaf/0.1/Person")));
        assert!(triples.contains(&Triple::literal(&format!("{BASE}n3"), VCARD_FAMILY_NAME, "Doe")));
        assert!(triples.contains(&Triple::literal(&format!("{BASE}n3"), VIVO_MIDDLE_NAME, "Q")));
    }

    #[test]
    fn test_article_triples_link_journal_and_year() {
        let mut article = Article::new(ArticleKind::Academic, "Parsing citations");
        article.publication_year = Some("2017".into());
        article.doi = Some("10.1000/test.1".into());
        article.journal = Some("n9".into());
        let mut entity = Entity::Article(article);
        entity.assign_n_number("n1");
        assert_eq!(aux_node_count(&entity), 1);

        let subject = format!("{BASE}n1");
        let triples = entity_triples(&entity, BASE, &[format!("{BASE}n5")]).unwrap();

        assert!(triples.contains(&Triple::uri(&subject, VIVO_HAS_VENUE, &format!("{BASE}n9"))));
        assert!(triples.contains(&Triple::uri(&format!("{BASE}n9"), VIVO_VENUE_FOR, &subject)));
        assert!(triples.contains(&Triple::literal(&subject, BIBO_DOI, "10.1000/test.1")));
        assert!(triples.iter().any(|t| t.object == Object::Typed("2017-01-01T00:00:00".into(), XSD_DATE_TIME)));
        assert!(!triples.iter().any(|t| t.predicate == BIBO_VOLUME));
    }

    #[test]
    fn test_article_without_numeric_year_has_no_date_node() {
        let mut article = Article::new(ArticleKind::Letter, "Reply");
        article.publication_year = Some("Spring".into());
        assert_eq!(aux_node_count(&Entity::Article(article)), 0);
    }
}
