//! SPARQL SELECT statements used by the identifier generator and the resolver.

use bibgraph_common::Category;

use crate::rdf::{
    escape_literal, BIBO_DOI, BIBO_EISSN, BIBO_ISSN, RDFS_LABEL, RDF_TYPE, VIVO_AUTHORSHIP,
    VIVO_RELATES,
};

/// Any triple mentioning `uri` as subject or object.
pub fn uri_in_use(uri: &str) -> String {
    format!("SELECT ?x WHERE {{ {{ <{uri}> ?p ?x }} UNION {{ ?x ?p <{uri}> }} }} LIMIT 1")
}

/// Every entity of a category with its label. Binds `?n` and `?label`.
pub fn labels_for_category(category: Category) -> String {
    format!(
        "SELECT ?n ?label WHERE {{ ?n <{RDF_TYPE}> <{class}> . ?n <{RDFS_LABEL}> ?label . }}",
        class = category.rdf_class()
    )
}

/// Journals carrying the given print or electronic ISSN. Binds `?n`.
pub fn journals_with_issn(issn: &str) -> String {
    let issn = escape_literal(issn);
    format!(
        "SELECT DISTINCT ?n WHERE {{ ?n <{RDF_TYPE}> <{class}> . \
         {{ ?n <{BIBO_ISSN}> \"{issn}\" }} UNION {{ ?n <{BIBO_EISSN}> \"{issn}\" }} }}",
        class = Category::Journal.rdf_class()
    )
}

/// Entities of a category carrying the given DOI. Binds `?n`.
pub fn entities_with_doi(doi: &str, category: Category) -> String {
    let doi = escape_literal(doi);
    format!(
        "SELECT DISTINCT ?n WHERE {{ ?n <{RDF_TYPE}> <{class}> . ?n <{BIBO_DOI}> \"{doi}\" . }}",
        class = category.rdf_class()
    )
}

/// Authorship nodes relating the article and the author. Binds `?rel`.
pub fn authorships_between(article: &str, author: &str) -> String {
    format!(
        "SELECT ?rel WHERE {{ ?rel <{RDF_TYPE}> <{VIVO_AUTHORSHIP}> . \
         ?rel <{VIVO_RELATES}> <{article}> . ?rel <{VIVO_RELATES}> <{author}> . }}"
    )
}

/// Convert a node URI back to its n-number: strip the graph namespace, or
/// fall back to the last path segment for URIs minted elsewhere.
pub fn n_number_of(uri: &str, base_url: &str) -> String {
    match uri.strip_prefix(base_url) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => uri.rsplit(['/', '#']).next().unwrap_or(uri).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doi_literal_is_escaped() {
        let q = entities_with_doi("10.1000/\"x\"", Category::AcademicArticle);
        assert!(q.contains(r#""10.1000/\"x\"""#));
        assert!(q.contains("http://purl.org/ontology/bibo/AcademicArticle"));
    }

    #[test]
    fn test_labels_query_targets_category_class() {
        let q = labels_for_category(Category::Person);
        assert!(q.contains("<http://xmlns.com/foaf/0.1/Person>"));
        assert!(q.contains("?label"));
    }

    #[test]
    fn test_n_number_of() {
        let base = "http://vivo.example.edu/individual/";
        assert_eq!(n_number_of("http://vivo.example.edu/individual/n42", base), "n42");
        assert_eq!(n_number_of("http://other.org/data/n7", base), "n7");
        assert_eq!(n_number_of("http://other.org/ns#thing", base), "thing");
    }
}
