//! Graph writer: creates unresolved authors, journals and articles and links
//! authors to articles.
//!
//! `TripleHandler` is the single exit point for update statements. It appends
//! each statement to the run's output log, sends it when running against the
//! API, and keeps the triples for an optional N-Triples dump.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use bibgraph_common::{
    non_empty, Article, ArticleKind, Author, BibgraphError, Category, Entity, Journal, Result,
};
use bibgraph_ingestion::{JournalRecord, ParsedBatch, PublicationRecord};
use tracing::{debug, info, instrument, warn};

use crate::identifier::IdentifierGenerator;
use crate::queries;
use crate::rdf::{authorship_triples, aux_node_count, entity_triples, node_uri, Triple};
use crate::reconciliation::{ReconciliationLog, SkipRecord};
use crate::resolver::EntityResolver;
use crate::store::GraphStore;
use crate::templates::UpdateTemplates;

// ---------------------------------------------------------------------------
// Triple handler
// ---------------------------------------------------------------------------

pub struct TripleHandler {
    send: bool,
    graph_name: String,
    output_log: Option<PathBuf>,
    templates: UpdateTemplates,
    collected: Vec<Triple>,
}

impl TripleHandler {
    /// `send` controls whether statements reach the graph; they are always
    /// rendered, logged and collected.
    pub fn new(send: bool, graph_name: impl Into<String>, output_log: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            send,
            graph_name: graph_name.into(),
            output_log,
            templates: UpdateTemplates::new()?,
            collected: Vec::new(),
        })
    }

    pub async fn update(&mut self, store: &dyn GraphStore, triples: Vec<Triple>) -> Result<()> {
        let statement = self.templates.insert_data(&self.graph_name, &triples)?;
        self.append_output(&statement)?;
        if self.send {
            store.update(&statement).await?;
        } else {
            info!("Update (not sent):\n{statement}");
        }
        self.collected.extend(triples);
        Ok(())
    }

    /// Append a line of text to the run's output log, if there is one.
    pub fn append_output(&self, text: &str) -> Result<()> {
        if let Some(path) = &self.output_log {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{text}")?;
        }
        Ok(())
    }

    pub fn collected(&self) -> &[Triple] {
        &self.collected
    }

    /// Write every triple produced this run as N-Triples.
    pub fn write_rdf(&self, path: &Path) -> Result<()> {
        let doc = self.templates.ntriples(&self.collected)?;
        std::fs::write(path, doc)?;
        info!(path = %path.display(), triples = self.collected.len(), "Wrote RDF");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Graph writer
// ---------------------------------------------------------------------------

/// Batch-scoped reconciliation maps: natural key → n-number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchIds {
    /// Author display name → n-number.
    pub authors: BTreeMap<String, String>,
    /// Journal key (ISSN, or title when there is none) → n-number.
    pub journals: BTreeMap<String, String>,
    /// PMID → n-number.
    pub articles: BTreeMap<String, String>,
}

pub struct GraphWriter<'a> {
    store: &'a dyn GraphStore,
    base_url: &'a str,
    ids: IdentifierGenerator,
    handler: TripleHandler,
}

impl<'a> GraphWriter<'a> {
    pub fn new(
        store: &'a dyn GraphStore,
        base_url: &'a str,
        ids: IdentifierGenerator,
        handler: TripleHandler,
    ) -> Self {
        Self { store, base_url, ids, handler }
    }

    pub fn handler(&self) -> &TripleHandler {
        &self.handler
    }

    pub fn into_handler(self) -> TripleHandler {
        self.handler
    }

    /// Resolve or create everything in the batch, then link authors to articles.
    pub async fn reconcile(&mut self, batch: &ParsedBatch, log: &mut ReconciliationLog) -> Result<BatchIds> {
        let authors = self.add_authors(&batch.authors, log).await?;
        let journals = self.add_journals(&batch.journals, log).await?;
        let articles = self
            .add_articles(&batch.publications, &batch.pub_journals, &journals, log)
            .await?;
        self.add_authors_to_pubs(&batch.pub_authors, &articles, &authors, log).await?;
        Ok(BatchIds { authors, journals, articles })
    }

    #[instrument(skip_all, fields(count = authors.len()))]
    pub async fn add_authors(
        &mut self,
        authors: &[String],
        log: &mut ReconciliationLog,
    ) -> Result<BTreeMap<String, String>> {
        let resolver = EntityResolver::new(self.store, self.base_url);
        let mut found = BTreeMap::new();

        for name in authors {
            if found.contains_key(name) {
                continue;
            }
            let n = match resolver.resolve(name, None, Category::Person, log).await {
                Some(n) => n,
                None => {
                    let entity = Entity::Author(Author::from_display_name(name));
                    self.create(entity, log).await?
                }
            };
            found.insert(name.clone(), n);
        }
        Ok(found)
    }

    /// Resolve journals by title, then ISSN. Keyed like the batch's journal map.
    #[instrument(skip_all, fields(count = journals.len()))]
    pub async fn add_journals(
        &mut self,
        journals: &BTreeMap<String, JournalRecord>,
        log: &mut ReconciliationLog,
    ) -> Result<BTreeMap<String, String>> {
        let resolver = EntityResolver::new(self.store, self.base_url);
        let mut found = BTreeMap::new();

        for (key, journal) in journals {
            let n = match resolver
                .resolve(&journal.title, Some(journal.issn.as_str()), Category::Journal, log)
                .await
            {
                Some(n) => n,
                None => {
                    let entity = Entity::Journal(Journal::new(&journal.title, &journal.issn));
                    self.create(entity, log).await?
                }
            };
            found.insert(key.clone(), n);
        }
        Ok(found)
    }

    /// Resolve articles by title, then DOI. Unsupported publication types are
    /// recorded as skips and never resolved or written. Keyed by PMID.
    #[instrument(skip_all, fields(count = publications.len()))]
    pub async fn add_articles(
        &mut self,
        publications: &[PublicationRecord],
        pub_journals: &BTreeMap<String, String>,
        journal_ids: &BTreeMap<String, String>,
        log: &mut ReconciliationLog,
    ) -> Result<BTreeMap<String, String>> {
        let resolver = EntityResolver::new(self.store, self.base_url);
        let mut found = BTreeMap::new();

        for record in publications {
            if found.contains_key(&record.pmid) || log.is_skipped(&record.pmid) {
                continue;
            }
            let Some(kind) = ArticleKind::from_publication_type(&record.pub_type) else {
                debug!(pmid = %record.pmid, pub_type = %record.pub_type, "Unsupported publication type");
                log.track_skip(skip_record(record));
                continue;
            };
            let category = kind.category();

            let n = match resolver.resolve(&record.title, Some(record.doi.as_str()), category, log).await {
                Some(n) => n,
                None => {
                    let journal = pub_journals
                        .get(&record.pmid)
                        .and_then(|key| journal_ids.get(key))
                        .cloned();
                    let article = article_from(record, kind, journal);
                    self.create(Entity::Article(article), log).await?
                }
            };
            found.insert(record.pmid.clone(), n);
        }
        Ok(found)
    }

    /// Link each publication's authors unless the authorship already exists.
    /// Links for skipped publications are recorded on the skip instead.
    #[instrument(skip_all)]
    pub async fn add_authors_to_pubs(
        &mut self,
        pub_authors: &BTreeMap<String, Vec<String>>,
        article_ids: &BTreeMap<String, String>,
        author_ids: &BTreeMap<String, String>,
        log: &mut ReconciliationLog,
    ) -> Result<()> {
        for (pmid, authors) in pub_authors {
            if log.is_skipped(pmid) {
                for author in authors {
                    log.add_author_to_skip(pmid, author);
                }
                continue;
            }
            let Some(article_n) = article_ids.get(pmid) else {
                warn!(%pmid, "No article for publication, skipping author links");
                continue;
            };
            let article = node_uri(self.base_url, article_n);

            for author in authors {
                let Some(author_n) = author_ids.get(author) else {
                    warn!(%pmid, %author, "Author not reconciled, skipping link");
                    continue;
                };
                let person = node_uri(self.base_url, author_n);

                let existing = self.store.select(&queries::authorships_between(&article, &person)).await?;
                if !existing.is_empty() {
                    debug!(%pmid, %author, "Authorship already present");
                    continue;
                }

                let relation_n = self.ids.generate(self.store, self.base_url).await?;
                let relation = node_uri(self.base_url, &relation_n);
                self.handler
                    .update(self.store, authorship_triples(&relation, &article, &person))
                    .await?;
            }
        }
        Ok(())
    }

    /// Mint identifiers for the entity and its auxiliary nodes, send its
    /// triples and record the creation.
    async fn create(&mut self, mut entity: Entity, log: &mut ReconciliationLog) -> Result<String> {
        let n = self.ids.generate(self.store, self.base_url).await?;
        if !entity.assign_n_number(n.as_str()) {
            return Err(BibgraphError::Graph(format!(
                "{} already has identifier {}",
                entity.label(),
                entity.n_number().unwrap_or_default()
            )));
        }

        let mut aux = Vec::with_capacity(aux_node_count(&entity));
        for _ in 0..aux_node_count(&entity) {
            let aux_n = self.ids.generate(self.store, self.base_url).await?;
            aux.push(node_uri(self.base_url, &aux_n));
        }

        let subject = node_uri(self.base_url, &n);
        let triples = entity_triples(&entity, self.base_url, &aux)
            .ok_or_else(|| BibgraphError::Graph(format!("{} has no identifier", entity.label())))?;
        self.handler.update(self.store, triples).await?;

        info!(category = %entity.category(), label = entity.label(), %n, "Created entity");
        debug!(%n, details = ?entity.details(), "Entity fields");
        log.add_created(entity.category(), entity.label(), &subject);
        log.add_n_to_ambiguity(entity.label(), &n);
        Ok(n)
    }
}

fn article_from(record: &PublicationRecord, kind: ArticleKind, journal: Option<String>) -> Article {
    let mut article = Article::new(kind, &record.title);
    article.volume = non_empty(&record.volume);
    article.issue = non_empty(&record.issue);
    article.publication_year = non_empty(&record.year);
    article.doi = non_empty(&record.doi);
    article.pmid = non_empty(&record.pmid);
    article.start_page = non_empty(&record.start_page);
    article.end_page = non_empty(&record.end_page);
    article.journal = journal;
    article
}

fn skip_record(record: &PublicationRecord) -> SkipRecord {
    let fields = [
        ("doi", &record.doi),
        ("year", &record.year),
        ("volume", &record.volume),
        ("issue", &record.issue),
        ("start_page", &record.start_page),
        ("end_page", &record.end_page),
    ];
    SkipRecord {
        pmid: record.pmid.clone(),
        pub_type: record.pub_type.clone(),
        title: record.title.clone(),
        fields: fields
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        authors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{RDFS_LABEL, RDF_TYPE};
    use crate::store::Row;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const BASE: &str = "http://vivo.example.edu/individual/";

    /// Tiny in-memory triple store that understands the statements this crate sends.
    #[derive(Default)]
    struct MemoryGraph {
        triples: Mutex<Vec<(String, String, String)>>,
        updates: Mutex<usize>,
    }

    impl MemoryGraph {
        fn seed(&self, s: &str, p: &str, o: &str) {
            self.triples.lock().unwrap().push((s.into(), p.into(), o.into()));
        }

        fn seed_person(&self, n: &str, label: &str) {
            let s = format!("{BASE}{n}");
            self.seed(&s, RDF_TYPE, "<http://xmlns.com/foaf/0.1/Person>");
            self.seed(&s, RDFS_LABEL, &format!("\"{label}\""));
        }

        fn update_count(&self) -> usize {
            *self.updates.lock().unwrap()
        }
    }

    fn parse_line(line: &str) -> Option<(String, String, String)> {
        let line = line.trim().strip_suffix(" .")?;
        let (s, rest) = line.split_once("> ")?;
        let (p, o) = rest.split_once("> ")?;
        Some((s.trim_start_matches('<').into(), p.trim_start_matches('<').into(), o.into()))
    }

    fn uris(query: &str) -> Vec<&str> {
        query.split('<').skip(1).filter_map(|s| s.split_once('>').map(|(u, _)| u)).collect()
    }

    #[async_trait]
    impl GraphStore for MemoryGraph {
        async fn select(&self, query: &str) -> Result<Vec<Row>> {
            let triples = self.triples.lock().unwrap();
            let has = |s: &str, p: &str, o: &str| triples.iter().any(|t| t.0 == s && t.1 == p && t.2 == o);
            let row = |pairs: &[(&str, &str)]| -> Row {
                pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
            };
            let u = uris(query);

            let rows = if query.starts_with("SELECT ?x") {
                let uri = u[0];
                let wrapped = format!("<{uri}>");
                triples
                    .iter()
                    .filter(|t| t.0 == uri || t.2 == wrapped)
                    .take(1)
                    .map(|t| row(&[("x", t.1.as_str())]))
                    .collect()
            } else if query.contains("?label") {
                let class = format!("<{}>", u[1]);
                triples
                    .iter()
                    .filter(|t| t.1 == RDFS_LABEL && has(&t.0, RDF_TYPE, &class))
                    .map(|t| row(&[("n", t.0.as_str()), ("label", t.2.trim_matches('"'))]))
                    .collect()
            } else if query.contains("?rel") {
                let (article, author) = (format!("<{}>", u[3]), format!("<{}>", u[5]));
                triples
                    .iter()
                    .filter(|t| t.1 == crate::rdf::VIVO_RELATES && t.2 == article)
                    .filter(|t| has(&t.0, crate::rdf::VIVO_RELATES, &author))
                    .map(|t| row(&[("rel", t.0.as_str())]))
                    .collect()
            } else {
                let key = query.split('"').nth(1).unwrap_or_default();
                let literal = format!("\"{key}\"");
                triples
                    .iter()
                    .filter(|t| t.2 == literal)
                    .map(|t| row(&[("n", t.0.as_str())]))
                    .collect()
            };
            Ok(rows)
        }

        async fn update(&self, statement: &str) -> Result<()> {
            *self.updates.lock().unwrap() += 1;
            let mut triples = self.triples.lock().unwrap();
            triples.extend(statement.lines().filter_map(parse_line));
            Ok(())
        }
    }

    fn record(pmid: &str, pub_type: &str, title: &str, doi: &str) -> PublicationRecord {
        PublicationRecord {
            pmid: pmid.into(),
            pub_type: pub_type.into(),
            title: title.into(),
            doi: doi.into(),
            year: "2017".into(),
            volume: "12".into(),
            ..Default::default()
        }
    }

    fn batch() -> ParsedBatch {
        ParsedBatch {
            publications: vec![
                record("1", "Journal Article", "Parsing citations", "10.1/a"),
                record("2", "Review", "A review of reviews", "10.1/r"),
            ],
            pub_authors: BTreeMap::from([
                ("1".to_string(), vec!["Doe, Jane".to_string(), "Roe, Richard".to_string()]),
                ("2".to_string(), vec!["Doe, Jane".to_string()]),
            ]),
            authors: vec!["Doe, Jane".into(), "Roe, Richard".into()],
            journals: BTreeMap::from([(
                "1234-5678".to_string(),
                JournalRecord { issn: "1234-5678".into(), title: "Journal of Things".into() },
            )]),
            pub_journals: BTreeMap::from([
                ("1".to_string(), "1234-5678".to_string()),
                ("2".to_string(), "1234-5678".to_string()),
            ]),
        }
    }

    fn writer(graph: &MemoryGraph, send: bool) -> GraphWriter<'_> {
        let handler = TripleHandler::new(send, "http://example.org/kb", None).unwrap();
        GraphWriter::new(graph, BASE, IdentifierGenerator::new(10), handler)
    }

    #[tokio::test]
    async fn test_first_run_creates_entities_and_links() {
        let graph = MemoryGraph::default();
        let mut log = ReconciliationLog::default();
        let ids = writer(&graph, true).reconcile(&batch(), &mut log).await.unwrap();

        let created: Vec<(Category, &str)> =
            log.created().iter().map(|e| (e.category, e.label.as_str())).collect();
        assert_eq!(
            created,
            vec![
                (Category::Person, "Doe, Jane"),
                (Category::Person, "Roe, Richard"),
                (Category::Journal, "Journal of Things"),
                (Category::AcademicArticle, "Parsing citations"),
            ]
        );
        // four entities plus two authorships
        assert_eq!(graph.update_count(), 6);
        assert_eq!(ids.articles.len(), 1);
        assert!(!ids.articles.contains_key("2"));

        let venue = format!("<{BASE}{}>", ids.journals["1234-5678"]);
        let article = format!("{BASE}{}", ids.articles["1"]);
        assert!(graph
            .triples
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.0 == article && t.1 == crate::rdf::VIVO_HAS_VENUE && t.2 == venue));
    }

    #[tokio::test]
    async fn test_journal_without_issn_still_gets_venue_link() {
        let graph = MemoryGraph::default();
        let mut log = ReconciliationLog::default();
        let mut batch = batch();
        batch.journals = BTreeMap::from([(
            "Journal of Things".to_string(),
            JournalRecord { issn: String::new(), title: "Journal of Things".into() },
        )]);
        batch.pub_journals = BTreeMap::from([("1".to_string(), "Journal of Things".to_string())]);

        let ids = writer(&graph, true).reconcile(&batch, &mut log).await.unwrap();

        let journal = format!("{BASE}{}", ids.journals["Journal of Things"]);
        let article = format!("{BASE}{}", ids.articles["1"]);
        let triples = graph.triples.lock().unwrap();
        assert!(!triples.iter().any(|t| t.0 == journal && t.1 == crate::rdf::BIBO_ISSN));
        assert!(triples
            .iter()
            .any(|t| t.0 == article && t.1 == crate::rdf::VIVO_HAS_VENUE && t.2 == format!("<{journal}>")));
    }

    #[test]
    fn test_article_fields_drop_blank_values() {
        let mut rec = record("7", "Letter", "Reply", "");
        rec.issue = "  ".into();
        let article = article_from(&rec, ArticleKind::Letter, Some("n9".into()));

        assert_eq!(article.doi, None);
        assert_eq!(article.issue, None);
        assert_eq!(article.volume.as_deref(), Some("12"));
        assert_eq!(article.pmid.as_deref(), Some("7"));
        assert_eq!(article.journal.as_deref(), Some("n9"));
    }

    #[tokio::test]
    async fn test_unsupported_type_is_skipped_with_its_authors() {
        let graph = MemoryGraph::default();
        let mut log = ReconciliationLog::default();
        writer(&graph, true).reconcile(&batch(), &mut log).await.unwrap();

        let skip = &log.skips()["2"];
        assert_eq!(skip.pub_type, "Review");
        assert_eq!(skip.authors, vec!["Doe, Jane".to_string()]);
        assert!(skip.fields.contains(&("doi".to_string(), "10.1/r".to_string())));
        assert!(!graph
            .triples
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.2.contains("A review of reviews")));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let graph = MemoryGraph::default();
        let mut first = ReconciliationLog::default();
        let first_ids = writer(&graph, true).reconcile(&batch(), &mut first).await.unwrap();
        let sent = graph.update_count();

        let mut second = ReconciliationLog::default();
        let second_ids = writer(&graph, true).reconcile(&batch(), &mut second).await.unwrap();

        assert_eq!(graph.update_count(), sent);
        assert!(!second.has_uploads());
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_ambiguous_author_is_created_and_recorded() {
        let graph = MemoryGraph::default();
        graph.seed_person("n1", "Doe, Jane");
        graph.seed_person("n2", "doe, jane ");
        let mut log = ReconciliationLog::default();

        let authors = writer(&graph, true)
            .add_authors(&["Doe, Jane".to_string()], &mut log)
            .await
            .unwrap();

        let created = &authors["Doe, Jane"];
        assert_ne!(created, "n1");
        assert_ne!(created, "n2");
        assert_eq!(log.ambiguities()["Doe, Jane"], vec!["n1".to_string(), "n2".to_string(), created.clone()]);
    }

    #[tokio::test]
    async fn test_existing_author_is_reused() {
        let graph = MemoryGraph::default();
        graph.seed_person("n1", "Doe, Jane Q");
        let mut log = ReconciliationLog::default();

        let authors = writer(&graph, true)
            .add_authors(&["Doe, Jane".to_string()], &mut log)
            .await
            .unwrap();
        assert_eq!(authors["Doe, Jane"], "n1");
        assert_eq!(graph.update_count(), 0);
    }

    #[tokio::test]
    async fn test_rdf_mode_collects_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output.txt");
        let graph = MemoryGraph::default();
        let handler = TripleHandler::new(false, "http://example.org/kb", Some(output.clone())).unwrap();
        let mut w = GraphWriter::new(&graph, BASE, IdentifierGenerator::new(10), handler);
        let mut log = ReconciliationLog::default();

        w.add_authors(&["Doe, Jane".to_string()], &mut log).await.unwrap();

        assert_eq!(graph.update_count(), 0);
        assert!(!w.handler().collected().is_empty());
        assert!(std::fs::read_to_string(&output).unwrap().starts_with("INSERT DATA {"));

        let rdf = dir.path().join("upload.rdf");
        w.into_handler().write_rdf(&rdf).unwrap();
        assert!(std::fs::read_to_string(&rdf).unwrap().contains("\"Doe, Jane\""));
    }
}
