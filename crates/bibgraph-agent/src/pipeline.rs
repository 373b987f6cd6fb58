//! Ingestion run orchestration and the operator lookup command.

use anyhow::{Context, Result};
use bibgraph_common::{Category, Config};
use bibgraph_db::MirrorStore;
use bibgraph_ingestion::sources::pubmed::PubMedClient;
use bibgraph_ingestion::sources::{MetadataSource, SearchQuery};
use bibgraph_ingestion::{CitationParser, ParsedBatch};
use bibgraph_kg::{
    EntityResolver, GraphStore, GraphWriter, IdentifierGenerator, LabelMatch, ReconciliationLog,
    TripleHandler, VivoClient,
};
use tracing::{error, info, warn};

use crate::artifacts::RunArtifacts;

const WRITTEN_BY: &str = "bibgraph";

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Send updates to the graph.
    pub api: bool,
    /// Write the created triples as N-Triples.
    pub rdf: bool,
    /// Mirror the parsed batch into PostgreSQL.
    pub database: bool,
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub articles_found: usize,
    pub had_uploads: bool,
    /// Writer failure that cut reconciliation short. Reports were still written.
    pub failure: Option<anyhow::Error>,
}

/// Run against live PubMed and the configured VIVO instance.
pub async fn ingest(config: &Config, options: IngestOptions, artifacts: &RunArtifacts) -> Result<IngestOutcome> {
    let source = PubMedClient::new(&config.email, config.ncbi_api_key.clone())?;
    let store = VivoClient::new(
        &config.email,
        config.password.clone(),
        &config.query_endpoint,
        &config.update_endpoint,
    )?;
    ingest_with(&source, &store, config, options, artifacts).await
}

pub async fn ingest_with(
    source: &dyn MetadataSource,
    store: &dyn GraphStore,
    config: &Config,
    options: IngestOptions,
    artifacts: &RunArtifacts,
) -> Result<IngestOutcome> {
    artifacts
        .create_dirs()
        .with_context(|| format!("creating {}", artifacts.folder.display()))?;

    let handler = TripleHandler::new(options.api, &config.graph_name, Some(artifacts.output.clone()))?;

    let query = SearchQuery {
        term: config.search_query.clone(),
        window_days: config.search_window_days,
        max_results: config.max_results,
    };
    let response = source.search(&query).await.context("metadata search failed")?;
    info!("Articles found: {}", response.ids.len());
    handler.append_output(&format!("Articles found: {}", response.ids.len()))?;

    let batch = CitationParser::new().parse(&response.document);

    if options.database {
        mirror(config, &batch).await.context("mirror write failed")?;
    }

    let ids = IdentifierGenerator::new(config.max_identifier_attempts);
    let mut writer = GraphWriter::new(store, &config.upload_url, ids, handler);
    let mut log = ReconciliationLog::default();

    let failure = match writer.reconcile(&batch, &mut log).await {
        Ok(ids) => {
            info!(
                authors = ids.authors.len(),
                journals = ids.journals.len(),
                articles = ids.articles.len(),
                "Reconciliation complete"
            );
            None
        }
        Err(e) => {
            error!(error = %e, "Reconciliation aborted");
            writer.handler().append_output(&format!("Error\n{e}"))?;
            Some(anyhow::Error::new(e).context("reconciliation aborted"))
        }
    };

    let had_uploads = log
        .write_uploads(&artifacts.uploads)
        .with_context(|| format!("writing {}", artifacts.uploads.display()))?;
    log.write_disambiguation(&artifacts.disambiguation)
        .with_context(|| format!("writing {}", artifacts.disambiguation.display()))?;
    log.write_skips(&artifacts.skips)
        .with_context(|| format!("writing {}", artifacts.skips.display()))?;

    if options.rdf {
        writer.handler().write_rdf(&artifacts.rdf)?;
    }

    if !log.ambiguities().is_empty() {
        warn!(count = log.ambiguities().len(), "Ambiguous matches need review");
    }

    Ok(IngestOutcome {
        articles_found: response.ids.len(),
        had_uploads,
        failure,
    })
}

async fn mirror(config: &Config, batch: &ParsedBatch) -> Result<()> {
    let settings = config.mirror()?;
    let mut store = MirrorStore::connect(&settings).await?;
    store.prepare_tables().await?;
    store.write_batch(batch, WRITTEN_BY).await?;
    Ok(())
}

/// Look a label up in the live graph, optionally falling back to a precise key.
pub async fn resolve(config: &Config, category: Category, label: &str, key: Option<&str>) -> Result<()> {
    let store = VivoClient::new(
        &config.email,
        config.password.clone(),
        &config.query_endpoint,
        &config.update_endpoint,
    )?;
    let resolver = EntityResolver::new(&store, &config.upload_url);

    match resolver.lookup_label(label, category).await? {
        LabelMatch::Unique(n) => println!("{label}: {n}"),
        LabelMatch::Ambiguous(ids) => {
            println!("{label}: ambiguous");
            for n in ids {
                println!("    {n}");
            }
        }
        LabelMatch::NoMatch => {
            let by_key = match key {
                Some(k) => resolver.match_precise(k, category).await,
                None => None,
            };
            match by_key {
                Some(n) => println!("{label}: {n} (by key)"),
                None => println!("{label}: no match"),
            }
        }
    }
    Ok(())
}
