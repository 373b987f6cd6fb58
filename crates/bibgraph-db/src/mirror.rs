//! Mirror writer.

use bibgraph_common::config::MirrorSettings;
use bibgraph_ingestion::{ParsedBatch, PublicationRecord};
use chrono::NaiveDateTime;
use secrecy::ExposeSecret;
use tokio_postgres::{Client, NoTls, Row, Transaction};
use tracing::{debug, error, info, instrument};

use crate::error::Result;
use crate::schema::{self, TABLE_AUTHORS, TABLE_JOURNALS, TABLE_PUBS, TABLE_PUB_AUTH, TABLE_PUB_JOURN};

/// What a keyed upsert has to do with an incoming row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    Insert,
    Update,
    Unchanged,
}

impl RowChange {
    pub fn between<T: PartialEq>(stored: Option<&T>, incoming: &T) -> Self {
        match stored {
            None => RowChange::Insert,
            Some(s) if s == incoming => RowChange::Unchanged,
            Some(_) => RowChange::Update,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl Tally {
    pub fn record(&mut self, change: RowChange) {
        match change {
            RowChange::Insert    => self.inserted += 1,
            RowChange::Update    => self.updated += 1,
            RowChange::Unchanged => self.unchanged += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub publications: Tally,
    pub journals: Tally,
    /// Rows actually inserted; existing rows are not counted.
    pub authors: u64,
    pub pub_authors: u64,
    pub pub_journals: u64,
}

/// Descriptive columns of `pubmed_pubs`, compared to decide on an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubColumns {
    pub doi: String,
    pub title: String,
    pub year: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    pub pub_type: String,
}

impl From<&PublicationRecord> for PubColumns {
    fn from(record: &PublicationRecord) -> Self {
        Self {
            doi: record.doi.clone(),
            title: record.title.clone(),
            year: record.year.clone(),
            volume: record.volume.clone(),
            issue: record.issue.clone(),
            pages: record.pages(),
            pub_type: record.pub_type.clone(),
        }
    }
}

impl PubColumns {
    fn from_row(row: &Row) -> Result<Self> {
        let text = |i: usize| -> Result<String> {
            Ok(row.try_get::<_, Option<String>>(i)?.unwrap_or_default())
        };
        Ok(Self {
            doi: text(0)?,
            title: text(1)?,
            year: text(2)?,
            volume: text(3)?,
            issue: text(4)?,
            pages: text(5)?,
            pub_type: text(6)?,
        })
    }
}

pub struct MirrorStore {
    client: Client,
}

impl MirrorStore {
    pub async fn connect(settings: &MirrorSettings<'_>) -> Result<Self> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(settings.host)
            .port(settings.port)
            .dbname(settings.database)
            .user(settings.user)
            .password(settings.password.expose_secret());

        let (client, connection) = config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Mirror connection closed with error");
            }
        });

        info!(host = settings.host, database = settings.database, "Connected to mirror");
        Ok(Self { client })
    }

    /// Create the mirror tables if they do not exist.
    pub async fn prepare_tables(&self) -> Result<()> {
        info!("Preparing mirror tables");
        self.client.batch_execute(schema::CREATE_TABLES).await?;
        Ok(())
    }

    /// Write a parsed batch in a single transaction. `written_by` names the tool
    /// recorded on inserted and updated rows.
    #[instrument(skip(self, batch), fields(publications = batch.publications.len()))]
    pub async fn write_batch(&mut self, batch: &ParsedBatch, written_by: &str) -> Result<MirrorSummary> {
        let now = chrono::Local::now().naive_local();
        let tx = self.client.transaction().await?;
        let mut summary = MirrorSummary::default();

        for record in batch.publications.iter().filter(|r| !r.pmid.is_empty()) {
            let change = upsert_publication(&tx, record, now, written_by).await?;
            summary.publications.record(change);
        }

        // Journals are keyed by ISSN here; those cited without one stay out.
        for journal in batch.journals.values().filter(|j| !j.issn.is_empty()) {
            let change = upsert_journal(&tx, &journal.issn, &journal.title, now, written_by).await?;
            summary.journals.record(change);
        }

        let insert_author = format!("INSERT INTO {TABLE_AUTHORS} (author) VALUES ($1) ON CONFLICT DO NOTHING");
        for author in &batch.authors {
            summary.authors += tx.execute(&insert_author, &[author]).await?;
        }

        let insert_pub_auth =
            format!("INSERT INTO {TABLE_PUB_AUTH} (pmid, auth) VALUES ($1, $2) ON CONFLICT DO NOTHING");
        for (pmid, authors) in &batch.pub_authors {
            for author in authors {
                summary.pub_authors += tx.execute(&insert_pub_auth, &[pmid, author]).await?;
            }
        }

        let insert_pub_journ =
            format!("INSERT INTO {TABLE_PUB_JOURN} (pmid, issn) VALUES ($1, $2) ON CONFLICT DO NOTHING");
        for (pmid, issn) in journal_links(batch) {
            summary.pub_journals += tx.execute(&insert_pub_journ, &[&pmid, &issn]).await?;
        }

        tx.commit().await?;
        info!(?summary, "Mirror write committed");
        Ok(summary)
    }
}

/// pmid → ISSN pairs for publications whose journal has an ISSN.
fn journal_links(batch: &ParsedBatch) -> impl Iterator<Item = (&str, &str)> {
    batch.pub_journals.iter().filter_map(move |(pmid, key)| {
        let issn = batch.journals.get(key)?.issn.as_str();
        (!issn.is_empty()).then_some((pmid.as_str(), issn))
    })
}

async fn upsert_publication(
    tx: &Transaction<'_>,
    record: &PublicationRecord,
    now: NaiveDateTime,
    written_by: &str,
) -> Result<RowChange> {
    let stored = tx
        .query_opt(
            &format!("SELECT doi, title, year, volume, issue, pages, type FROM {TABLE_PUBS} WHERE pmid = $1"),
            &[&record.pmid],
        )
        .await?
        .map(|row| PubColumns::from_row(&row))
        .transpose()?;

    let incoming = PubColumns::from(record);
    let change = RowChange::between(stored.as_ref(), &incoming);
    let c = &incoming;

    match change {
        RowChange::Insert => {
            tx.execute(
                &format!(
                    "INSERT INTO {TABLE_PUBS} \
                     (doi, title, year, volume, issue, pages, type, pmid, created_dt, modified_dt, written_by) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10)"
                ),
                &[&c.doi, &c.title, &c.year, &c.volume, &c.issue, &c.pages, &c.pub_type, &record.pmid, &now, &written_by],
            )
            .await?;
        }
        RowChange::Update => {
            debug!(pmid = %record.pmid, ?stored, "Publication changed");
            tx.execute(
                &format!(
                    "UPDATE {TABLE_PUBS} SET doi = $1, title = $2, year = $3, volume = $4, issue = $5, \
                     pages = $6, type = $7, modified_dt = $8, written_by = $9 WHERE pmid = $10"
                ),
                &[&c.doi, &c.title, &c.year, &c.volume, &c.issue, &c.pages, &c.pub_type, &now, &written_by, &record.pmid],
            )
            .await?;
        }
        RowChange::Unchanged => {}
    }
    Ok(change)
}

async fn upsert_journal(
    tx: &Transaction<'_>,
    issn: &str,
    title: &str,
    now: NaiveDateTime,
    written_by: &str,
) -> Result<RowChange> {
    let stored: Option<String> = tx
        .query_opt(&format!("SELECT title FROM {TABLE_JOURNALS} WHERE issn = $1"), &[&issn])
        .await?
        .map(|row| row.try_get::<_, Option<String>>(0))
        .transpose()?
        .map(Option::unwrap_or_default);

    let incoming = title.to_string();
    let change = RowChange::between(stored.as_ref(), &incoming);

    match change {
        RowChange::Insert => {
            tx.execute(
                &format!(
                    "INSERT INTO {TABLE_JOURNALS} (issn, title, created_dt, modified_dt, written_by) \
                     VALUES ($1, $2, $3, $3, $4)"
                ),
                &[&issn, &title, &now, &written_by],
            )
            .await?;
        }
        RowChange::Update => {
            debug!(issn, ?stored, "Journal title changed");
            tx.execute(
                &format!(
                    "UPDATE {TABLE_JOURNALS} SET title = $1, modified_dt = $2, written_by = $3 WHERE issn = $4"
                ),
                &[&title, &now, &written_by, &issn],
            )
            .await?;
        }
        RowChange::Unchanged => {}
    }
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibgraph_ingestion::JournalRecord;
    use std::collections::BTreeMap;

    #[test]
    fn test_row_change() {
        let a = PubColumns { title: "A".into(), ..Default::default() };
        let b = PubColumns { title: "B".into(), ..Default::default() };
        assert_eq!(RowChange::between(None, &a), RowChange::Insert);
        assert_eq!(RowChange::between(Some(&a), &a.clone()), RowChange::Unchanged);
        assert_eq!(RowChange::between(Some(&a), &b), RowChange::Update);
    }

    #[test]
    fn test_pub_columns_join_pages() {
        let record = PublicationRecord {
            pmid: "1".into(),
            title: "Parsing citations".into(),
            start_page: "123".into(),
            end_page: "130".into(),
            pub_type: "Letter".into(),
            ..Default::default()
        };
        let columns = PubColumns::from(&record);
        assert_eq!(columns.pages, "123-130");
        assert_eq!(columns.pub_type, "Letter");

        let single = PublicationRecord { start_page: "45".into(), end_page: String::new(), ..record };
        assert_eq!(PubColumns::from(&single).pages, "45");
    }

    #[test]
    fn test_journal_links_skip_journals_without_issn() {
        let batch = ParsedBatch {
            journals: BTreeMap::from([
                ("1234-5678".to_string(), JournalRecord { issn: "1234-5678".into(), title: "J One".into() }),
                ("J Two".to_string(), JournalRecord { issn: String::new(), title: "J Two".into() }),
            ]),
            pub_journals: BTreeMap::from([
                ("1".to_string(), "1234-5678".to_string()),
                ("2".to_string(), "J Two".to_string()),
                ("3".to_string(), "missing".to_string()),
            ]),
            ..Default::default()
        };
        assert_eq!(journal_links(&batch).collect::<Vec<_>>(), vec![("1", "1234-5678")]);
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        for change in [RowChange::Insert, RowChange::Insert, RowChange::Update, RowChange::Unchanged] {
            tally.record(change);
        }
        assert_eq!(tally, Tally { inserted: 2, updated: 1, unchanged: 1 });
    }
}
