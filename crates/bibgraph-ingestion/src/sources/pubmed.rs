//! PubMed E-utilities client.
//!
//! Endpoints used:
//!   esearch: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   efetch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi

use async_trait::async_trait;
use bibgraph_common::Result;
use reqwest::Client;
use tracing::{debug, info, instrument};

use super::{MetadataSource, SearchQuery, SearchResponse};
use crate::xml::XmlNode;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL:  &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";
const TOOL_NAME:   &str = "bibgraph";

pub struct PubMedClient {
    client: Client,
    email: String,
    api_key: Option<String>,
}

impl PubMedClient {
    /// `email` is sent with every request as the NCBI contact address.
    pub fn new(email: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("bibgraph/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, email: email.into(), api_key })
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("tool", TOOL_NAME.to_string()),
            ("email", self.email.clone()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Search PubMed and return a list of PMIDs.
    #[instrument(skip(self))]
    async fn esearch(&self, query: &SearchQuery) -> Result<Vec<String>> {
        let mut params = self.base_params();
        params.push(("term", query.term.clone()));
        params.push(("retmax", query.max_results.to_string()));
        params.push(("retmode", "json".to_string()));
        params.push(("datetype", "edat".to_string()));
        params.push(("reldate", query.window_days.to_string()));

        let resp: serde_json::Value = self.client
            .get(ESEARCH_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_esearch_ids(&resp))
    }

    /// Fetch full PubMed XML records for a list of PMIDs.
    #[instrument(skip(self, pmids), fields(count = pmids.len()))]
    async fn efetch(&self, pmids: &[String]) -> Result<XmlNode> {
        if pmids.is_empty() {
            return Ok(XmlNode::empty_document());
        }

        let mut params = self.base_params();
        params.push(("id", pmids.join(",")));
        params.push(("retmode", "xml".to_string()));

        // POST keeps long id lists out of the URL.
        let xml = self.client
            .post(EFETCH_URL)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        XmlNode::parse(&xml)
    }
}

#[async_trait]
impl MetadataSource for PubMedClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        info!(term = %query.term, window_days = query.window_days, "Searching PubMed");
        let ids = self.esearch(query).await?;
        info!(found = ids.len(), "PubMed search complete");
        let document = self.efetch(&ids).await?;
        Ok(SearchResponse { ids, document })
    }
}

fn parse_esearch_ids(resp: &serde_json::Value) -> Vec<String> {
    let ids: Vec<String> = resp["esearchresult"]["idlist"]
        .as_array()
        .map(|list| list.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    debug!(?ids, "PubMed esearch returned PMIDs");
    ids
}
