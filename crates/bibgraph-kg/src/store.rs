//! Graph store access.
//!
//! `GraphStore` is the seam between reconciliation logic and the live graph:
//! a SELECT returning variable bindings, and an update statement. The VIVO
//! SPARQL API implementation sends both over HTTP with the account
//! credentials as request parameters.

use std::collections::HashMap;

use async_trait::async_trait;
use bibgraph_common::{BibgraphError, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

/// One result row: variable name → bound value.
pub type Row = HashMap<String, String>;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a SELECT query and return its result rows.
    async fn select(&self, query: &str) -> Result<Vec<Row>>;

    /// Run an update statement.
    async fn update(&self, statement: &str) -> Result<()>;
}

const SPARQL_JSON: &str = "application/sparql-results+json";

/// VIVO SPARQL query/update API client.
pub struct VivoClient {
    client: Client,
    email: String,
    password: SecretString,
    query_endpoint: String,
    update_endpoint: String,
}

impl VivoClient {
    pub fn new(
        email: impl Into<String>,
        password: SecretString,
        query_endpoint: impl Into<String>,
        update_endpoint: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            email: email.into(),
            password,
            query_endpoint: query_endpoint.into(),
            update_endpoint: update_endpoint.into(),
        })
    }
}

#[async_trait]
impl GraphStore for VivoClient {
    async fn select(&self, query: &str) -> Result<Vec<Row>> {
        info!("Query:\n{query}");
        let params = [
            ("email", self.email.as_str()),
            ("password", self.password.expose_secret()),
            ("query", query),
        ];

        let body: serde_json::Value = self.client
            .get(&self.query_endpoint)
            .header(reqwest::header::ACCEPT, SPARQL_JSON)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_bindings(&body)
    }

    async fn update(&self, statement: &str) -> Result<()> {
        info!("Update:\n{statement}");
        let params = [
            ("email", self.email.as_str()),
            ("password", self.password.expose_secret()),
            ("update", statement),
        ];

        let resp = self.client
            .post(&self.update_endpoint)
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BibgraphError::Graph(format!("update rejected ({status}): {body}")));
        }
        Ok(())
    }
}

/// Flatten a SPARQL JSON result into rows of plain values.
pub fn parse_bindings(body: &serde_json::Value) -> Result<Vec<Row>> {
    let bindings = body["results"]["bindings"]
        .as_array()
        .ok_or_else(|| BibgraphError::Graph("malformed SPARQL result: no bindings".into()))?;

    Ok(bindings
        .iter()
        .filter_map(|b| b.as_object())
        .map(|b| {
            b.iter()
                .filter_map(|(var, cell)| {
                    cell["value"].as_str().map(|v| (var.clone(), v.to_string()))
                })
                .collect()
        })
        .collect())
}
