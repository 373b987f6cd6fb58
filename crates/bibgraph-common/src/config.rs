//! Run configuration loaded from a YAML file.
//!
//! Credentials for the graph endpoint and the relational mirror are held as
//! `SecretString` so they never end up in logs.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::error::{BibgraphError, Result};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Account used against the graph's SPARQL API; also sent to NCBI as contact.
    #[serde(default)]
    pub email: String,

    #[serde(default = "empty_secret", deserialize_with = "secret")]
    pub password: SecretString,

    #[serde(default)]
    pub update_endpoint: String,

    #[serde(default)]
    pub query_endpoint: String,

    /// Namespace that identifiers are appended to, e.g. `http://vivo.example.edu/individual/`.
    #[serde(default)]
    pub upload_url: String,

    #[serde(default = "default_log_folder")]
    pub folder_for_logs: PathBuf,

    // ── Relational mirror ─────────────────────────────────────────────────
    pub database: Option<String>,
    pub database_port: Option<u16>,
    pub database_user: Option<String>,
    #[serde(default, deserialize_with = "optional_secret")]
    pub database_pw: Option<SecretString>,
    #[serde(default = "default_db_host")]
    pub database_host: String,

    // ── Metadata search ───────────────────────────────────────────────────
    #[serde(default = "default_search_query")]
    pub search_query: String,
    #[serde(default = "default_window_days")]
    pub search_window_days: u32,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    pub ncbi_api_key: Option<String>,

    // ── Graph writes ──────────────────────────────────────────────────────
    #[serde(default = "default_max_attempts")]
    pub max_identifier_attempts: u32,
    #[serde(default = "default_graph_name")]
    pub graph_name: String,
}

fn empty_secret() -> SecretString { SecretString::from(String::new()) }
fn default_log_folder() -> PathBuf { PathBuf::from("./") }
fn default_db_host() -> String { "localhost".to_string() }
fn default_search_query() -> String { "University of Florida[Affiliation]".to_string() }
fn default_window_days() -> u32 { 1 }
fn default_max_results() -> usize { 500 }
fn default_max_attempts() -> u32 { 50 }
fn default_graph_name() -> String {
    "http://vitro.mannlib.cornell.edu/default/vitro-kb-2".to_string()
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Connection settings for the relational mirror, present only when fully configured.
#[derive(Debug)]
pub struct MirrorSettings<'a> {
    pub host: &'a str,
    pub port: u16,
    pub database: &'a str,
    pub user: &'a str,
    pub password: &'a SecretString,
}

impl Config {
    /// Load and validate configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BibgraphError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| BibgraphError::Config(e.to_string()))
    }

    /// Check that every key needed to talk to the graph is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("email", self.email.as_str()),
            ("password", self.password.expose_secret()),
            ("update_endpoint", self.update_endpoint.as_str()),
            ("query_endpoint", self.query_endpoint.as_str()),
            ("upload_url", self.upload_url.as_str()),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
        if !missing.is_empty() {
            return Err(BibgraphError::Config(format!("missing keys: {}", missing.join(", "))));
        }

        for (key, value) in [
            ("update_endpoint", &self.update_endpoint),
            ("query_endpoint", &self.query_endpoint),
            ("upload_url", &self.upload_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| BibgraphError::Config(format!("{key} is not a valid URL: {e}")))?;
        }

        if self.max_identifier_attempts == 0 {
            return Err(BibgraphError::Config("max_identifier_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Mirror connection settings. Errors if any of the mirror keys is missing.
    pub fn mirror(&self) -> Result<MirrorSettings<'_>> {
        match (&self.database, self.database_port, &self.database_user, &self.database_pw) {
            (Some(database), Some(port), Some(user), Some(password)) => Ok(MirrorSettings {
                host: &self.database_host,
                port,
                database,
                user,
                password,
            }),
            _ => Err(BibgraphError::Config(
                "database, database_port, database_user and database_pw are required for the mirror".into(),
            )),
        }
    }
}
