use std::path::PathBuf;

use bibgraph_common::Category;
use clap::{ArgGroup, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bibgraph")]
#[command(about = "Ingest PubMed citations into a VIVO knowledge graph", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search PubMed and reconcile the results against the graph
    #[command(group(ArgGroup::new("mode").required(true).multiple(true).args(["api", "rdf"])))]
    Ingest {
        /// YAML configuration file
        config: PathBuf,

        /// Send updates to the graph
        #[arg(long)]
        api: bool,

        /// Write created triples to an N-Triples file
        #[arg(long)]
        rdf: bool,

        /// Mirror parsed records into PostgreSQL
        #[arg(long)]
        database: bool,
    },

    /// Look up an entity by label in the graph
    Resolve {
        /// YAML configuration file
        config: PathBuf,

        #[arg(long, value_parser = parse_category)]
        category: Category,

        /// ISSN or DOI to try when the label does not match
        #[arg(long)]
        key: Option<String>,

        label: String,
    },
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_str(s).ok_or_else(|| format!("unknown category: {s}"))
}
