//! Rendering of triples into SPARQL INSERT DATA statements and N-Triples files.

use bibgraph_common::{BibgraphError, Result};
use minijinja::{context, Environment};

use crate::rdf::Triple;

const INSERT_DATA: &str = "\
INSERT DATA {
    GRAPH <{{ graph }}>
    {
{%- for triple in triples %}
        {{ triple }}
{%- endfor %}
    }
}
";

const NTRIPLES: &str = "{% for triple in triples %}{{ triple }}\n{% endfor %}";

pub struct UpdateTemplates {
    env: Environment<'static>,
}

impl UpdateTemplates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("insert_data.rq", INSERT_DATA).map_err(template_error)?;
        env.add_template("upload.nt", NTRIPLES).map_err(template_error)?;
        Ok(Self { env })
    }

    /// INSERT DATA statement adding `triples` to the named graph.
    pub fn insert_data(&self, graph: &str, triples: &[Triple]) -> Result<String> {
        self.render("insert_data.rq", graph, triples)
    }

    /// N-Triples document, one statement per line.
    pub fn ntriples(&self, triples: &[Triple]) -> Result<String> {
        self.render("upload.nt", "", triples)
    }

    fn render(&self, name: &str, graph: &str, triples: &[Triple]) -> Result<String> {
        let lines: Vec<String> = triples.iter().map(Triple::to_string).collect();
        self.env
            .get_template(name)
            .and_then(|t| t.render(context! { graph => graph, triples => lines }))
            .map_err(template_error)
    }
}

fn template_error(e: minijinja::Error) -> BibgraphError {
    BibgraphError::Graph(format!("template error: {e}"))
}
