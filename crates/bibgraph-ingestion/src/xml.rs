//! Generic XML element tree.
//!
//! Source documents are read once into an `XmlNode` tree and then queried
//! with `lookup`, which walks a path of element names and yields `""` as soon
//! as any segment is missing. Citation fields that a record doesn't carry
//! therefore come back empty instead of failing the whole batch.

use bibgraph_common::{BibgraphError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const DOCUMENT: &str = "#document";

#[derive(Debug, Clone, PartialEq)]
pub enum XmlContent {
    Text(String),
    Element(XmlNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub content: Vec<XmlContent>,
}

impl XmlNode {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new(), content: Vec::new() }
    }

    /// An empty document, as returned for searches without hits.
    pub fn empty_document() -> Self {
        Self::new(DOCUMENT)
    }

    /// Parse an XML string. The returned node is a synthetic document root
    /// whose children are the top-level elements.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = vec![XmlNode::empty_document()];

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(element(e)?),
                Ok(Event::Empty(ref e)) => {
                    let node = element(e)?;
                    push_content(&mut stack, XmlContent::Element(node));
                }
                Ok(Event::End(_)) => {
                    if stack.len() > 1 {
                        if let Some(node) = stack.pop() {
                            push_content(&mut stack, XmlContent::Element(node));
                        }
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| BibgraphError::Xml(err.to_string()))?;
                    // Whitespace between inline elements separates words; before any
                    // content it is only indentation.
                    if !text.trim().is_empty() || has_content(&stack) {
                        push_content(&mut stack, XmlContent::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_content(&mut stack, XmlContent::Text(text));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(BibgraphError::Xml(format!(
                        "at byte {}: {e}",
                        reader.buffer_position()
                    )))
                }
                _ => {}
            }
        }

        // Close anything left open by a truncated document.
        while stack.len() > 1 {
            if let Some(node) = stack.pop() {
                push_content(&mut stack, XmlContent::Element(node));
            }
        }
        stack.pop().ok_or_else(|| BibgraphError::Xml("empty document".into()))
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlNode> {
        self.content.iter().filter_map(|c| match c {
            XmlContent::Element(node) => Some(node),
            XmlContent::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children().filter(move |c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children().find(|c| c.name == name)
    }

    /// Follow a path of element names, taking the first match at each step.
    pub fn find(&self, path: &[&str]) -> Option<&XmlNode> {
        path.iter().try_fold(self, |node, segment| node.child(segment))
    }

    /// Text of the element at `path`, or `""` when any segment is absent.
    pub fn lookup(&self, path: &[&str]) -> String {
        self.find(path).map(|n| n.text().trim().to_string()).unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All text content, including text inside inline child elements.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for c in &self.content {
            match c {
                XmlContent::Text(t) => out.push_str(t),
                XmlContent::Element(node) => node.collect_text(out),
            }
        }
    }
}

fn element(start: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| BibgraphError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| BibgraphError::Xml(e.to_string()))?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn has_content(stack: &[XmlNode]) -> bool {
    stack.last().is_some_and(|top| !top.content.is_empty())
}

fn push_content(stack: &mut [XmlNode], content: XmlContent) {
    if let Some(top) = stack.last_mut() {
        top.content.push(content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<!DOCTYPE PubmedArticleSet>
<Root>
  <Article>
    <ArticleTitle>The <i>KRAS</i> story &amp; more</ArticleTitle>
    <ELocationID EIdType="pii">S0001</ELocationID>
    <ELocationID EIdType="doi">10.1000/xyz</ELocationID>
    <Empty/>
  </Article>
</Root>"#;

    #[test]
    fn test_lookup_present_path() {
        let doc = XmlNode::parse(DOC).unwrap();
        assert_eq!(doc.lookup(&["Root", "Article", "ArticleTitle"]), "The KRAS story & more");
    }

    #[test]
    fn test_lookup_missing_segment_is_empty() {
        let doc = XmlNode::parse(DOC).unwrap();
        assert_eq!(doc.lookup(&["Root", "Nope", "ArticleTitle"]), "");
        assert_eq!(doc.lookup(&["Root", "Article", "Empty"]), "");
        assert_eq!(doc.lookup(&[]), doc.text().trim());
    }

    #[test]
    fn test_attributes_and_repeated_children() {
        let doc = XmlNode::parse(DOC).unwrap();
        let article = doc.find(&["Root", "Article"]).unwrap();
        let ids: Vec<_> = article
            .children_named("ELocationID")
            .map(|n| (n.attr("EIdType").unwrap_or(""), n.text()))
            .collect();
        assert_eq!(ids, vec![("pii", "S0001".to_string()), ("doi", "10.1000/xyz".to_string())]);
    }

    #[test]
    fn test_space_between_inline_elements_is_kept() {
        let doc = XmlNode::parse(
            "<ArticleTitle><i>Escherichia coli</i> <i>in vitro</i> growth.</ArticleTitle>",
        )
        .unwrap();
        assert_eq!(doc.lookup(&["ArticleTitle"]), "Escherichia coli in vitro growth.");

        let sup = XmlNode::parse("<T>CD4<sup>+</sup>\n<sub>x</sub> cells</T>").unwrap();
        assert_eq!(sup.lookup(&["T"]), "CD4+\nx cells");
    }

    #[test]
    fn test_indentation_does_not_leak_into_leaf_text() {
        let doc = XmlNode::parse(DOC).unwrap();
        let eloc = doc.find(&["Root", "Article", "ELocationID"]).unwrap();
        assert_eq!(eloc.text(), "S0001");
        assert_eq!(doc.find(&["Root", "Article", "Empty"]).unwrap().content, vec![]);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(XmlNode::parse("<a><b></a>").is_err());
    }
}
