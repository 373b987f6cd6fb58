//! Core entity types mirroring the target knowledge graph.
//! Every entity carries an optional graph identifier (its n-number), a label,
//! and a category tag selecting the RDF class it is written as.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Entity category. One variant per RDF class the writer creates, so the
/// variant is both the entity's type and its category tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Person,
    /// Type `journal`, category tag `venue`. Journals are the only venues
    /// written, so the two collapse into one variant; `from_str` accepts both.
    Journal,
    AcademicArticle,
    Letter,
    EditorialArticle,
    Publisher,
    Thing,
}

/// The external key checked when a label lookup finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreciseKey {
    Issn,
    Doi,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Person           => "person",
            Category::Journal          => "journal",
            Category::AcademicArticle  => "academic_article",
            Category::Letter           => "letter",
            Category::EditorialArticle => "editorial",
            Category::Publisher        => "publisher",
            Category::Thing            => "thing",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "person" | "author"                => Some(Category::Person),
            "journal" | "venue"                => Some(Category::Journal),
            "academic_article" | "article"     => Some(Category::AcademicArticle),
            "letter"                           => Some(Category::Letter),
            "editorial" | "editorial_article"  => Some(Category::EditorialArticle),
            "publisher"                        => Some(Category::Publisher),
            "thing"                            => Some(Category::Thing),
            _                                  => None,
        }
    }

    /// RDF class URI that entities of this category are typed with.
    pub fn rdf_class(&self) -> &'static str {
        match self {
            Category::Person           => "http://xmlns.com/foaf/0.1/Person",
            Category::Journal          => "http://purl.org/ontology/bibo/Journal",
            Category::AcademicArticle  => "http://purl.org/ontology/bibo/AcademicArticle",
            Category::Letter           => "http://purl.org/ontology/bibo/Letter",
            Category::EditorialArticle => "http://vivoweb.org/ontology/core#EditorialArticle",
            Category::Publisher        => "http://vivoweb.org/ontology/core#Publisher",
            Category::Thing            => "http://www.w3.org/2002/07/owl#Thing",
        }
    }

    /// Journals are keyed by ISSN, articles by DOI. Other categories only match on label.
    pub fn precise_key(&self) -> Option<PreciseKey> {
        match self {
            Category::Journal => Some(PreciseKey::Issn),
            Category::AcademicArticle
            | Category::Letter
            | Category::EditorialArticle => Some(PreciseKey::Doi),
            _ => None,
        }
    }

    pub fn is_article(&self) -> bool {
        matches!(self, Category::AcademicArticle | Category::Letter | Category::EditorialArticle)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Article kinds
// ---------------------------------------------------------------------------

/// Publication types that have a graph class. Anything else is skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArticleKind {
    Academic,
    Letter,
    Editorial,
}

impl ArticleKind {
    /// Map a source publication type to a supported kind.
    pub fn from_publication_type(pub_type: &str) -> Option<Self> {
        match pub_type {
            "Journal Article"        => Some(ArticleKind::Academic),
            "Letter"                 => Some(ArticleKind::Letter),
            "Editorial" | "Comment"  => Some(ArticleKind::Editorial),
            _                        => None,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ArticleKind::Academic  => Category::AcademicArticle,
            ArticleKind::Letter    => Category::Letter,
            ArticleKind::Editorial => Category::EditorialArticle,
        }
    }
}

/// Returns `Some` only for values that carry data.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

// ---------------------------------------------------------------------------
// Thing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Thing {
    n_number: Option<String>,
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Author
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Author {
    n_number: Option<String>,
    pub label: String,
    pub first: Option<String>,
    pub middle: Option<String>,
    pub last: Option<String>,
}

impl Author {
    /// Build an author from name parts. The label is "Last, First Middle" when a
    /// last name is present, otherwise whichever parts exist.
    pub fn from_parts(first: &str, middle: &str, last: &str) -> Self {
        let first = non_empty(first);
        let middle = non_empty(middle);
        let last = non_empty(last);
        let label = display_name(first.as_deref(), middle.as_deref(), last.as_deref());
        Self { n_number: None, label, first, middle, last }
    }

    /// Split a "Last, First Middle" display name back into parts.
    /// A name without a comma separator is treated as a last name only.
    pub fn from_display_name(name: &str) -> Self {
        let (last, first, middle) = match name.split_once(", ") {
            Some((last, rest)) => match rest.split_once(' ') {
                Some((first, middle)) => (last, first, middle),
                None => (last, rest, ""),
            },
            None => (name, "", ""),
        };
        Self {
            n_number: None,
            label: name.to_string(),
            first: non_empty(first),
            middle: non_empty(middle),
            last: non_empty(last),
        }
    }
}

fn display_name(first: Option<&str>, middle: Option<&str>, last: Option<&str>) -> String {
    match (last, first, middle) {
        (Some(l), Some(f), Some(m)) => format!("{l}, {f} {m}"),
        (Some(l), Some(f), None)    => format!("{l}, {f}"),
        (Some(l), None, Some(m))    => format!("{l}, {m}"),
        (Some(l), None, None)       => l.to_string(),
        (None, Some(f), Some(m))    => format!("{f} {m}"),
        (None, Some(f), None)       => f.to_string(),
        (None, None, Some(m))       => m.to_string(),
        (None, None, None)          => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Journal {
    n_number: Option<String>,
    pub label: String,
    pub issn: Option<String>,
}

impl Journal {
    pub fn new(label: &str, issn: &str) -> Self {
        Self { n_number: None, label: label.to_string(), issn: non_empty(issn) }
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    n_number: Option<String>,
    pub kind: ArticleKind,
    pub label: String,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub publication_year: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub start_page: Option<String>,
    pub end_page: Option<String>,
    /// Identifier of the journal the article was published in.
    pub journal: Option<String>,
}

impl Article {
    pub fn new(kind: ArticleKind, title: &str) -> Self {
        Self {
            n_number: None,
            kind,
            label: title.to_string(),
            volume: None,
            issue: None,
            publication_year: None,
            doi: None,
            pmid: None,
            start_page: None,
            end_page: None,
            journal: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Publisher {
    n_number: Option<String>,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Closed set of entity variants the graph writer knows how to create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Author(Author),
    Journal(Journal),
    Article(Article),
    Publisher(Publisher),
    Thing(Thing),
}

macro_rules! impl_n_number {
    ($($ty:ty),*) => {$(
        impl $ty {
            pub fn n_number(&self) -> Option<&str> {
                self.n_number.as_deref()
            }

            /// Assign the graph identifier. Returns `false` and leaves the entity
            /// untouched if one was already assigned.
            pub fn assign_n_number(&mut self, n_number: impl Into<String>) -> bool {
                if self.n_number.is_some() {
                    return false;
                }
                self.n_number = Some(n_number.into());
                true
            }
        }
    )*};
}

impl_n_number!(Thing, Author, Journal, Article, Publisher);

impl Entity {
    pub fn category(&self) -> Category {
        match self {
            Entity::Author(_)    => Category::Person,
            Entity::Journal(_)   => Category::Journal,
            Entity::Article(a)   => a.kind.category(),
            Entity::Publisher(_) => Category::Publisher,
            Entity::Thing(_)     => Category::Thing,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Entity::Author(a)    => &a.label,
            Entity::Journal(j)   => &j.label,
            Entity::Article(a)   => &a.label,
            Entity::Publisher(p) => &p.label,
            Entity::Thing(t)     => t.label.as_deref().unwrap_or(""),
        }
    }

    pub fn n_number(&self) -> Option<&str> {
        match self {
            Entity::Author(a)    => a.n_number(),
            Entity::Journal(j)   => j.n_number(),
            Entity::Article(a)   => a.n_number(),
            Entity::Publisher(p) => p.n_number(),
            Entity::Thing(t)     => t.n_number(),
        }
    }

    pub fn assign_n_number(&mut self, n_number: impl Into<String>) -> bool {
        match self {
            Entity::Author(a)    => a.assign_n_number(n_number),
            Entity::Journal(j)   => j.assign_n_number(n_number),
            Entity::Article(a)   => a.assign_n_number(n_number),
            Entity::Publisher(p) => p.assign_n_number(n_number),
            Entity::Thing(t)     => t.assign_n_number(n_number),
        }
    }

    /// Descriptive fields and their current values, in display order.
    pub fn details(&self) -> Vec<(&'static str, Option<&str>)> {
        match self {
            Entity::Author(a) => vec![
                ("first", a.first.as_deref()),
                ("middle", a.middle.as_deref()),
                ("last", a.last.as_deref()),
            ],
            Entity::Journal(j) => vec![("issn", j.issn.as_deref())],
            Entity::Article(a) => vec![
                ("volume", a.volume.as_deref()),
                ("issue", a.issue.as_deref()),
                ("publication_year", a.publication_year.as_deref()),
                ("doi", a.doi.as_deref()),
                ("pmid", a.pmid.as_deref()),
                ("start_page", a.start_page.as_deref()),
                ("end_page", a.end_page.as_deref()),
                ("journal", a.journal.as_deref()),
            ],
            Entity::Publisher(_) | Entity::Thing(_) => vec![],
        }
    }
}
