//! Mirror table definitions.

pub const TABLE_PUBS: &str = "pubmed_pubs";
pub const TABLE_AUTHORS: &str = "pubmed_authors";
pub const TABLE_JOURNALS: &str = "pubmed_journals";
pub const TABLE_PUB_AUTH: &str = "pubmed_pub_auth";
pub const TABLE_PUB_JOURN: &str = "pubmed_pub_journ";

pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS pubmed_pubs (
    doi         TEXT,
    title       TEXT,
    year        TEXT,
    volume      TEXT,
    issue       TEXT,
    pages       TEXT,
    type        TEXT,
    pmid        VARCHAR(15) PRIMARY KEY,
    created_dt  TIMESTAMP NOT NULL,
    modified_dt TIMESTAMP NOT NULL,
    written_by  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pubmed_authors (
    author      TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS pubmed_journals (
    issn        VARCHAR(30) PRIMARY KEY,
    title       TEXT,
    created_dt  TIMESTAMP NOT NULL,
    modified_dt TIMESTAMP NOT NULL,
    written_by  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pubmed_pub_auth (
    pmid        VARCHAR(15) NOT NULL,
    auth        TEXT NOT NULL,
    UNIQUE (pmid, auth)
);

CREATE TABLE IF NOT EXISTS pubmed_pub_journ (
    pmid        VARCHAR(15) NOT NULL,
    issn        VARCHAR(30) NOT NULL,
    UNIQUE (pmid, issn)
);
";
