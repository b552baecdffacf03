//! SQL migration definitions for the catalog database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: categories, categories_attributes, articles_categories",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Category tree (self-referential, cycles are not checked)
CREATE TABLE IF NOT EXISTS categories (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id          INTEGER REFERENCES categories(id),
    name               TEXT NOT NULL,
    position           INTEGER NOT NULL DEFAULT 0,
    active             INTEGER NOT NULL DEFAULT 1,
    blog               INTEGER NOT NULL DEFAULT 0,
    external           TEXT,
    external_target    TEXT,
    hide_filter        INTEGER NOT NULL DEFAULT 0,
    hide_top           INTEGER NOT NULL DEFAULT 0,
    hide_sortings      INTEGER NOT NULL DEFAULT 0,
    cms_headline       TEXT,
    cms_text           TEXT,
    meta_title         TEXT,
    meta_keywords      TEXT,
    meta_description   TEXT,
    template           TEXT,
    product_box_layout TEXT,
    added              TEXT NOT NULL,
    changed            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_parent_name ON categories(parent_id, name);

-- Free-text attribute columns, one row per category
CREATE TABLE IF NOT EXISTS categories_attributes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL UNIQUE REFERENCES categories(id) ON DELETE CASCADE,
    attribute1  TEXT,
    attribute2  TEXT,
    attribute3  TEXT,
    attribute4  TEXT,
    attribute5  TEXT,
    attribute6  TEXT
);

-- Article membership (set semantics)
CREATE TABLE IF NOT EXISTS articles_categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id  INTEGER NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    UNIQUE(article_id, category_id)
);

CREATE INDEX IF NOT EXISTS idx_articles_categories_category ON articles_categories(category_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Denormalized article/category lookup table",
            sql: r#"
-- One row per (article, visible category, directly assigned category)
CREATE TABLE IF NOT EXISTS articles_categories_ro (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id         INTEGER NOT NULL,
    category_id        INTEGER NOT NULL,
    parent_category_id INTEGER NOT NULL,
    UNIQUE(article_id, category_id, parent_category_id)
);

CREATE INDEX IF NOT EXISTS idx_articles_categories_ro_category ON articles_categories_ro(category_id);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}

/// Highest version defined above.
#[cfg(test)]
pub(crate) fn latest_version() -> u32 {
    all_migrations()
        .iter()
        .map(|m| m.version)
        .max()
        .unwrap_or(0)
}
