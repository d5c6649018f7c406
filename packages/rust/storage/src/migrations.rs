//! SQL migration definitions for the artfill database.
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
    vec![Migration {
        version: 1,
        description: "Initial schema: artworks",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Artwork documents. NULL marks a missing URL.
CREATE TABLE IF NOT EXISTS artworks (
    id          TEXT PRIMARY KEY,
    name        TEXT,
    artwork_url TEXT,
    image_url   TEXT,
    updated_at  TEXT
);

CREATE INDEX IF NOT EXISTS idx_artworks_artwork_url ON artworks(artwork_url);
CREATE INDEX IF NOT EXISTS idx_artworks_image_url ON artworks(image_url);

INSERT OR IGNORE INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
