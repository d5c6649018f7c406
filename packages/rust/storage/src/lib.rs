//! libSQL-backed document store for artwork records.
//!
//! The [`Storage`] struct wraps a libSQL database (local file or remote
//! `libsql://` endpoint) holding the `artworks` collection.
//!
//! **Access rules:**
//! - `fill` and `seed`: read-write via [`Storage::connect`] / [`Storage::open`]
//! - `check`: read-only via [`Storage::open_readonly`]
//!
//! The handle is created explicitly by the caller, passed by reference to
//! whatever needs it, and closed with [`Storage::close`] at the end of a run.

mod migrations;

use std::collections::VecDeque;
use std::path::Path;

use artfill_shared::{ArtfillError, ArtworkId, ArtworkRecord, Result, UrlField};
use chrono::Utc;
use libsql::{Connection, Database, params};

/// Records fetched per round-trip by a [`PendingCursor`].
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Whether a connection string names a remote database rather than a file.
pub fn is_remote(conn_str: &str) -> bool {
    ["libsql://", "http://", "https://"]
        .iter()
        .any(|scheme| conn_str.starts_with(scheme))
}

impl Storage {
    /// Open the store named by `conn_str` in read-write mode.
    ///
    /// `libsql://`, `http://` and `https://` strings open a remote database
    /// authenticated with `auth_token`; anything else is a local file path.
    pub async fn connect(conn_str: &str, auth_token: Option<String>) -> Result<Self> {
        if is_remote(conn_str) {
            Self::open_remote(conn_str, auth_token.unwrap_or_default()).await
        } else {
            Self::open(Path::new(conn_str)).await
        }
    }

    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ArtfillError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;

        Self::from_database(db, false).await
    }

    /// Open a remote database in read-write mode.
    pub async fn open_remote(url: &str, auth_token: String) -> Result<Self> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token)
            .build()
            .await
            .map_err(|e| ArtfillError::Storage(format!("{url}: {e}")))?;

        Self::from_database(db, false).await
    }

    /// Open an existing store in read-only mode. Nothing is created or migrated.
    pub async fn open_readonly(conn_str: &str, auth_token: Option<String>) -> Result<Self> {
        let db = if is_remote(conn_str) {
            libsql::Builder::new_remote(conn_str.to_string(), auth_token.unwrap_or_default())
                .build()
                .await
        } else {
            let path = Path::new(conn_str);
            if !path.exists() {
                return Err(ArtfillError::Storage(format!(
                    "database file not found: {}",
                    path.display()
                )));
            }
            libsql::Builder::new_local(path).build().await
        }
        .map_err(|e| ArtfillError::Storage(e.to_string()))?;

        Self::from_database(db, true).await
    }

    async fn from_database(db: Database, readonly: bool) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;

        let storage = Self { db, conn, readonly };
        if !readonly {
            storage.run_migrations().await?;
        }
        Ok(storage)
    }

    /// Close the store. Consumes the handle so it cannot be used afterwards.
    pub fn close(self) {
        tracing::debug!(readonly = self.readonly, "closing store");
        drop(self.conn);
        drop(self.db);
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ArtfillError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ArtfillError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Artwork writes
    // -----------------------------------------------------------------------

    /// Insert a record. Returns `false` if a record with the same id exists
    /// (the existing record is left untouched).
    pub async fn insert_artwork(&self, record: &ArtworkRecord) -> Result<bool> {
        self.check_writable()?;
        if record.id.as_str().is_empty() {
            return Err(ArtfillError::validation("artwork id must not be empty"));
        }

        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO artworks (id, name, artwork_url, image_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.as_str(),
                    record.name.as_deref(),
                    record.artwork_url.as_deref(),
                    record.image_url.as_deref(),
                    record.updated_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Point update of one URL field by id. Returns `false` if no record has that id.
    pub async fn set_url_field(&self, id: &ArtworkId, field: UrlField, value: &str) -> Result<bool> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "UPDATE artworks SET {} = ?1, updated_at = ?2 WHERE id = ?3",
            field.column()
        );
        let changed = self
            .conn
            .execute(&sql, params![value, now.as_str(), id.as_str()])
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;
        Ok(changed > 0)
    }

    // -----------------------------------------------------------------------
    // Artwork reads
    // -----------------------------------------------------------------------

    /// Get a record by id.
    pub async fn get_artwork(&self, id: &ArtworkId) -> Result<Option<ArtworkRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, artwork_url, image_url, updated_at
                 FROM artworks WHERE id = ?1",
                params![id.as_str()],
            )
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_artwork(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(ArtfillError::Storage(e.to_string())),
        }
    }

    /// First record by id order, for sampling the collection.
    pub async fn sample_artwork(&self) -> Result<Option<ArtworkRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, artwork_url, image_url, updated_at
                 FROM artworks ORDER BY id LIMIT 1",
                params![],
            )
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_artwork(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(ArtfillError::Storage(e.to_string())),
        }
    }

    /// Total number of records.
    pub async fn count_artworks(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM artworks").await
    }

    /// Number of records with both URL fields set.
    pub async fn count_complete(&self) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM artworks
             WHERE artwork_url IS NOT NULL AND image_url IS NOT NULL",
        )
        .await
    }

    /// Number of records missing `field`.
    pub async fn count_missing(&self, field: UrlField) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM artworks WHERE {} IS NULL",
            field.column()
        );
        self.count(&sql).await
    }

    async fn count(&self, sql: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(sql, params![])
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row
                .get::<i64>(0)
                .map_err(|e| ArtfillError::Storage(e.to_string()))?
                .max(0) as u64),
            Ok(None) => Ok(0),
            Err(e) => Err(ArtfillError::Storage(e.to_string())),
        }
    }

    /// One page of records missing `field`, ordered by id, strictly after `after`.
    pub async fn fetch_pending_page(
        &self,
        field: UrlField,
        after: Option<&ArtworkId>,
        limit: u32,
    ) -> Result<Vec<ArtworkRecord>> {
        let sql = format!(
            "SELECT id, name, artwork_url, image_url, updated_at
             FROM artworks WHERE {} IS NULL AND id > ?1 ORDER BY id LIMIT ?2",
            field.column()
        );
        let after = after.map(ArtworkId::as_str).unwrap_or("");
        let mut rows = self
            .conn
            .query(&sql, params![after, i64::from(limit)])
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ArtfillError::Storage(e.to_string()))?
        {
            results.push(row_to_artwork(&row)?);
        }
        Ok(results)
    }

    /// Lazy cursor over every record missing `field`.
    pub fn pending(&self, field: UrlField) -> PendingCursor<'_> {
        PendingCursor::new(self, field, DEFAULT_PAGE_SIZE)
    }
}

// ---------------------------------------------------------------------------
// PendingCursor
// ---------------------------------------------------------------------------

/// Lazily pages through records missing a field, keyed on id.
///
/// Each record is yielded at most once per cursor, even if it is still
/// missing the field after the caller has processed it.
pub struct PendingCursor<'a> {
    storage: &'a Storage,
    field: UrlField,
    page_size: u32,
    after: Option<ArtworkId>,
    buffer: VecDeque<ArtworkRecord>,
    exhausted: bool,
}

impl<'a> PendingCursor<'a> {
    pub fn new(storage: &'a Storage, field: UrlField, page_size: u32) -> Self {
        Self {
            storage,
            field,
            page_size: page_size.max(1),
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next pending record, or `None` once the collection is exhausted.
    pub async fn next(&mut self) -> Result<Option<ArtworkRecord>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self
                .storage
                .fetch_pending_page(self.field, self.after.as_ref(), self.page_size)
                .await?;
            if page.len() < self.page_size as usize {
                self.exhausted = true;
            }
            if let Some(last) = page.last() {
                self.after = Some(last.id.clone());
            }
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }
}

fn row_to_artwork(row: &libsql::Row) -> Result<ArtworkRecord> {
    Ok(ArtworkRecord {
        id: ArtworkId(
            row.get::<String>(0)
                .map_err(|e| ArtfillError::Storage(e.to_string()))?,
        ),
        name: row.get::<String>(1).ok(),
        artwork_url: row.get::<String>(2).ok(),
        image_url: row.get::<String>(3).ok(),
        updated_at: row
            .get::<String>(4)
            .ok()
            .map(|s| {
                chrono::DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| ArtfillError::Storage(format!("invalid date: {e}")))
            })
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("artfill_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn record(id: &str, artwork_url: Option<&str>, image_url: Option<&str>) -> ArtworkRecord {
        ArtworkRecord {
            id: ArtworkId::from(id),
            name: None,
            artwork_url: artwork_url.map(String::from),
            image_url: image_url.map(String::from),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("artfill_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        s1.close();
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn connect_dispatches_on_scheme() {
        assert!(is_remote("libsql://arts-db.turso.io"));
        assert!(is_remote("https://arts-db.turso.io"));
        assert!(!is_remote("/var/lib/artfill/arts.db"));
        assert!(!is_remote("arts.db"));

        let tmp = std::env::temp_dir().join(format!("artfill_test_{}.db", Uuid::now_v7()));
        let storage = Storage::connect(tmp.to_str().unwrap(), None)
            .await
            .expect("connect local");
        assert_eq!(storage.count_artworks().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_and_get() {
        let storage = test_storage().await;
        let mut rec = record("art-1", Some("https://example.com/a/1"), None);
        rec.name = Some("Mural".into());

        assert!(storage.insert_artwork(&rec).await.expect("insert"));
        let found = storage
            .get_artwork(&rec.id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(found, rec);

        assert!(
            storage
                .get_artwork(&ArtworkId::from("missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_insert_is_ignored() {
        let storage = test_storage().await;
        let original = record("art-1", Some("https://example.com/a/1"), None);
        assert!(storage.insert_artwork(&original).await.unwrap());

        let dup = record("art-1", Some("https://example.com/other"), Some("x.jpg"));
        assert!(!storage.insert_artwork(&dup).await.unwrap());

        let found = storage.get_artwork(&original.id).await.unwrap().unwrap();
        assert_eq!(found.artwork_url.as_deref(), Some("https://example.com/a/1"));
        assert_eq!(found.image_url, None);
    }

    #[tokio::test]
    async fn empty_id_is_rejected() {
        let storage = test_storage().await;
        let err = storage
            .insert_artwork(&record("", None, None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn set_url_field_updates_only_target() {
        let storage = test_storage().await;
        let rec = record("art-1", Some("https://example.com/a/1"), None);
        storage.insert_artwork(&rec).await.unwrap();

        let changed = storage
            .set_url_field(&rec.id, UrlField::ImageUrl, "https://cdn.example.com/1.jpg")
            .await
            .expect("update");
        assert!(changed);

        let found = storage.get_artwork(&rec.id).await.unwrap().unwrap();
        assert_eq!(found.image_url.as_deref(), Some("https://cdn.example.com/1.jpg"));
        assert_eq!(found.artwork_url, rec.artwork_url);
        assert!(found.updated_at.is_some());

        let missing = storage
            .set_url_field(&ArtworkId::from("nope"), UrlField::ImageUrl, "x")
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn counts() {
        let storage = test_storage().await;
        storage.insert_artwork(&record("a", Some("u"), None)).await.unwrap();
        storage.insert_artwork(&record("b", None, Some("i"))).await.unwrap();
        storage.insert_artwork(&record("c", Some("u"), Some("i"))).await.unwrap();
        storage.insert_artwork(&record("d", None, None)).await.unwrap();

        assert_eq!(storage.count_artworks().await.unwrap(), 4);
        assert_eq!(storage.count_missing(UrlField::ImageUrl).await.unwrap(), 2);
        assert_eq!(storage.count_missing(UrlField::ArtworkUrl).await.unwrap(), 2);
        assert_eq!(storage.count_complete().await.unwrap(), 1);

        let sample = storage.sample_artwork().await.unwrap().unwrap();
        assert_eq!(sample.id.as_str(), "a");
    }

    #[tokio::test]
    async fn pending_cursor_pages_through_everything_once() {
        let storage = test_storage().await;
        for i in 0..7 {
            let id = format!("art-{i:02}");
            storage
                .insert_artwork(&record(&id, Some("https://example.com"), None))
                .await
                .unwrap();
        }
        storage
            .insert_artwork(&record("art-99", Some("u"), Some("done.jpg")))
            .await
            .unwrap();

        let mut cursor = PendingCursor::new(&storage, UrlField::ImageUrl, 3);
        let mut seen = Vec::new();
        while let Some(rec) = cursor.next().await.expect("next") {
            seen.push(rec.id.0);
        }
        let expected: Vec<String> = (0..7).map(|i| format!("art-{i:02}")).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn pending_cursor_survives_writes_between_pages() {
        let storage = test_storage().await;
        for id in ["a", "b", "c", "d"] {
            storage
                .insert_artwork(&record(id, Some("https://example.com"), None))
                .await
                .unwrap();
        }

        let mut cursor = PendingCursor::new(&storage, UrlField::ImageUrl, 2);
        let mut seen = Vec::new();
        while let Some(rec) = cursor.next().await.unwrap() {
            // Fill every other record; unfilled ones must not come back.
            if rec.id.as_str() == "a" || rec.id.as_str() == "c" {
                storage
                    .set_url_field(&rec.id, UrlField::ImageUrl, "x.jpg")
                    .await
                    .unwrap();
            }
            seen.push(rec.id.0);
        }
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
        assert_eq!(storage.count_missing(UrlField::ImageUrl).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("artfill_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.insert_artwork(&record("a", Some("u"), None)).await.unwrap();
        rw.close();

        let ro = Storage::open_readonly(tmp.to_str().unwrap(), None)
            .await
            .unwrap();
        assert_eq!(ro.count_artworks().await.unwrap(), 1);
        let result = ro
            .set_url_field(&ArtworkId::from("a"), UrlField::ImageUrl, "x")
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        let tmp = std::env::temp_dir().join(format!("artfill_missing_{}.db", Uuid::now_v7()));
        let result = Storage::open_readonly(tmp.to_str().unwrap(), None).await;
        assert!(result.is_err());
    }
}
