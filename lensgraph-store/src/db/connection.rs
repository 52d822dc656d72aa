use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;
use uuid::Uuid;

use super::schema::SCHEMA;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = Self::create_connection_manager(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on path
    ///
    /// `":memory:"` (any case, surrounding whitespace ignored) maps to a
    /// uniquely named shared-cache database, so every pooled connection
    /// sees the same data while two `Database` values stay independent.
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> SqliteConnectionManager {
        let path_str = path.as_ref().to_string_lossy();

        if path_str.trim().eq_ignore_ascii_case(MEMORY_DB_PATH) {
            let uri = format!("file:lensgraph-{}?mode=memory&cache=shared", Uuid::new_v4());
            SqliteConnectionManager::file(uri).with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        } else {
            SqliteConnectionManager::file(path)
        }
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        tracing::debug!("Database schema initialized");
        Ok(())
    }

    /// Open (or create) a database file and make sure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Self::new(path)?;
        db.initialize()?;
        Ok(db)
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(db: &Database) -> Vec<String> {
        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");
        tables
    }

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let tables = table_names(&db);
        for table in [
            "users", "posts", "tags", "notifications", "makes", "likes", "bookmarks",
            "tagged", "comments", "follows", "messages", "received", "documents",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_initialize_is_repeatable() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("First initialize failed");
        db.initialize().expect("Second initialize failed");
    }

    #[test]
    fn test_pooled_connections_share_memory_database() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let first = db.connection().expect("Failed to get first connection");
        first
            .execute("INSERT INTO tags (name) VALUES ('nature')", [])
            .expect("Failed to insert tag");

        // A second checkout while the first is still held is a different connection
        let second = db.connection().expect("Failed to get second connection");
        let count: i64 = second
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .expect("Failed to count tags");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_memory_databases_are_independent() {
        let memory_paths = [":memory:", " :memory: ", ":MEMORY:", " :Memory: "];

        for path in &memory_paths {
            let db = Database::new(path).expect("Failed to create memory database");
            db.initialize().expect("Failed to initialize schema");
            db.connection()
                .unwrap()
                .execute("INSERT INTO tags (name) VALUES ('NYC')", [])
                .expect("Failed to insert tag");

            let db2 = Database::new(path).expect("Failed to create second memory database");
            db2.initialize()
                .expect("Failed to initialize second schema");
            let count: i64 = db2
                .connection()
                .unwrap()
                .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let conn = db.connection().unwrap();
        let result = conn.execute("INSERT INTO likes (user_id, post_id) VALUES (1, 1)", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_file_database() {
        let temp_path = std::env::temp_dir().join(format!("lensgraph-{}.db", Uuid::new_v4()));
        let db = Database::open(&temp_path).expect("Failed to open file database");
        assert!(table_names(&db).contains(&"users".to_string()));

        drop(db);
        let _ = std::fs::remove_file(&temp_path);
    }
}
