//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//!
//! The tables mirror the game's shared schema. Only `linked_anomalies` is
//! written by the deployment engine; the rest are owned by other services
//! and are read here.
//!
//! `DATETIME` columns hold RFC 3339 text. Window filters convert both sides
//! with `unixepoch(.., 'subsec')`, so any offset form SQLite understands
//! (`Z`, `+00:00`) compares by instant.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Read-only inputs (owned elsewhere)
    -- ============================================

    CREATE TABLE IF NOT EXISTS anomalies (
        id               INTEGER PRIMARY KEY,
        content          TEXT,
        anomaly_type     TEXT,
        anomaly_set      TEXT,
        configuration    JSON
    );

    CREATE TABLE IF NOT EXISTS classifications (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        author              TEXT,
        classification_type TEXT,
        anomaly_id          INTEGER REFERENCES anomalies(id),
        created_at          DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS comments (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        author            TEXT NOT NULL,
        classification_id INTEGER REFERENCES classifications(id),
        content           TEXT,
        created_at        DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS votes (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id           TEXT NOT NULL,
        classification_id INTEGER REFERENCES classifications(id),
        vote_type         TEXT NOT NULL,
        created_at        DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS researched (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          TEXT NOT NULL,
        tech_type        TEXT NOT NULL,
        created_at       DATETIME NOT NULL
    );

    -- ============================================
    -- Claims (written by the deployment engine)
    -- ============================================

    -- No uniqueness on (author, automaton, anomaly_id): repeated batches
    -- append duplicate claims.
    CREATE TABLE IF NOT EXISTS linked_anomalies (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        author            TEXT NOT NULL,
        anomaly_id        INTEGER NOT NULL,
        classification_id INTEGER,
        automaton         TEXT NOT NULL,
        date              DATETIME NOT NULL
    );

    -- ============================================
    -- Indexes
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_anomalies_set ON anomalies(anomaly_set);
    CREATE INDEX IF NOT EXISTS idx_classifications_author_type ON classifications(author, classification_type);
    CREATE INDEX IF NOT EXISTS idx_comments_author_created ON comments(author, created_at);
    CREATE INDEX IF NOT EXISTS idx_votes_user_created ON votes(user_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_researched_user_tech ON researched(user_id, tech_type);
    CREATE INDEX IF NOT EXISTS idx_linked_author_automaton_date ON linked_anomalies(author, automaton, date);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run migrations twice - should be idempotent
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "anomalies",
            "classifications",
            "comments",
            "votes",
            "researched",
            "linked_anomalies",
        ];

        for table in tables {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_claims_allow_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for _ in 0..2 {
            conn.execute(
                "INSERT INTO linked_anomalies (author, anomaly_id, automaton, date)
                 VALUES ('u', 7, 'Telescope', '2026-01-01T00:00:00.000000Z')",
                [],
            )
            .unwrap();
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM linked_anomalies", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
