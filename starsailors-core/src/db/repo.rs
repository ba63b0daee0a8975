//! Database repository layer
//!
//! Provides the queries the deployment engine runs, the atomic claim insert,
//! and seeding helpers for the tables owned by other services.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Timestamps are written as UTC RFC 3339 with microseconds. Range filters
/// go through `unixepoch(.., 'subsec')`, so rows written with a `+00:00`
/// offset or fewer fraction digits still land in the right window.
pub fn to_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection()?;
        super::schema::run_migrations(&conn)
    }

    /// Current `PRAGMA user_version`
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.connection()?;
        super::schema::get_schema_version(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Task("database connection lock poisoned".to_string()))
    }

    // ============================================
    // Catalog queries
    // ============================================

    /// Anomalies whose set is one of `sets`, ordered by id
    pub fn anomalies_in_sets(&self, sets: &[&str]) -> Result<Vec<Anomaly>> {
        if sets.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection()?;
        let sql = format!(
            "SELECT id, content, anomaly_type, anomaly_set, configuration
             FROM anomalies
             WHERE anomaly_set IN ({})
             ORDER BY id ASC",
            placeholders(sets.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let anomalies = stmt
            .query_map(params_from_iter(sets.iter()), Self::row_to_anomaly)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(anomalies)
    }

    fn row_to_anomaly(row: &Row) -> rusqlite::Result<Anomaly> {
        let configuration = match row.get::<_, Option<String>>("configuration")? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })?,
            None => serde_json::json!({}),
        };
        Ok(Anomaly {
            id: row.get("id")?,
            content: row.get("content")?,
            anomaly_type: row.get("anomaly_type")?,
            anomaly_set: row.get("anomaly_set")?,
            configuration,
        })
    }

    /// Count a user's classifications whose type is one of `types` (all time)
    pub fn count_classifications(&self, author: UserId, types: &[&str]) -> Result<i64> {
        if types.is_empty() {
            return Ok(0);
        }

        let conn = self.connection()?;
        let sql = format!(
            "SELECT COUNT(*) FROM classifications
             WHERE author = ? AND classification_type IN ({})",
            placeholders(types.len())
        );
        let author = author.to_string();
        let mut values: Vec<&str> = Vec::with_capacity(types.len() + 1);
        values.push(&author);
        values.extend_from_slice(types);

        let count: i64 = conn.query_row(&sql, params_from_iter(values), |r| r.get(0))?;
        Ok(count)
    }

    /// Whether the user has unlocked `research`
    pub fn has_research(&self, user: UserId, research: Research) -> Result<bool> {
        let conn = self.connection()?;
        let found: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM researched WHERE user_id = ?1 AND tech_type = ?2)",
            params![user.to_string(), research.as_str()],
            |r| r.get(0),
        )?;
        Ok(found != 0)
    }

    // ============================================
    // Window-scoped aggregations
    // ============================================

    /// Count claims for (user, automaton) dated in `[start, end)`
    pub fn count_claims_between(
        &self,
        author: UserId,
        automaton: AutomatonKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM linked_anomalies
             WHERE author = ?1 AND automaton = ?2
               AND unixepoch(date, 'subsec') >= unixepoch(?3, 'subsec')
               AND unixepoch(date, 'subsec') < unixepoch(?4, 'subsec')",
            params![
                author.to_string(),
                automaton.as_str(),
                to_db_timestamp(start),
                to_db_timestamp(end),
            ],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Comments the user wrote in `[start, end)`, with the author of the
    /// classification each one points at
    pub fn comments_between(
        &self,
        author: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InteractionRow>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, cl.author
             FROM comments c
             LEFT JOIN classifications cl ON cl.id = c.classification_id
             WHERE c.author = ?1
               AND unixepoch(c.created_at, 'subsec') >= unixepoch(?2, 'subsec')
               AND unixepoch(c.created_at, 'subsec') < unixepoch(?3, 'subsec')
             ORDER BY c.id ASC",
        )?;
        let rows = stmt
            .query_map(
                params![
                    author.to_string(),
                    to_db_timestamp(start),
                    to_db_timestamp(end)
                ],
                Self::row_to_interaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Upvotes the user cast in `[start, end)`, with the author of the
    /// classification each one points at
    pub fn upvotes_between(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InteractionRow>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT v.id, cl.author
             FROM votes v
             LEFT JOIN classifications cl ON cl.id = v.classification_id
             WHERE v.user_id = ?1 AND v.vote_type = ?2
               AND unixepoch(v.created_at, 'subsec') >= unixepoch(?3, 'subsec')
               AND unixepoch(v.created_at, 'subsec') < unixepoch(?4, 'subsec')
             ORDER BY v.id ASC",
        )?;
        let rows = stmt
            .query_map(
                params![
                    user.to_string(),
                    VoteType::Up.as_str(),
                    to_db_timestamp(start),
                    to_db_timestamp(end)
                ],
                Self::row_to_interaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The author is kept as stored; only a missing or empty one maps to `None`.
    fn row_to_interaction(row: &Row) -> rusqlite::Result<InteractionRow> {
        let author: Option<String> = row.get(1)?;
        Ok(InteractionRow {
            id: row.get(0)?,
            target_author: author.filter(|s| !s.is_empty()),
        })
    }

    // ============================================
    // Claim operations
    // ============================================

    /// Insert all claims in one transaction; either every row lands or none do
    pub fn insert_claims(&self, claims: &[NewClaim]) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO linked_anomalies (author, anomaly_id, classification_id, automaton, date)
                 VALUES (?1, ?2, NULL, ?3, ?4)",
            )?;
            for claim in claims {
                stmt.execute(params![
                    claim.author.to_string(),
                    claim.anomaly_id,
                    claim.automaton.as_str(),
                    to_db_timestamp(claim.date),
                ])?;
            }
        }

        tx.commit()?;
        Ok(claims.len())
    }

    /// A user's claims, newest first, joined to their anomaly
    pub fn list_claims(&self, author: UserId) -> Result<Vec<LinkedAnomaly>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT la.id, la.author, la.anomaly_id, la.classification_id, la.automaton, la.date,
                    a.id AS joined_id, a.content, a.anomaly_type, a.anomaly_set
             FROM linked_anomalies la
             LEFT JOIN anomalies a ON a.id = la.anomaly_id
             WHERE la.author = ?1
             ORDER BY la.date DESC, la.id DESC",
        )?;
        let rows = stmt
            .query_map([author.to_string()], Self::row_to_linked)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_linked(row: &Row) -> rusqlite::Result<LinkedAnomaly> {
        let author: String = row.get(1)?;
        let automaton: String = row.get(4)?;
        let date: String = row.get(5)?;
        let joined_id: Option<i64> = row.get(6)?;

        let claim = DeploymentClaim {
            id: row.get(0)?,
            author: author.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into())
            })?,
            anomaly_id: row.get(2)?,
            classification_id: row.get(3)?,
            automaton: automaton.parse().map_err(|e: Error| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })?,
            date: parse_timestamp(5, &date)?,
        };

        let anomaly = match joined_id {
            Some(id) => Some(AnomalySummary {
                id,
                content: row.get(7)?,
                anomaly_type: row.get(8)?,
                anomaly_set: row.get(9)?,
            }),
            None => None,
        };

        Ok(LinkedAnomaly { claim, anomaly })
    }

    // ============================================
    // Seeding (tables owned by other services)
    // ============================================

    /// Insert or replace a candidate anomaly
    pub fn upsert_anomaly(&self, anomaly: &Anomaly) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO anomalies (id, content, anomaly_type, anomaly_set, configuration)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                anomaly_type = excluded.anomaly_type,
                anomaly_set = excluded.anomaly_set,
                configuration = excluded.configuration
            "#,
            params![
                anomaly.id,
                anomaly.content,
                anomaly.anomaly_type,
                anomaly.anomaly_set,
                anomaly.configuration.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Record a classification, returning its id
    pub fn insert_classification(
        &self,
        author: UserId,
        classification_type: &str,
        anomaly_id: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO classifications (author, classification_type, anomaly_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                author.to_string(),
                classification_type,
                anomaly_id,
                to_db_timestamp(created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a comment on a classification, returning its id
    pub fn insert_comment(
        &self,
        author: UserId,
        classification_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO comments (author, classification_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                author.to_string(),
                classification_id,
                content,
                to_db_timestamp(created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a vote on a classification, returning its id
    pub fn insert_vote(
        &self,
        user: UserId,
        classification_id: i64,
        vote_type: VoteType,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO votes (user_id, classification_id, vote_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.to_string(),
                classification_id,
                vote_type.as_str(),
                to_db_timestamp(created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Unlock a research flag for a user
    pub fn insert_research(
        &self,
        user: UserId,
        research: Research,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO researched (user_id, tech_type, created_at) VALUES (?1, ?2, ?3)",
            params![
                user.to_string(),
                research.as_str(),
                to_db_timestamp(created_at)
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn create_test_anomaly(id: i64, set: &str) -> Anomaly {
        Anomaly {
            id,
            content: Some(format!("TIC {}", id)),
            anomaly_type: Some("planet".to_string()),
            anomaly_set: Some(set.to_string()),
            configuration: serde_json::json!({"ticId": id}),
        }
    }

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_timestamp_format_round_trips() {
        let earlier = to_db_timestamp(ts(1, 9));
        let later = to_db_timestamp(ts(1, 10));
        assert!(earlier < later);
        assert!(earlier.ends_with('Z'));
        assert_eq!(parse_timestamp(0, &earlier).unwrap(), ts(1, 9));
    }

    #[test]
    fn test_anomalies_in_sets_filters_and_orders() {
        let db = test_db();
        db.upsert_anomaly(&create_test_anomaly(3, "telescope-tess"))
            .unwrap();
        db.upsert_anomaly(&create_test_anomaly(1, "telescope-minorPlanet"))
            .unwrap();
        db.upsert_anomaly(&create_test_anomaly(2, "diskDetective"))
            .unwrap();

        let found = db
            .anomalies_in_sets(&["telescope-tess", "telescope-minorPlanet"])
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(found[0].configuration["ticId"], 1);

        assert!(db.anomalies_in_sets(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_count_classifications_by_type() {
        let db = test_db();
        let user = UserId::new_v4();
        let other = UserId::new_v4();

        db.insert_classification(user, "telescope-minorPlanet", None, ts(1, 0))
            .unwrap();
        db.insert_classification(user, "planet", None, ts(1, 1))
            .unwrap();
        db.insert_classification(user, "cloud", None, ts(1, 2))
            .unwrap();
        db.insert_classification(other, "planet", None, ts(1, 3))
            .unwrap();

        assert_eq!(
            db.count_classifications(user, &["telescope-minorPlanet"])
                .unwrap(),
            1
        );
        assert_eq!(
            db.count_classifications(user, TELESCOPE_SKILL_TYPES)
                .unwrap(),
            2
        );
        assert_eq!(db.count_classifications(user, &[]).unwrap(), 0);
    }

    #[test]
    fn test_has_research() {
        let db = test_db();
        let user = UserId::new_v4();

        assert!(!db.has_research(user, Research::NgtsAccess).unwrap());
        db.insert_research(user, Research::NgtsAccess, ts(1, 0))
            .unwrap();
        assert!(db.has_research(user, Research::NgtsAccess).unwrap());
        assert!(!db.has_research(user, Research::ProbeReceptors).unwrap());
    }

    #[test]
    fn test_claims_window_is_half_open() {
        let db = test_db();
        let user = UserId::new_v4();
        let start = ts(1, 0);
        let end = start + Duration::days(7);

        let claims: Vec<NewClaim> = [start - Duration::seconds(1), start, end - Duration::seconds(1), end]
            .iter()
            .enumerate()
            .map(|(i, date)| NewClaim {
                author: user,
                anomaly_id: i as i64,
                automaton: AutomatonKind::Telescope,
                date: *date,
            })
            .collect();
        assert_eq!(db.insert_claims(&claims).unwrap(), 4);

        assert_eq!(
            db.count_claims_between(user, AutomatonKind::Telescope, start, end)
                .unwrap(),
            2
        );
        assert_eq!(
            db.count_claims_between(user, AutomatonKind::WeatherSatellite, start, end)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_interactions_carry_target_author() {
        let db = test_db();
        let user = UserId::new_v4();
        let other = UserId::new_v4();

        let own = db
            .insert_classification(user, "planet", None, ts(2, 0))
            .unwrap();
        let theirs = db
            .insert_classification(other, "planet", None, ts(2, 0))
            .unwrap();

        db.insert_comment(user, own, "mine", ts(2, 1)).unwrap();
        db.insert_comment(user, theirs, "nice find", ts(2, 2))
            .unwrap();
        db.insert_vote(user, theirs, VoteType::Up, ts(2, 3))
            .unwrap();
        db.insert_vote(user, theirs, VoteType::Down, ts(2, 4))
            .unwrap();

        let comments = db
            .comments_between(user, ts(1, 0), ts(8, 0))
            .unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].target_author, Some(user.to_string()));
        assert_eq!(comments[1].target_author, Some(other.to_string()));

        let votes = db.upvotes_between(user, ts(1, 0), ts(8, 0)).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].target_author, Some(other.to_string()));

        let outside = db
            .comments_between(user, ts(3, 0), ts(8, 0))
            .unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn test_interaction_on_missing_classification_has_no_author() {
        let db = test_db();
        let user = UserId::new_v4();
        {
            let conn = db.connection().unwrap();
            conn.execute("PRAGMA foreign_keys = OFF", []).unwrap();
        }
        db.insert_comment(user, 9999, "orphan", ts(2, 0)).unwrap();

        let comments = db
            .comments_between(user, ts(1, 0), ts(8, 0))
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].target_author, None);
    }

    #[test]
    fn test_interaction_keeps_non_uuid_author() {
        let db = test_db();
        let user = UserId::new_v4();
        let classification_id = {
            let conn = db.connection().unwrap();
            conn.execute(
                "INSERT INTO classifications (author, classification_type, created_at)
                 VALUES ('legacy-user-42', 'planet', ?1)",
                params![to_db_timestamp(ts(2, 0))],
            )
            .unwrap();
            conn.last_insert_rowid()
        };
        db.insert_comment(user, classification_id, "old account", ts(2, 1))
            .unwrap();
        db.insert_vote(user, classification_id, VoteType::Up, ts(2, 2))
            .unwrap();

        let comments = db
            .comments_between(user, ts(1, 0), ts(8, 0))
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].target_author.as_deref(), Some("legacy-user-42"));

        let votes = db.upvotes_between(user, ts(1, 0), ts(8, 0)).unwrap();
        let credit = crate::deploy::streak::streak_credit(user, &comments, &votes, 2);
        assert_eq!(credit.qualifying_comments, 1);
        assert_eq!(credit.qualifying_votes, 1);
        assert_eq!(credit.bonus, 1);
    }

    #[test]
    fn test_empty_author_has_no_author() {
        let db = test_db();
        let user = UserId::new_v4();
        let classification_id = {
            let conn = db.connection().unwrap();
            conn.execute(
                "INSERT INTO classifications (author, classification_type, created_at)
                 VALUES ('', 'planet', ?1)",
                params![to_db_timestamp(ts(2, 0))],
            )
            .unwrap();
            conn.last_insert_rowid()
        };
        db.insert_comment(user, classification_id, "hm", ts(2, 1))
            .unwrap();

        let comments = db
            .comments_between(user, ts(1, 0), ts(8, 0))
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].target_author, None);
    }

    #[test]
    fn test_malformed_configuration_is_an_error() {
        let db = test_db();
        db.upsert_anomaly(&create_test_anomaly(1, "telescope-tess"))
            .unwrap();
        {
            let conn = db.connection().unwrap();
            conn.execute(
                "INSERT INTO anomalies (id, anomaly_set, configuration)
                 VALUES (2, 'telescope-tess', '{not json')",
                [],
            )
            .unwrap();
        }

        let err = db.anomalies_in_sets(&["telescope-tess"]).unwrap_err();
        assert!(matches!(
            err,
            Error::Database(rusqlite::Error::FromSqlConversionFailure(4, Type::Text, _))
        ));
    }

    #[test]
    fn test_null_configuration_reads_as_empty_object() {
        let db = test_db();
        {
            let conn = db.connection().unwrap();
            conn.execute(
                "INSERT INTO anomalies (id, anomaly_set) VALUES (7, 'telescope-tess')",
                [],
            )
            .unwrap();
        }

        let found = db.anomalies_in_sets(&["telescope-tess"]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].configuration, serde_json::json!({}));
    }

    #[test]
    fn test_window_filters_compare_instants_not_text() {
        let db = test_db();
        let user = UserId::new_v4();
        let other = UserId::new_v4();
        let start = ts(1, 0);
        let end = start + Duration::days(7);
        let theirs = db
            .insert_classification(other, "planet", None, ts(1, 0))
            .unwrap();

        {
            let conn = db.connection().unwrap();
            let author = user.to_string();
            // Same instants as `start` and `end`, written with an explicit
            // offset and no fraction digits
            for created_at in ["2026-03-01T00:00:00+00:00", "2026-03-08T00:00:00+00:00"] {
                conn.execute(
                    "INSERT INTO comments (author, classification_id, content, created_at)
                     VALUES (?1, ?2, 'x', ?3)",
                    params![author, theirs, created_at],
                )
                .unwrap();
                conn.execute(
                    "INSERT INTO votes (user_id, classification_id, vote_type, created_at)
                     VALUES (?1, ?2, 'up', ?3)",
                    params![author, theirs, created_at],
                )
                .unwrap();
                conn.execute(
                    "INSERT INTO linked_anomalies (author, anomaly_id, automaton, date)
                     VALUES (?1, 1, ?2, ?3)",
                    params![author, AutomatonKind::Telescope.as_str(), created_at],
                )
                .unwrap();
            }
        }

        assert_eq!(db.comments_between(user, start, end).unwrap().len(), 1);
        assert_eq!(db.upvotes_between(user, start, end).unwrap().len(), 1);
        assert_eq!(
            db.count_claims_between(user, AutomatonKind::Telescope, start, end)
                .unwrap(),
            1
        );

        let next_week = db
            .comments_between(user, end, end + Duration::days(7))
            .unwrap();
        assert_eq!(next_week.len(), 1);
    }

    #[test]
    fn test_list_claims_joins_anomaly() {
        let db = test_db();
        let user = UserId::new_v4();
        db.upsert_anomaly(&create_test_anomaly(5, "telescope-tess"))
            .unwrap();

        db.insert_claims(&[
            NewClaim {
                author: user,
                anomaly_id: 5,
                automaton: AutomatonKind::Telescope,
                date: ts(1, 0),
            },
            NewClaim {
                author: user,
                anomaly_id: 404,
                automaton: AutomatonKind::Telescope,
                date: ts(2, 0),
            },
        ])
        .unwrap();

        let linked = db.list_claims(user).unwrap();
        assert_eq!(linked.len(), 2);
        // Newest first
        assert_eq!(linked[0].claim.anomaly_id, 404);
        assert!(linked[0].anomaly.is_none());
        assert_eq!(linked[1].claim.anomaly_id, 5);
        let anomaly = linked[1].anomaly.as_ref().unwrap();
        assert_eq!(anomaly.anomaly_set.as_deref(), Some("telescope-tess"));
        assert_eq!(linked[1].claim.classification_id, None);
        assert_eq!(linked[1].claim.date, ts(1, 0));
    }

    #[test]
    fn test_insert_claims_rolls_back_on_failure() {
        let db = test_db();
        let user = UserId::new_v4();
        {
            let conn = db.connection().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_13 BEFORE INSERT ON linked_anomalies
                 WHEN NEW.anomaly_id = 13
                 BEGIN SELECT RAISE(ABORT, 'unlucky'); END;",
            )
            .unwrap();
        }

        let claims: Vec<NewClaim> = [11, 12, 13]
            .iter()
            .map(|id| NewClaim {
                author: user,
                anomaly_id: *id,
                automaton: AutomatonKind::Telescope,
                date: ts(1, 0),
            })
            .collect();

        assert!(db.insert_claims(&claims).is_err());
        assert!(db.list_claims(user).unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data.db");
        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        assert!(path.exists());
        assert_eq!(
            db.schema_version().unwrap(),
            crate::db::schema::SCHEMA_VERSION
        );
    }
}
