//! SQLite-based statistics storage.
//!
//! Provides persistent storage for:
//! - Daily break statistics (completed, skipped, total break time)
//! - Key-value store for application state (the CLI persists the timer
//!   engine here between one-shot invocations)
//!
//! Daily records are keyed by calendar day. The collection is pruned to the
//! 30 most recent days after every write; older rows are dropped for good.

use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;

/// Number of daily records retained.
pub const RETENTION_DAYS: usize = 30;

/// One calendar day of break statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub breaks_completed: u32,
    pub breaks_skipped: u32,
    pub total_break_secs: u64,
}

impl DailyStats {
    /// Zero-valued record for `date`.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            breaks_completed: 0,
            breaks_skipped: 0,
            total_break_secs: 0,
        }
    }
}

/// SQLite database for break statistics.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/eyebreak/eyebreak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("eyebreak.db");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_stats (
                date             TEXT PRIMARY KEY,
                breaks_completed INTEGER NOT NULL DEFAULT 0,
                breaks_skipped   INTEGER NOT NULL DEFAULT 0,
                total_break_secs INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn today_key() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Record one completed break of `break_secs` against today.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub fn record_completion(&self, break_secs: u64) -> Result<(), rusqlite::Error> {
        self.upsert_today(1, 0, break_secs)
    }

    /// Record one skipped break against today.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub fn record_skip(&self) -> Result<(), rusqlite::Error> {
        self.upsert_today(0, 1, 0)
    }

    fn upsert_today(
        &self,
        completed: u32,
        skipped: u32,
        break_secs: u64,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO daily_stats (date, breaks_completed, breaks_skipped, total_break_secs)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(date) DO UPDATE SET
                 breaks_completed = breaks_completed + excluded.breaks_completed,
                 breaks_skipped   = breaks_skipped + excluded.breaks_skipped,
                 total_break_secs = total_break_secs + excluded.total_break_secs",
            params![
                Self::today_key().to_string(),
                completed,
                skipped,
                break_secs
            ],
        )?;
        self.prune()
    }

    /// Drop everything but the [`RETENTION_DAYS`] most recent dates.
    fn prune(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "DELETE FROM daily_stats WHERE date NOT IN (
                 SELECT date FROM daily_stats ORDER BY date DESC LIMIT ?1
             )",
            params![RETENTION_DAYS as i64],
        )?;
        Ok(())
    }

    /// Today's record, or a zero-valued one if nothing has been recorded yet.
    pub fn today(&self) -> Result<DailyStats, rusqlite::Error> {
        let today = Self::today_key();
        let row = self
            .conn
            .query_row(
                "SELECT date, breaks_completed, breaks_skipped, total_break_secs
                 FROM daily_stats WHERE date = ?1",
                params![today.to_string()],
                Self::row_to_stats,
            )
            .optional()?;
        Ok(row.unwrap_or_else(|| DailyStats::empty(today)))
    }

    /// Up to `limit` daily records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<DailyStats>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT date, breaks_completed, breaks_skipped, total_break_secs
             FROM daily_stats ORDER BY date DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::row_to_stats)?;
        rows.collect()
    }

    /// Clear the entire statistics collection.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn reset(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM daily_stats", [])?;
        Ok(())
    }

    fn row_to_stats(row: &rusqlite::Row<'_>) -> Result<DailyStats, rusqlite::Error> {
        let date: String = row.get(0)?;
        let date = date.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        Ok(DailyStats {
            date,
            breaks_completed: row.get(1)?,
            breaks_skipped: row.get(2)?,
            total_break_secs: row.get(3)?,
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    #[cfg(test)]
    fn insert_day(&self, date: NaiveDate, completed: u32) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO daily_stats (date, breaks_completed, breaks_skipped, total_break_secs)
             VALUES (?1, ?2, 0, 0)
             ON CONFLICT(date) DO UPDATE SET breaks_completed = breaks_completed + excluded.breaks_completed",
            params![date.to_string(), completed],
        )?;
        self.prune()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn today_is_zero_valued_before_first_write() {
        let db = Database::open_memory().unwrap();
        let today = db.today().unwrap();
        assert_eq!(today.breaks_completed, 0);
        assert_eq!(today.breaks_skipped, 0);
        assert_eq!(today.total_break_secs, 0);
    }

    #[test]
    fn completions_and_skips_accumulate_in_one_row() {
        let db = Database::open_memory().unwrap();
        db.record_completion(20).unwrap();
        db.record_completion(20).unwrap();
        db.record_skip().unwrap();

        let today = db.today().unwrap();
        assert_eq!(today.breaks_completed, 2);
        assert_eq!(today.breaks_skipped, 1);
        assert_eq!(today.total_break_secs, 40);

        // Same calendar day merges: still a single row.
        assert_eq!(db.recent(100).unwrap().len(), 1);
    }

    #[test]
    fn retention_keeps_30_most_recent_days() {
        let db = Database::open_memory().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for offset in 0..35 {
            db.insert_day(start + Duration::days(offset), 1).unwrap();
        }

        let rows = db.recent(100).unwrap();
        assert_eq!(rows.len(), RETENTION_DAYS);
        // Newest first; the 5 oldest days were dropped.
        assert_eq!(rows[0].date, start + Duration::days(34));
        assert_eq!(rows[rows.len() - 1].date, start + Duration::days(5));
    }

    #[test]
    fn reset_clears_collection() {
        let db = Database::open_memory().unwrap();
        db.record_completion(20).unwrap();
        db.reset().unwrap();
        assert!(db.recent(10).unwrap().is_empty());
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn stats_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eyebreak.db");
        {
            let db = Database {
                conn: Connection::open(&path).unwrap(),
            };
            db.migrate().unwrap();
            db.record_completion(20).unwrap();
            db.record_skip().unwrap();
        }

        let db = Database {
            conn: Connection::open(&path).unwrap(),
        };
        db.migrate().unwrap();
        let today = db.today().unwrap();
        assert_eq!(today.breaks_completed, 1);
        assert_eq!(today.breaks_skipped, 1);
    }
}
