use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, Connection};
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::error::{StoreError, StoreResult};
use crate::heatmap::{ErrorAggregator, ErrorHeatmap, ErrorHistory, ErrorHistoryEntry};
use crate::session::{Difficulty, SessionResult};

/// Persistence port for results and error statistics.
///
/// Loads never fail: unreadable data is logged and treated as empty so a
/// broken store cannot interrupt a session. Saves report errors for the
/// caller to log.
pub trait ProgressStore {
    fn load_results(&self) -> Vec<SessionResult>;
    fn append_result(&self, result: &SessionResult) -> StoreResult<()>;
    fn load_error_history(&self) -> ErrorHistory;
    fn save_error_history(&self, history: &ErrorHistory) -> StoreResult<()>;
    fn load_heatmap(&self) -> ErrorHeatmap;
    fn save_heatmap(&self, heatmap: &ErrorHeatmap) -> StoreResult<()>;

    fn load_aggregator(&self) -> ErrorAggregator {
        ErrorAggregator::new(self.load_heatmap(), self.load_error_history())
    }

    fn save_aggregator(&self, aggregator: &ErrorAggregator) -> StoreResult<()> {
        self.save_heatmap(aggregator.heatmap())?;
        self.save_error_history(aggregator.history())
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        wpm REAL NOT NULL,
        cpm REAL NOT NULL,
        accuracy REAL NOT NULL,
        time REAL NOT NULL,
        date TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        correct_chars INTEGER NOT NULL DEFAULT 0,
        incorrect_chars INTEGER NOT NULL DEFAULT 0,
        consistency REAL NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_results_difficulty ON results(difficulty);
    CREATE TABLE IF NOT EXISTS error_history (
        date TEXT PRIMARY KEY,
        count INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS error_heatmap (
        character TEXT PRIMARY KEY,
        count INTEGER NOT NULL
    );
"#;

/// SQLite-backed store, by default under $HOME/.local/state/typeheat
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new() -> StoreResult<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("typeheat_stats.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened stats database");
        Self::with_connection(conn)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn try_load_results(&self) -> StoreResult<Vec<SessionResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wpm, cpm, accuracy, time, date, difficulty,
                   correct_chars, incorrect_chars, consistency
            FROM results
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, f64>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, usize>(6)?,
                row.get::<_, usize>(7)?,
                row.get::<_, f64>(8)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (wpm, cpm, accuracy, time, date, difficulty, correct, incorrect, consistency) = row?;
            let date = DateTime::parse_from_rfc3339(&date)
                .map_err(|e| StoreError::Malformed(format!("result date {date:?}: {e}")))?
                .with_timezone(&Local);

            results.push(SessionResult {
                wpm,
                cpm,
                accuracy,
                time,
                date,
                difficulty: Difficulty::from_tag(&difficulty),
                correct_chars: correct,
                incorrect_chars: incorrect,
                consistency,
            });
        }
        Ok(results)
    }

    fn try_load_error_history(&self) -> StoreResult<ErrorHistory> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, count FROM error_history ORDER BY date")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (date, count) = row?;
            let date: NaiveDate = date
                .parse()
                .map_err(|e| StoreError::Malformed(format!("history date {date:?}: {e}")))?;
            entries.push(ErrorHistoryEntry { date, count });
        }
        Ok(ErrorHistory::from_entries(entries))
    }

    fn try_load_heatmap(&self) -> StoreResult<ErrorHeatmap> {
        let mut stmt = self
            .conn
            .prepare("SELECT character, count FROM error_heatmap")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (character, count) = row?;
            let c = character
                .chars()
                .next()
                .ok_or_else(|| StoreError::Malformed("empty heatmap character".to_string()))?;
            counts.push((c, count));
        }
        Ok(ErrorHeatmap::from_counts(counts))
    }
}

impl ProgressStore for SqliteStore {
    fn load_results(&self) -> Vec<SessionResult> {
        self.try_load_results().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load results, continuing without history");
            Vec::new()
        })
    }

    fn append_result(&self, result: &SessionResult) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO results
            (wpm, cpm, accuracy, time, date, difficulty, correct_chars, incorrect_chars, consistency)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                result.wpm,
                result.cpm,
                result.accuracy,
                result.time,
                result.date.to_rfc3339(),
                result.difficulty.to_string(),
                result.correct_chars,
                result.incorrect_chars,
                result.consistency,
            ],
        )?;
        Ok(())
    }

    fn load_error_history(&self) -> ErrorHistory {
        self.try_load_error_history().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load error history, starting empty");
            ErrorHistory::new()
        })
    }

    fn save_error_history(&self, history: &ErrorHistory) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM error_history", [])?;
        for entry in history.entries() {
            tx.execute(
                "INSERT INTO error_history (date, count) VALUES (?1, ?2)",
                params![entry.date.to_string(), entry.count],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_heatmap(&self) -> ErrorHeatmap {
        self.try_load_heatmap().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load error heatmap, starting empty");
            ErrorHeatmap::new()
        })
    }

    fn save_heatmap(&self, heatmap: &ErrorHeatmap) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM error_heatmap", [])?;
        for (c, count) in heatmap.iter() {
            tx.execute(
                "INSERT INTO error_heatmap (character, count) VALUES (?1, ?2)",
                params![c.to_string(), count],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Volatile store for tests and `--no-save` style runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    results: Mutex<Vec<SessionResult>>,
    history: Mutex<ErrorHistory>,
    heatmap: Mutex<ErrorHeatmap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Malformed("store lock poisoned".to_string())
}

impl ProgressStore for MemoryStore {
    fn load_results(&self) -> Vec<SessionResult> {
        self.results.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn append_result(&self, result: &SessionResult) -> StoreResult<()> {
        self.results.lock().map_err(poisoned)?.push(result.clone());
        Ok(())
    }

    fn load_error_history(&self) -> ErrorHistory {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    fn save_error_history(&self, history: &ErrorHistory) -> StoreResult<()> {
        *self.history.lock().map_err(poisoned)? = history.clone();
        Ok(())
    }

    fn load_heatmap(&self) -> ErrorHeatmap {
        self.heatmap.lock().map(|h| h.clone()).unwrap_or_default()
    }

    fn save_heatmap(&self, heatmap: &ErrorHeatmap) -> StoreResult<()> {
        *self.heatmap.lock().map_err(poisoned)? = heatmap.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_result(wpm: f64, difficulty: Difficulty) -> SessionResult {
        SessionResult {
            wpm,
            cpm: wpm * 5.0,
            accuracy: 94.0,
            time: 60.0,
            date: Local.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
            difficulty,
            correct_chars: 300,
            incorrect_chars: 19,
            consistency: 3.25,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_results_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load_results().is_empty());

        let first = sample_result(55.0, Difficulty::Beginner);
        let second = sample_result(81.0, Difficulty::Code);
        store.append_result(&first).unwrap();
        store.append_result(&second).unwrap();

        let loaded = store.load_results();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_error_history_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut history = ErrorHistory::new();
        history.upsert(day(3), 12);
        history.upsert(day(1), 7);
        store.save_error_history(&history).unwrap();
        assert_eq!(store.load_error_history(), history);

        history.upsert(day(3), 15);
        store.save_error_history(&history).unwrap();
        assert_eq!(store.load_error_history().count_on(day(3)), 15);
        assert_eq!(store.load_error_history().len(), 2);
    }

    #[test]
    fn test_heatmap_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let heatmap = ErrorHeatmap::from_counts([('e', 4), (' ', 2), (';', 1)]);
        store.save_heatmap(&heatmap).unwrap();
        assert_eq!(store.load_heatmap(), heatmap);
    }

    #[test]
    fn test_corrupt_rows_load_as_empty() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO error_history (date, count) VALUES ('not-a-date', 3)",
                [],
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO results (wpm, cpm, accuracy, time, date, difficulty) \
                 VALUES (1, 5, 100, 10, 'yesterday', 'beginner')",
                [],
            )
            .unwrap();
        assert!(store.load_error_history().is_empty());
        assert!(store.load_results().is_empty());
    }

    #[test]
    fn test_unknown_difficulty_survives() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO results (wpm, cpm, accuracy, time, date, difficulty) \
                 VALUES (40, 200, 90, 30, '2026-10-01T12:00:00+00:00', 'nightmare')",
                [],
            )
            .unwrap();
        let results = store.load_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].difficulty, Difficulty::Unrecognized);
        assert_eq!(results[0].correct_chars, 0);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.append_result(&sample_result(70.0, Difficulty::Expert)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let results = store.load_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].difficulty, Difficulty::Expert);
    }

    #[test]
    fn test_aggregator_roundtrip_through_memory_store() {
        let store = MemoryStore::new();
        let mut agg = store.load_aggregator();
        agg.record_errors(&['x', 'x', 'k'], day(19));
        store.save_aggregator(&agg).unwrap();

        let reloaded = store.load_aggregator();
        assert_eq!(reloaded, agg);
        assert_eq!(reloaded.heatmap().get('x'), 2);
    }
}
