use chrono::{DateTime, Local};
use csv::WriterBuilder;
use rusqlite::{params, Connection, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::config::{Difficulty, WorkoutConfig};
use crate::session::SessionState;

/// Oldest records beyond this count are evicted on every append.
pub const HISTORY_CAP: usize = 100;

/// Immutable summary of one finished workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    /// Epoch milliseconds at completion, stored as a string key.
    pub id: String,
    pub timestamp: DateTime<Local>,
    pub workout_type: String,
    pub difficulty: Difficulty,
    pub rounds: u32,
    pub rounds_completed: u32,
    pub rounds_attempted: u32,
    pub round_length_seconds: u32,
    pub break_length_seconds: u32,
    pub total_duration_seconds: u32,
    pub completion_percentage: u32,
    pub calories_burned: u32,
}

/// Calorie estimate from MET, body weight and active duration:
/// `MET * kg * hours`, rounded to the nearest whole calorie.
pub fn calories_burned(difficulty: Difficulty, weight_kg: f64, duration_secs: u32) -> u32 {
    let hours = f64::from(duration_secs) / 3600.0;
    (f64::from(difficulty.met()) * weight_kg * hours).round() as u32
}

/// Build the record for a session that has reached `Complete`.
pub fn record_completion(
    state: &SessionState,
    config: &WorkoutConfig,
    weight_kg: f64,
) -> WorkoutRecord {
    let now = Local::now();
    let completion = if config.rounds == 0 {
        0
    } else {
        (f64::from(state.rounds_completed) * 100.0 / f64::from(config.rounds)).round() as u32
    };
    WorkoutRecord {
        id: now.timestamp_millis().to_string(),
        timestamp: now,
        workout_type: config.workout_type.clone(),
        difficulty: config.difficulty,
        rounds: config.rounds,
        rounds_completed: state.rounds_completed,
        rounds_attempted: state.rounds_attempted,
        round_length_seconds: config.round_length_secs,
        break_length_seconds: config.break_length_secs,
        total_duration_seconds: state.elapsed_total_secs,
        completion_percentage: completion,
        calories_burned: calories_burned(config.difficulty, weight_kg, state.elapsed_total_secs),
    }
}

/// Lifetime aggregates over the stored history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryTotals {
    pub workouts: u32,
    pub rounds_completed: u32,
    pub total_duration_seconds: u32,
    pub calories_burned: u32,
}

/// Database manager for the workout history.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database in the app state directory, creating it if needed.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("hitr_history.db"));
        Self::open(&db_path)
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS workout_history (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                workout_type TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                rounds INTEGER NOT NULL,
                rounds_completed INTEGER NOT NULL,
                rounds_attempted INTEGER NOT NULL,
                round_length_seconds INTEGER NOT NULL,
                break_length_seconds INTEGER NOT NULL,
                total_duration_seconds INTEGER NOT NULL,
                completion_percentage INTEGER NOT NULL,
                calories_burned INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_workout_history_timestamp ON workout_history(timestamp)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    /// Insert a record and evict the oldest entries past `HISTORY_CAP`.
    pub fn append(&self, record: &WorkoutRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO workout_history
            (id, timestamp, workout_type, difficulty, rounds, rounds_completed,
             rounds_attempted, round_length_seconds, break_length_seconds,
             total_duration_seconds, completion_percentage, calories_burned)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                record.id,
                record.timestamp.to_rfc3339(),
                record.workout_type,
                record.difficulty.to_string(),
                record.rounds,
                record.rounds_completed,
                record.rounds_attempted,
                record.round_length_seconds,
                record.break_length_seconds,
                record.total_duration_seconds,
                record.completion_percentage,
                record.calories_burned,
            ],
        )?;

        self.conn.execute(
            r#"
            DELETE FROM workout_history WHERE id NOT IN (
                SELECT id FROM workout_history
                ORDER BY CAST(id AS INTEGER) DESC
                LIMIT ?1
            )
            "#,
            params![HISTORY_CAP as i64],
        )?;

        Ok(())
    }

    /// All stored records, newest first. Ordering uses the numeric value of
    /// `id` (epoch millis), which stays a total order across UTC-offset
    /// changes where the RFC3339 timestamp text would not.
    pub fn list(&self) -> Result<Vec<WorkoutRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, timestamp, workout_type, difficulty, rounds, rounds_completed,
                   rounds_attempted, round_length_seconds, break_length_seconds,
                   total_duration_seconds, completion_percentage, calories_burned
            FROM workout_history
            ORDER BY CAST(id AS INTEGER) DESC
            "#,
        )?;

        let record_iter = stmt.query_map([], |row| {
            let timestamp_str: String = row.get(1)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        1,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            let difficulty_str: String = row.get(3)?;
            let difficulty = Difficulty::from_key(&difficulty_str).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    3,
                    "difficulty".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;

            Ok(WorkoutRecord {
                id: row.get(0)?,
                timestamp,
                workout_type: row.get(2)?,
                difficulty,
                rounds: row.get(4)?,
                rounds_completed: row.get(5)?,
                rounds_attempted: row.get(6)?,
                round_length_seconds: row.get(7)?,
                break_length_seconds: row.get(8)?,
                total_duration_seconds: row.get(9)?,
                completion_percentage: row.get(10)?,
                calories_burned: row.get(11)?,
            })
        })?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn totals(&self) -> Result<HistoryTotals> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(rounds_completed), 0),
                   COALESCE(SUM(total_duration_seconds), 0),
                   COALESCE(SUM(calories_burned), 0)
            FROM workout_history
            "#,
        )?;

        stmt.query_row([], |row| {
            Ok(HistoryTotals {
                workouts: row.get(0)?,
                rounds_completed: row.get(1)?,
                total_duration_seconds: row.get(2)?,
                calories_burned: row.get(3)?,
            })
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM workout_history", [])?;
        Ok(())
    }
}

/// Append one record to the plain-text CSV log next to the database. The
/// header row is written only when the file does not exist yet.
pub fn append_csv_log(path: &Path, record: &WorkoutRecord) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let new_file = !path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    if new_file {
        writer.write_record([
            "id",
            "timestamp",
            "workout_type",
            "difficulty",
            "rounds",
            "rounds_completed",
            "rounds_attempted",
            "round_length_seconds",
            "break_length_seconds",
            "total_duration_seconds",
            "completion_percentage",
            "calories_burned",
        ])?;
    }
    writer.write_record([
        record.id.clone(),
        record.timestamp.to_rfc3339(),
        record.workout_type.clone(),
        record.difficulty.to_string(),
        record.rounds.to_string(),
        record.rounds_completed.to_string(),
        record.rounds_attempted.to_string(),
        record.round_length_seconds.to_string(),
        record.break_length_seconds.to_string(),
        record.total_duration_seconds.to_string(),
        record.completion_percentage.to_string(),
        record.calories_burned.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}
