use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::feedback::Feedback;
use crate::language::Difficulty;
use crate::session::Question;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS question_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        word TEXT NOT NULL,
        guess TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        band TEXT NOT NULL,
        was_correct BOOLEAN NOT NULL,
        score REAL NOT NULL,
        is_review BOOLEAN NOT NULL,
        timestamp TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_question_history_word ON question_history(word);
    CREATE INDEX IF NOT EXISTS idx_question_history_timestamp ON question_history(timestamp);
"#;

/// One answered question
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    /// Normalized hidden word
    pub word: String,
    pub guess: String,
    pub difficulty: Difficulty,
    pub band: String,
    pub was_correct: bool,
    pub score: f64,
    pub is_review: bool,
    pub timestamp: DateTime<Local>,
}

impl QuestionRecord {
    pub fn new(question: &Question, feedback: &Feedback) -> Self {
        Self {
            word: question.masked.token(),
            guess: feedback.guess.word.clone(),
            difficulty: question.difficulty,
            band: feedback.band.to_string(),
            was_correct: feedback.is_correct,
            score: feedback.performance_score(),
            is_review: question.is_review,
            timestamp: Local::now(),
        }
    }
}

/// Aggregate results for one difficulty tier
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultySummary {
    pub difficulty: Difficulty,
    pub asked: i64,
    pub correct: i64,
    pub average_score: f64,
}

impl DifficultySummary {
    pub fn accuracy(&self) -> f64 {
        if self.asked == 0 {
            0.0
        } else {
            self.correct as f64 / self.asked as f64
        }
    }
}

/// Opt-in persistent log of answered questions
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database at the default state location
    pub fn new() -> Result<Self> {
        let path = Self::database_path().unwrap_or_else(|| PathBuf::from("cloze_history.db"));
        Self::open(path)
    }

    /// Open or create the database at `path`, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(HistoryDb { conn })
    }

    pub fn database_path() -> Option<PathBuf> {
        AppDirs::db_path()
    }

    pub fn record(&self, record: &QuestionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO question_history
            (word, guess, difficulty, band, was_correct, score, is_review, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.word,
                record.guess,
                record.difficulty.to_string(),
                record.band,
                record.was_correct,
                record.score,
                record.is_review,
                record.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        let total = self
            .conn
            .query_row("SELECT COUNT(*) FROM question_history", [], |row| row.get(0))?;
        Ok(total)
    }

    /// Per-tier totals, easy to hard; tiers never played are left out
    pub fn summary(&self) -> Result<Vec<DifficultySummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                difficulty,
                COUNT(*) AS asked,
                SUM(CASE WHEN was_correct = 1 THEN 1 ELSE 0 END) AS correct,
                AVG(score) AS average_score
            FROM question_history
            GROUP BY difficulty
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let label: String = row.get(0)?;
            let difficulty = <Difficulty as ValueEnum>::from_str(&label, true).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    "difficulty".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;
            Ok(DifficultySummary {
                difficulty,
                asked: row.get(1)?,
                correct: row.get(2)?,
                average_score: row.get(3)?,
            })
        })?;

        let mut summary = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        summary.sort_by_key(|s| s.difficulty as u8);
        Ok(summary)
    }

    /// Words with the most wrong answers, most missed first
    pub fn most_missed(&self, limit: usize) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT word, COUNT(*) AS misses
            FROM question_history
            WHERE was_correct = 0
            GROUP BY word
            ORDER BY misses DESC, word ASC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let missed = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(missed)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM question_history", [])?;
        Ok(())
    }
}
