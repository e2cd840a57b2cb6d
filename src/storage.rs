//! Score persistence.
//!
//! The session only needs two things from storage: a best score to seed a
//! new session, and a way to record a finished game. [`ScoreStore`] captures
//! that contract; [`MemoryStore`] and [`JsonFileStore`] implement it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::Score;

/// Number of entries kept in the high-score list.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// One finished game in the high-score list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: Score,
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
}

impl ScoreEntry {
    /// Entry stamped with today's local date.
    pub fn today(name: &str, score: Score) -> Self {
        ScoreEntry {
            name: name.to_string(),
            score,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt score data: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage unavailable")]
    Unavailable,
}

/// Backing store for high scores and the best score.
pub trait ScoreStore {
    /// Best score recorded so far; 0 when nothing has been recorded.
    fn best_score(&self) -> Result<Score, StorageError>;

    /// Record a finished game.
    fn record_score(&mut self, name: &str, score: Score) -> Result<(), StorageError>;

    /// Recorded games, highest score first.
    fn high_scores(&self) -> Result<Vec<ScoreEntry>, StorageError>;

    /// Forget every recorded game and the best score.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Serialized contents of a score store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBook {
    #[serde(default)]
    pub scores: Vec<ScoreEntry>,
    #[serde(default)]
    pub best_score: Score,
}

impl ScoreBook {
    /// Insert `entry`, keep the top `max_entries` by descending score, and
    /// raise the best score if needed. Ties keep insertion order.
    pub fn insert(&mut self, entry: ScoreEntry, max_entries: usize) {
        self.best_score = self.best_score.max(entry.score);
        self.scores.push(entry);
        self.scores.sort_by(|a, b| b.score.cmp(&a.score));
        self.scores.truncate(max_entries);
    }
}

/// In-process store. Used by tests and by embedders without a disk.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    book: ScoreBook,
    max_entries: usize,
    failing: bool,
}

impl Default for MemoryStore {
    fn default() -> Self { MemoryStore::new() }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore { book: ScoreBook::default(), max_entries: DEFAULT_MAX_ENTRIES, failing: false }
    }

    /// Store that starts with `best` as its best score and no entries.
    pub fn with_best_score(best: Score) -> Self {
        let mut store = MemoryStore::new();
        store.book.best_score = best;
        store
    }

    /// Make every call fail with [`StorageError::Unavailable`].
    pub fn set_failing(&mut self, failing: bool) { self.failing = failing; }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing { Err(StorageError::Unavailable) } else { Ok(()) }
    }
}

impl ScoreStore for MemoryStore {
    fn best_score(&self) -> Result<Score, StorageError> {
        self.check()?;
        Ok(self.book.best_score)
    }

    fn record_score(&mut self, name: &str, score: Score) -> Result<(), StorageError> {
        self.check()?;
        self.book.insert(ScoreEntry::today(name, score), self.max_entries);
        Ok(())
    }

    fn high_scores(&self) -> Result<Vec<ScoreEntry>, StorageError> {
        self.check()?;
        Ok(self.book.scores.clone())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.check()?;
        self.book = ScoreBook::default();
        Ok(())
    }
}

/// JSON file store. Every call reads or rewrites the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    max_entries: usize,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonFileStore { path: path.as_ref().to_path_buf(), max_entries: DEFAULT_MAX_ENTRIES }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn path(&self) -> &Path { &self.path }

    fn load(&self) -> Result<ScoreBook, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ScoreBook::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, book: &ScoreBook) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(book)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn best_score(&self) -> Result<Score, StorageError> {
        Ok(self.load()?.best_score)
    }

    fn record_score(&mut self, name: &str, score: Score) -> Result<(), StorageError> {
        let mut book = self.load()?;
        book.insert(ScoreEntry::today(name, score), self.max_entries);
        self.save(&book)
    }

    fn high_scores(&self) -> Result<Vec<ScoreEntry>, StorageError> {
        Ok(self.load()?.scores)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
