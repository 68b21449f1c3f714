#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use super::Question;

/// A question as persisted: enough to rebuild it through the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuestion {
    /// Question id
    pub id:     String,
    /// Registry name of the question type
    pub kind:   String,
    /// Weight
    pub points: f64,
    /// Kind specific state
    pub state:  serde_json::Value,
}

impl StoredQuestion {
    /// Captures a live question.
    pub fn capture(question: &dyn Question) -> Result<Self> {
        Ok(Self {
            id:     question.id().to_string(),
            kind:   question.kind().to_string(),
            points: question.points(),
            state:  question
                .state()
                .with_context(|| format!("Could not serialize question {}", question.id()))?,
        })
    }
}

/// Keyed mapping from question id to stored question.
pub trait QuestionStore {
    /// Inserts or replaces a question.
    fn put(&mut self, question: &StoredQuestion) -> Result<()>;

    /// Looks a question up by id.
    fn get(&self, id: &str) -> Result<Option<StoredQuestion>>;

    /// Number of stored questions.
    fn len(&self) -> Result<usize>;
}

/// Store kept in a single SQLite file.
pub struct SqliteStore {
    /// Open connection
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the store file inside `folder`.
    pub fn open(folder: &Path) -> Result<Self> {
        std::fs::create_dir_all(folder)
            .with_context(|| format!("Could not create {}", folder.display()))?;
        let path = folder.join(crate::constants::STORE_FILE);
        let conn = Connection::open(&path)
            .with_context(|| format!("Could not open question store {}", path.display()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS questions(
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                points REAL NOT NULL,
                state TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl QuestionStore for SqliteStore {
    fn put(&mut self, question: &StoredQuestion) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO questions(id, kind, points, state) VALUES (?1, ?2, ?3, ?4)",
                params![
                    question.id,
                    question.kind,
                    question.points,
                    serde_json::to_string(&question.state)?
                ],
            )
            .with_context(|| format!("Could not store question {}", question.id))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<StoredQuestion>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, kind, points, state FROM questions WHERE id = ?1",
                params![id],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, f64>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .with_context(|| format!("Could not look up question {id}"))?;

        row.map(|(id, kind, points, state)| {
            Ok(StoredQuestion {
                state: serde_json::from_str(&state)
                    .with_context(|| format!("Corrupt state for question {id}"))?,
                id,
                kind,
                points,
            })
        })
        .transpose()
    }

    fn len(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM questions", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}

/// In-memory store, handy in tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore(BTreeMap<String, StoredQuestion>);

impl QuestionStore for MemoryStore {
    fn put(&mut self, question: &StoredQuestion) -> Result<()> {
        self.0.insert(question.id.clone(), question.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<StoredQuestion>> {
        Ok(self.0.get(id).cloned())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.0.len())
    }
}
