#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashMap, fmt::Write as _, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{ROSTER_BOILERPLATE, ROSTER_ID_PATTERN, SYNTHETIC_ID_PREFIX};

/// An enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Institutional student number, or a synthetic `NA<n>` placeholder
    pub id:   String,
    /// Full name as written in the roster
    pub name: String,
}

/// Errors specific to roster parsing.
#[derive(thiserror::Error, Debug)]
pub enum RosterError {
    /// Two rows carry the same student number.
    #[error("two entries with the same number!\n{id} {first}\n{id} {second}")]
    DuplicateId {
        /// The shared id.
        id:     String,
        /// Name of the row seen first.
        first:  String,
        /// Name of the row seen second.
        second: String,
    },
    /// The id pattern does not compile.
    #[error("invalid roster id pattern")]
    Pattern(#[from] regex::Error),
}

/// The parsed roster, in sorted input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// Students, one per non-comment roster row
    students:  Vec<Student>,
    /// How many rows had no student number
    synthetic: usize,
}

impl Roster {
    /// Reads and parses a roster file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read roster {}", path.display()))?;
        Ok(Self::parse(&text)?)
    }

    /// Parses roster text. The first line is a header and is skipped, the
    /// remaining lines are sorted before parsing and `#` lines are ignored.
    pub fn parse(text: &str) -> Result<Self, RosterError> {
        let id_re = Regex::new(ROSTER_ID_PATTERN)?;

        let rows = text.lines().skip(1).sorted();

        let mut students: Vec<Student> = vec![];
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut synthetic = 0;

        for row in rows {
            if row.starts_with('#') || row.trim().is_empty() {
                continue;
            }
            // delimiters separate fields, other punctuation is dropped
            let row: String = row
                .chars()
                .filter_map(|c| match c {
                    ',' | ';' => Some(' '),
                    c if c.is_ascii_punctuation() => None,
                    c => Some(c),
                })
                .collect();

            let id = match id_re.find(&row) {
                Some(m) => m.as_str().to_string(),
                None => {
                    synthetic += 1;
                    format!("{SYNTHETIC_ID_PREFIX}{synthetic}")
                }
            };

            let name = id_re
                .replace_all(&row, " ")
                .split_whitespace()
                .filter(|word| !ROSTER_BOILERPLATE.contains(word))
                .join(" ");

            if let Some(&index) = seen.get(&id) {
                return Err(RosterError::DuplicateId {
                    id,
                    first: students[index].name.clone(),
                    second: name,
                });
            }
            seen.insert(id.clone(), students.len());
            students.push(Student { id, name });
        }

        Ok(Self {
            students,
            synthetic,
        })
    }

    /// Students in roster order.
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Student ids, parallel to [`Roster::names`].
    pub fn ids(&self) -> Vec<&str> {
        self.students.iter().map(|s| s.id.as_str()).collect()
    }

    /// Student names, parallel to [`Roster::ids`].
    pub fn names(&self) -> Vec<&str> {
        self.students.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of students.
    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// Whether the roster has no students.
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// How many ids were generated because the row had none.
    pub fn synthetic_count(&self) -> usize {
        self.synthetic
    }

    /// Renders the roster as `Name,Number` CSV with a trailing count comment.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Name,Number\n");
        for s in &self.students {
            let _ = writeln!(out, "{},{}", s.name, s.id);
        }
        let _ = writeln!(out, "# totally {} students", self.students.len());
        out
    }
}

/// Whether an id was generated by the roster parser rather than read.
pub fn is_synthetic_id(id: &str) -> bool {
    id.to_ascii_uppercase().starts_with(SYNTHETIC_ID_PREFIX)
}
