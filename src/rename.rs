#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::{
    constants::{CHECKSUM_SUFFIX_PATTERN, ROSTER_ID_PATTERN},
    roster::is_synthetic_id,
    util::{decode_latin1, find_files, md5_hex},
};

/// Identity fields read from a returned submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionIdentity {
    /// Student name as written after the name label
    pub name:     String,
    /// Student id, lowercased
    pub id:       String,
    /// MD5 of the raw file contents
    pub checksum: String,
}

impl SubmissionIdentity {
    /// Normalized file name, `<name>_<id>_<checksum>.txt`. Name and id stay
    /// inside the folder: path separators and other characters not allowed
    /// in file names become `_`.
    pub fn file_name(&self) -> String {
        format!("{}_{}_{}.txt", file_safe(&self.name), file_safe(&self.id), self.checksum)
    }
}

/// Replaces whitespace, path separators and characters reserved on common
/// file systems with `_`.
fn file_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// A pending rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    /// Current path
    pub from: PathBuf,
    /// Path after renaming
    pub to:   PathBuf,
}

/// Extracts name and id from submission text and the file name.
pub struct IdentityParser {
    /// Text following the name label up to the end of the line
    name_re:   Regex,
    /// Text following the id label up to the end of the line
    id_re:     Regex,
    /// Roster style number, looked for in the file name
    roster_id: Regex,
    /// `_<md5>.txt` suffix of already processed files
    processed: Regex,
}

impl IdentityParser {
    /// Parser for the given header labels, eg. `Nome` and `(mec)`.
    pub fn new(name_label: &str, id_label: &str) -> Result<Self> {
        Ok(Self {
            name_re:   Regex::new(&format!(r"{}([^\r\n]*)", regex::escape(name_label)))?,
            id_re:     Regex::new(&format!(r"{}([^\r\n]*)", regex::escape(id_label)))?,
            roster_id: Regex::new(ROSTER_ID_PATTERN)?,
            processed: Regex::new(CHECKSUM_SUFFIX_PATTERN)?,
        })
    }

    /// Whether `file_name` already carries a checksum suffix.
    pub fn is_processed(&self, file_name: &str) -> bool {
        self.processed.is_match(file_name)
    }

    /// Reads the identity of a submission. The first name and id labels win.
    /// A synthetic (`NA`) id is replaced by a number found in the file name.
    /// Returns `None` when either label is missing.
    pub fn identify(&self, file_name: &str, bytes: &[u8]) -> Option<SubmissionIdentity> {
        let text = decode_latin1(bytes);
        let name = self.name_re.captures(&text)?.get(1)?.as_str().trim().to_string();
        let mut id = self.id_re.captures(&text)?.get(1)?.as_str().trim().to_lowercase();

        if is_synthetic_id(&id)
            && let Some(from_name) = self.roster_id.find(file_name)
        {
            tracing::info!("{file_name}: using id {} from the file name", from_name.as_str());
            id = from_name.as_str().to_lowercase();
        }

        Some(SubmissionIdentity {
            name,
            id,
            checksum: md5_hex(bytes),
        })
    }
}

/// Works out the renames for `folder` without touching anything.
pub fn plan_renames(folder: &Path, parser: &IdentityParser) -> Result<Vec<Rename>> {
    let mut plan = vec![];
    for path in find_files("txt", folder)? {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if parser.is_processed(&file_name) {
            continue;
        }

        let bytes =
            std::fs::read(&path).with_context(|| format!("Could not read {}", path.display()))?;
        match parser.identify(&file_name, &bytes) {
            Some(identity) => plan.push(Rename {
                to: folder.join(identity.file_name()),
                from: path,
            }),
            None => tracing::warn!("{file_name}: no name or number found, left as is"),
        }
    }
    Ok(plan)
}

/// Renames every unprocessed `.txt` submission in `folder` to
/// `<name>_<id>_<md5>.txt`. Returns the renames performed.
pub fn rename_completed_tests(folder: &Path, parser: &IdentityParser) -> Result<Vec<Rename>> {
    let plan = plan_renames(folder, parser)?;
    for rename in &plan {
        tracing::info!(
            "rename {} to {}",
            rename.from.file_name().unwrap_or_default().to_string_lossy(),
            rename.to.file_name().unwrap_or_default().to_string_lossy()
        );
        std::fs::rename(&rename.from, &rename.to)
            .with_context(|| format!("Could not rename {}", rename.from.display()))?;
    }
    Ok(plan)
}
