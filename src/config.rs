#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_END_SEPARATOR, DEFAULT_HEADER, DEFAULT_QUESTION_MARKER, DEFAULT_QUESTION_SEPARATOR,
    PLACEHOLDER_ROSTER, SETTINGS_ENV, SETTINGS_FILE, UUID_PATTERN,
};

/// Errors raised while locating or reading the settings file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No settings file where one was expected.
    #[error("No {} found at `{}`, run `create_settings` first.", SETTINGS_FILE, .0.display())]
    Missing(PathBuf),
    /// The settings file exists but could not be read.
    #[error("Could not read settings from `{path}`")]
    Read {
        /// Settings file that failed.
        path:   PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not valid TOML for the schema.
    #[error("Could not parse settings in `{path}`")]
    Parse {
        /// Settings file that failed.
        path:   PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A value parsed but makes no sense.
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid {
        /// Offending key.
        key:    &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// One entry of the question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Registry name of the question type, eg. `reverse_complement`
    pub kind:   String,
    /// Weight of the question in the final grade
    pub points: f64,
    /// Extra files bundled with every exam containing this question
    #[serde(default)]
    pub files:  Vec<PathBuf>,
}

/// Settings for the external archiver and the move that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    /// Archiver executable, looked up on `PATH`
    pub program:         String,
    /// Length of the password shared by all archives of a run
    pub password_length: usize,
    /// How many times the produced archive is looked for before giving up
    pub move_attempts:   u32,
    /// Pause between two attempts, in milliseconds
    pub move_backoff_ms: u64,
    /// Upper bound on a single archiver invocation, in seconds
    pub timeout_secs:    u64,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            program:         "7za".into(),
            password_length: 5,
            move_attempts:   10,
            move_backoff_ms: 100,
            timeout_secs:    120,
        }
    }
}

impl ArchiveSettings {
    /// Pause between two move attempts.
    pub fn move_backoff(&self) -> Duration {
        Duration::from_millis(self.move_backoff_ms)
    }

    /// Deadline of one archiver run.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Typed contents of `exam.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Folder the settings were loaded from; relative paths resolve against it
    #[serde(skip)]
    root: PathBuf,

    /// Folder holding the question store
    pub shelf_folder:              PathBuf,
    /// Folder receiving the password protected archives
    pub exam_folder:               PathBuf,
    /// Folder receiving the answer keys
    pub correct_exam_folder:       PathBuf,
    /// Folder holding the submissions returned by the students
    pub returned_exam_folder:      PathBuf,
    /// Roster file, `Name,Number` per line
    pub student_list_file:         PathBuf,
    /// Prefix of the timestamped correction folder
    pub correction_folder:         String,
    /// Scratch folder used to assemble archives, defaults to the system temp dir
    pub staging_folder:            Option<PathBuf>,
    /// Files bundled with every exam
    pub additional_included_files: Vec<PathBuf>,

    /// Regular expression matching the question id markers
    pub uuid_pattern:       String,
    /// Text placed before every question, `{}` becomes the question number
    pub question_separator: String,
    /// Marker line placed before every question body, `{id}` becomes the id
    pub question_marker:    String,
    /// Trailer of every exam; anything after it in a submission is ignored
    pub end_separator:      String,
    /// Exam header template
    pub header:             String,
    /// Label preceding the student's name in the header
    pub name_label:         String,
    /// Label preceding the student's number in the header
    pub id_label:           String,

    /// Questions of the exam, in order
    pub questions: Vec<QuestionSpec>,
    /// Archiver settings
    pub archive:   ArchiveSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            shelf_folder: "shelf".into(),
            exam_folder: "empty_exams".into(),
            correct_exam_folder: "correct_exams".into(),
            returned_exam_folder: "returned_exams".into(),
            student_list_file: "students.txt".into(),
            correction_folder: "correction_".into(),
            staging_folder: None,
            additional_included_files: vec![],
            uuid_pattern: UUID_PATTERN.into(),
            question_separator: DEFAULT_QUESTION_SEPARATOR.into(),
            question_marker: DEFAULT_QUESTION_MARKER.into(),
            end_separator: DEFAULT_END_SEPARATOR.into(),
            header: DEFAULT_HEADER.into(),
            name_label: "Nome".into(),
            id_label: "(mec)".into(),
            questions: vec![],
            archive: ArchiveSettings::default(),
        }
    }
}

impl Settings {
    /// Returns the settings file to use for `folder`: the one named by
    /// `INFORMATICS_EXAM_SETTINGS` if set, else `exam.toml` inside `folder`.
    pub fn locate(folder: &Path) -> PathBuf {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => folder.join(SETTINGS_FILE),
        }
    }

    /// Loads the settings that apply to `folder`.
    pub fn load(folder: &Path) -> Result<Self, ConfigError> {
        Self::from_file(&Self::locate(folder))
    }

    /// Parses a settings file and validates it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from TOML text; relative paths resolve against `.`.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Returns a copy whose relative paths resolve against `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Checks values that the schema alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        regex::Regex::new(&self.uuid_pattern).map_err(|e| ConfigError::Invalid {
            key:    "uuid_pattern",
            reason: e.to_string(),
        })?;
        if !self.question_separator.contains("{}") {
            return Err(ConfigError::Invalid {
                key:    "question_separator",
                reason: "must contain `{}` for the question number".into(),
            });
        }
        if !self.question_marker.contains("{id}") {
            return Err(ConfigError::Invalid {
                key:    "question_marker",
                reason: "must contain `{id}`".into(),
            });
        }
        if self.archive.password_length == 0 {
            return Err(ConfigError::Invalid {
                key:    "archive.password_length",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(q) = self.questions.iter().find(|q| q.points.is_nan() || q.points <= 0.0) {
            return Err(ConfigError::Invalid {
                key:    "questions",
                reason: format!("question `{}` must be worth a positive number of points", q.kind),
            });
        }
        Ok(())
    }

    /// Folder the settings were loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a configured path against the settings folder.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Folder of the question store.
    pub fn shelf_dir(&self) -> PathBuf {
        self.resolve(&self.shelf_folder)
    }

    /// Folder receiving the archives.
    pub fn exam_dir(&self) -> PathBuf {
        self.resolve(&self.exam_folder)
    }

    /// Folder receiving the answer keys.
    pub fn correct_exam_dir(&self) -> PathBuf {
        self.resolve(&self.correct_exam_folder)
    }

    /// Folder of returned submissions.
    pub fn returned_exam_dir(&self) -> PathBuf {
        self.resolve(&self.returned_exam_folder)
    }

    /// Roster file.
    pub fn student_list(&self) -> PathBuf {
        self.resolve(&self.student_list_file)
    }

    /// Correction folder for a run started at `stamp`.
    pub fn correction_dir(&self, stamp: &str) -> PathBuf {
        self.root.join(format!("{}_{stamp}", self.correction_folder))
    }

    /// Scratch folder for archive assembly.
    pub fn staging_dir(&self) -> PathBuf {
        match &self.staging_folder {
            Some(dir) => self.resolve(dir),
            None => std::env::temp_dir().join("informatics_exam"),
        }
    }

    /// Files bundled with every exam, resolved.
    pub fn included_files(&self) -> Vec<PathBuf> {
        self.additional_included_files
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    /// Renders the exam header for one student.
    pub fn render_header(&self, name: &str, id: &str, timestamp: i64) -> String {
        self.header
            .replace("{name}", name)
            .replace("{id}", id)
            .replace("{mec}", id)
            .replace("{timestamp}", &timestamp.to_string())
            .replace("{number_of_questions}", &self.questions.len().to_string())
    }

    /// Renders the separator placed before question `number` (1-based).
    pub fn render_separator(&self, number: usize) -> String {
        self.question_separator.replacen("{}", &number.to_string(), 1)
    }

    /// Renders the id marker of a question.
    pub fn render_marker(&self, id: &str) -> String {
        self.question_marker.replace("{id}", id)
    }
}

/// Template written by `create_settings`.
const SETTINGS_TEMPLATE: &str = r#"# Settings for informatics_exam. Relative paths resolve against this folder.

shelf_folder         = "shelf"
exam_folder          = "empty_exams"
correct_exam_folder  = "correct_exams"
returned_exam_folder = "returned_exams"
student_list_file    = "students.txt"
correction_folder    = "correction_"

# Files bundled with every exam.
additional_included_files = []

uuid_pattern       = "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}"
question_separator = "\n*********** Question {} ***********\n"
question_marker    = "QuestionID {id}\n"
name_label         = "Nome"
id_label           = "(mec)"

[[questions]]
kind   = "reverse_complement"
points = 1

[[questions]]
kind   = "sequence_size"
points = 1

[[questions]]
kind   = "gc_content"
points = 2

[archive]
program         = "7za"
password_length = 5
move_attempts   = 10
move_backoff_ms = 100
"#;

/// Writes a default `exam.toml` into `folder` unless one exists.
/// Returns `true` when a file was written.
pub fn create_settings(folder: &Path) -> Result<bool> {
    let path = folder.join(SETTINGS_FILE);
    if path.exists() {
        tracing::info!("{} already exists.", path.display());
        return Ok(false);
    }
    std::fs::create_dir_all(folder)
        .with_context(|| format!("Could not create {}", folder.display()))?;
    std::fs::write(&path, SETTINGS_TEMPLATE)
        .with_context(|| format!("Could not write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(true)
}

/// Creates the folder layout declared in the settings and seeds a placeholder
/// roster when none exists.
pub fn create_folders(settings: &Settings) -> Result<()> {
    for dir in [
        settings.shelf_dir(),
        settings.exam_dir(),
        settings.correct_exam_dir(),
        settings.returned_exam_dir(),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Could not create {}", dir.display()))?;
    }

    let roster = settings.student_list();
    if !roster.exists() {
        std::fs::write(&roster, PLACEHOLDER_ROSTER)
            .with_context(|| format!("Could not write {}", roster.display()))?;
        tracing::info!("Seeded {}", roster.display());
    }
    Ok(())
}

/// Loads the settings of `folder` and creates its folder layout. Fails with
/// [`ConfigError::Missing`] when `folder` has no settings file.
pub fn create_folders_in(folder: &Path) -> Result<()> {
    let settings = Settings::load(folder)?;
    create_folders(&settings)
}
