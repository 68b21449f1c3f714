#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::{
    config::Settings,
    constants::CHECKSUM_SUFFIX_PATTERN,
    question::{QuestionRegistry, QuestionStore},
    report::ReportRecord,
    util::{decode_detected, file_names, to_crlf, to_lf},
};

/// One answer block of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// 1-based position of the block in the exam
    pub number:      usize,
    /// Id found in the block's marker
    pub question_id: String,
    /// Text between this marker and the next question
    pub text:        String,
}

/// A parsed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// Name from the header
    pub name:    String,
    /// Id from the header
    pub id:      String,
    /// Answer blocks in exam order
    pub answers: Vec<Answer>,
}

/// Why a submission could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionIssue {
    /// Not a single question marker in the text.
    NoMarkers,
    /// The header lacks the name or the id line.
    MissingIdentity,
}

/// Something the operator has to look at before trusting the reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CorrectionWarning {
    /// A file could not be parsed and was left out.
    Unreadable {
        /// File name
        file:  String,
        /// What was wrong
        issue: SubmissionIssue,
    },
    /// A marker id is not in the question store.
    UnknownQuestion {
        /// File name
        file:        String,
        /// Question number
        number:      usize,
        /// Unknown id
        question_id: String,
    },
    /// A second file for an id already corrected; it was left out.
    DuplicateSubmission {
        /// File name
        file: String,
        /// Student id
        id:   String,
    },
    /// Not every student produced the same number of graded answers.
    UnequalAnswerCounts {
        /// Student id -> graded answers
        counts: BTreeMap<String, usize>,
    },
}

impl Display for CorrectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable { file, issue } => match issue {
                SubmissionIssue::NoMarkers => write!(f, "{file}: no question markers found"),
                SubmissionIssue::MissingIdentity => {
                    write!(f, "{file}: name or number missing from the header")
                }
            },
            Self::UnknownQuestion {
                file,
                number,
                question_id,
            } => write!(f, "{file}: question {number} has an unknown id {question_id}"),
            Self::DuplicateSubmission { file, id } => {
                write!(f, "{file}: another submission for {id} was already corrected")
            }
            Self::UnequalAnswerCounts { counts } => write!(
                f,
                "not all exams have the same number of answers: {}",
                counts.iter().map(|(id, n)| format!("{id}={n}")).join(", ")
            ),
        }
    }
}

/// Invariant violations that stop a correction run.
#[derive(thiserror::Error, Debug)]
pub enum CorrectionError {
    /// Students answering the same question were given different weights.
    #[error("question {question} was worth different points across exams: {weights:?}")]
    InconsistentPoints {
        /// Question number
        question: usize,
        /// Distinct weights seen
        weights:  Vec<f64>,
    },
}

/// What a correction run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrectionOutcome {
    /// Folder holding the reports
    pub folder:   PathBuf,
    /// Submissions considered
    pub files:    Vec<String>,
    /// Report files written
    pub reports:  Vec<PathBuf>,
    /// Issues needing the operator's attention
    pub warnings: Vec<CorrectionWarning>,
}

impl CorrectionOutcome {
    /// Whether the operator must review warnings.
    pub fn needs_review(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Splits submissions into header fields and answer blocks.
pub struct SubmissionParser {
    /// Question id markers
    uuid:          Regex,
    /// Name line of the header
    name:          Regex,
    /// Id line of the header
    id:            Regex,
    /// Separator placed before every question
    separator:     Regex,
    /// Text of the marker line before the id, trimmed
    marker_prefix: String,
    /// Trailer, trimmed
    end_separator: String,
}

impl SubmissionParser {
    /// Builds the parser from the exam templates in the settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let separator = settings
            .question_separator
            .trim()
            .split("{}")
            .map(regex::escape)
            .join(r"\s*\d+\s*");
        let marker_prefix = settings
            .question_marker
            .split("{id}")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            uuid: Regex::new(&settings.uuid_pattern).context("Invalid uuid_pattern")?,
            name: Regex::new(&format!(
                r"(?m)(?:Name|{})(.*?)$",
                regex::escape(&settings.name_label)
            ))?,
            id: Regex::new(&format!(r"(?m){}(.*?)$", regex::escape(&settings.id_label)))?,
            separator: Regex::new(&separator)?,
            marker_prefix,
            end_separator: settings.end_separator.trim().to_string(),
        })
    }

    /// Parses submission text.
    pub fn parse(&self, text: &str) -> Result<Submission, SubmissionIssue> {
        let text = to_lf(text);
        let first = self.uuid.find(&text).ok_or(SubmissionIssue::NoMarkers)?;
        let header = &text[..first.start()];

        let field = |re: &Regex| {
            re.captures(header)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let name = field(&self.name).ok_or(SubmissionIssue::MissingIdentity)?;
        let id = field(&self.id).ok_or(SubmissionIssue::MissingIdentity)?;

        let mut body = &text[first.start()..];
        if !self.end_separator.is_empty()
            && let Some(at) = body.find(&self.end_separator)
        {
            body = &body[..at];
        }

        let markers: Vec<_> = self.uuid.find_iter(body).collect();
        let answers = markers
            .iter()
            .enumerate()
            .map(|(index, m)| {
                let end = markers.get(index + 1).map_or(body.len(), |next| next.start());
                Answer {
                    number:      index + 1,
                    question_id: m.as_str().to_string(),
                    text:        self.answer_text(&body[m.end()..end]),
                }
            })
            .collect();

        Ok(Submission { name, id, answers })
    }

    /// Drops the next question's separator and marker from the end of a block.
    fn answer_text(&self, block: &str) -> String {
        let block = match self.separator.find(block) {
            Some(m) => &block[..m.start()],
            None => block,
        };
        let block = block.trim_end();
        let block = if self.marker_prefix.is_empty() {
            block
        } else {
            block.strip_suffix(self.marker_prefix.as_str()).unwrap_or(block)
        };
        block.trim_end().to_string()
    }
}

/// Names of the renamed submissions in `folder`.
pub fn renamed_submissions(folder: &Path) -> Result<Vec<String>> {
    let processed = Regex::new(CHECKSUM_SUFFIX_PATTERN)?;
    Ok(file_names(folder)?
        .into_iter()
        .filter(|n| processed.is_match(n))
        .collect())
}

/// Corrects every renamed submission in `folder` and writes one report per
/// question into `output`. `only` restricts correction to those question
/// numbers when not empty.
pub fn correct_folder(
    folder: &Path,
    output: &Path,
    parser: &SubmissionParser,
    registry: &QuestionRegistry,
    store: &impl QuestionStore,
    only: &[usize],
) -> Result<CorrectionOutcome> {
    let files = renamed_submissions(folder)?;
    tracing::info!(
        "{} files out of {} in {} identified",
        files.len(),
        file_names(folder)?.len(),
        folder.display()
    );

    let mut outcome = CorrectionOutcome {
        folder: output.to_path_buf(),
        ..Default::default()
    };
    // question number -> student id -> rendered record
    let mut reports: BTreeMap<usize, BTreeMap<String, String>> = BTreeMap::new();
    let mut weights: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for file in &files {
        tracing::info!("{file}");
        let path = folder.join(file);
        let bytes =
            std::fs::read(&path).with_context(|| format!("Could not read {}", path.display()))?;
        let (text, encoding) = decode_detected(&bytes);
        tracing::debug!("{file} decoded as {encoding}");

        let submission = match parser.parse(&text) {
            Ok(s) => s,
            Err(issue) => {
                outcome.warnings.push(CorrectionWarning::Unreadable {
                    file: file.clone(),
                    issue,
                });
                continue;
            }
        };

        match counts.entry(submission.id.clone()) {
            Entry::Occupied(_) => {
                outcome.warnings.push(CorrectionWarning::DuplicateSubmission {
                    file: file.clone(),
                    id:   submission.id.clone(),
                });
                continue;
            }
            Entry::Vacant(slot) => {
                slot.insert(0);
            }
        }

        for answer in &submission.answers {
            if !only.is_empty() && !only.contains(&answer.number) {
                tracing::info!("\tquestion {} skipped", answer.number);
                continue;
            }

            let Some(stored) = store.get(&answer.question_id)? else {
                outcome.warnings.push(CorrectionWarning::UnknownQuestion {
                    file:        file.clone(),
                    number:      answer.number,
                    question_id: answer.question_id.clone(),
                });
                continue;
            };
            let question = registry.restore(&stored)?;
            tracing::info!("\t{} points {}", question.kind(), question.points());

            let correction = question.correct(&answer.text);
            let record = ReportRecord::builder()
                .question(answer.number)
                .points(question.points())
                .name(submission.name.clone())
                .id(submission.id.clone())
                .correct_answer(question.correct_answer())
                .answer(answer.text.clone())
                .grade(correction.grade)
                .comment(correction.comment)
                .build();

            weights.entry(answer.number).or_default().push(question.points());
            reports
                .entry(answer.number)
                .or_default()
                .insert(submission.id.clone(), record.render());
            *counts.entry(submission.id.clone()).or_default() += 1;
        }
        outcome.files.push(file.clone());
    }

    if counts.values().unique().count() > 1 {
        outcome
            .warnings
            .push(CorrectionWarning::UnequalAnswerCounts { counts });
    }

    for (question, seen) in weights {
        let distinct: Vec<f64> = seen.into_iter().unique_by(|w| w.to_bits()).collect();
        if distinct.len() > 1 {
            return Err(CorrectionError::InconsistentPoints {
                question,
                weights: distinct,
            }
            .into());
        }
    }

    if !reports.is_empty() {
        std::fs::create_dir_all(output)
            .with_context(|| format!("Could not create {}", output.display()))?;
    }
    for (question, records) in reports {
        let path = output.join(format!("question{question:03}.txt"));
        let text = to_crlf(&records.into_values().collect::<String>());
        std::fs::write(&path, text)
            .with_context(|| format!("Could not write {}", path.display()))?;
        outcome.reports.push(path);
    }

    for warning in &outcome.warnings {
        tracing::warn!("{warning}");
    }
    Ok(outcome)
}

/// Corrects the returned exams configured in `settings` into a new
/// timestamped correction folder.
pub fn correct_tests(
    settings: &Settings,
    registry: &QuestionRegistry,
    store: &impl QuestionStore,
    only: &[usize],
) -> Result<CorrectionOutcome> {
    let stamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    let parser = SubmissionParser::new(settings)?;
    correct_folder(
        &settings.returned_exam_dir(),
        &settings.correction_dir(&stamp),
        &parser,
        registry,
        store,
        only,
    )
}
