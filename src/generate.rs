#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::RngCore;
use serde::Serialize;

use crate::{
    archive::{Archiver, generate_password, move_with_retry},
    config::{QuestionSpec, Settings},
    question::{QuestionRegistry, QuestionStore, StoredQuestion},
    roster::{Roster, Student},
    util::{encode_latin1, student_file_stem, to_crlf},
};

/// What one `generate_tests` run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Password shared by every archive of the run
    pub password:  String,
    /// File stems of the exams generated
    pub generated: Vec<String>,
    /// File stems skipped because their archive already existed
    pub skipped:   Vec<String>,
}

/// The blank exam and its answer key for one student.
#[derive(Debug, Clone)]
pub struct ExamPair {
    /// Exam handed to the student
    pub blank:          String,
    /// Same exam with the answers filled in
    pub answer_key:     String,
    /// Files the questions asked to bundle
    pub included_files: Vec<PathBuf>,
}

/// Creates fresh questions for one student, stores them, and assembles both
/// exam variants with CRLF line endings.
pub fn compose_exam(
    settings: &Settings,
    registry: &QuestionRegistry,
    store: &mut impl QuestionStore,
    student: &Student,
    timestamp: i64,
    rng: &mut dyn RngCore,
) -> Result<ExamPair> {
    let mut blank = settings.render_header(&student.name, &student.id, timestamp);
    let mut answer_key = blank.clone();
    let mut included_files = vec![];

    for (index, spec) in settings.questions.iter().enumerate() {
        let spec = QuestionSpec {
            files: spec.files.iter().map(|f| settings.resolve(f)).collect(),
            ..spec.clone()
        };
        let question = registry.create(&spec, rng)?;

        let preamble = format!(
            "{}{}",
            settings.render_separator(index + 1),
            settings.render_marker(question.id())
        );
        blank.push_str(&preamble);
        blank.push_str(&question.empty_question());
        answer_key.push_str(&preamble);
        answer_key.push_str(&question.correct_answer());

        store.put(&StoredQuestion::capture(question.as_ref())?)?;
        included_files.extend(question.included_files());
    }

    blank.push_str(&settings.end_separator);
    answer_key.push_str(&settings.end_separator);

    Ok(ExamPair {
        blank: to_crlf(&blank),
        answer_key: to_crlf(&answer_key),
        included_files,
    })
}

/// Recreates `staging` empty and copies `files` into it. Text files
/// (`.txt`, `.gb`) get CRLF line endings, everything else is copied verbatim.
pub fn stage_files(staging: &Path, files: &[PathBuf]) -> Result<()> {
    if staging.exists() {
        std::fs::remove_dir_all(staging)
            .with_context(|| format!("Could not clear {}", staging.display()))?;
    }
    std::fs::create_dir_all(staging)
        .with_context(|| format!("Could not create {}", staging.display()))?;

    for path in files {
        let name = path
            .file_name()
            .with_context(|| format!("{} has no file name", path.display()))?;
        let target = staging.join(name);
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("gb"));

        if is_text {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read {}", path.display()))?;
            std::fs::write(&target, to_crlf(&text))
                .with_context(|| format!("Could not write {}", target.display()))?;
        } else {
            std::fs::copy(path, &target)
                .with_context(|| format!("Could not copy {}", path.display()))?;
        }
    }
    Ok(())
}

/// Generates one exam archive per student and one answer key in the correct
/// exam folder. Students whose archive already exists are skipped.
pub async fn generate_exams<A, S, R>(
    settings: &Settings,
    roster: &Roster,
    registry: &QuestionRegistry,
    store: &mut S,
    archiver: &A,
    rng: &mut R,
) -> Result<GenerationReport>
where
    A: Archiver,
    S: QuestionStore,
    R: RngCore,
{
    registry.check(&settings.questions)?;
    if settings.questions.is_empty() {
        tracing::warn!("No questions configured, exams will only contain the header.");
    }

    let exam_dir = settings.exam_dir();
    let key_dir = settings.correct_exam_dir();
    for dir in [&exam_dir, &key_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Could not create {}", dir.display()))?;
    }
    let staging_root = settings.staging_dir();
    let staging = staging_root.join("exam");

    let mut report = GenerationReport {
        password: generate_password(rng, settings.archive.password_length),
        ..Default::default()
    };

    for student in roster.students() {
        let stem = student_file_stem(&student.name, &student.id);
        tracing::info!("Preparing {stem}");

        let archive_path = exam_dir.join(format!("{stem}.zip"));
        if archive_path.exists() {
            tracing::info!("{} already exists, skipping.", archive_path.display());
            report.skipped.push(stem);
            continue;
        }

        let timestamp = chrono::Utc::now().timestamp();
        let exam = compose_exam(settings, registry, store, student, timestamp, rng)?;

        let mut files = exam.included_files.clone();
        files.extend(settings.included_files());
        stage_files(&staging, &files)?;

        let key_path = key_dir.join(format!("correct_{stem}.txt"));
        std::fs::write(&key_path, encode_latin1(&exam.answer_key))
            .with_context(|| format!("Could not write {}", key_path.display()))?;
        let blank_path = staging.join(format!("test_{stem}.txt"));
        std::fs::write(&blank_path, encode_latin1(&exam.blank))
            .with_context(|| format!("Could not write {}", blank_path.display()))?;

        let produced = staging_root.join(format!("{stem}.zip"));
        if produced.exists() {
            std::fs::remove_file(&produced)
                .with_context(|| format!("Could not remove stale {}", produced.display()))?;
        }
        archiver
            .archive(&staging, &produced, &report.password)
            .await
            .with_context(|| format!("Could not archive the exam of {stem}"))?;
        move_with_retry(
            &produced,
            &archive_path,
            settings.archive.move_attempts,
            settings.archive.move_backoff(),
        )
        .await?;

        report.generated.push(stem);
    }

    tracing::info!(
        "{} exams generated, {} skipped",
        report.generated.len(),
        report.skipped.len()
    );
    Ok(report)
}
