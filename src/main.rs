#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # informatics_exam
//! ## Introduction
//!
//! Exam workflow for a bioinformatics course: build one exam per student,
//! ship them as password protected archives, rename what comes back, grade
//! it, and collect the grades into a spreadsheet.
//!
//! Every command reads `exam.toml` from the current folder, or the file named
//! by `INFORMATICS_EXAM_SETTINGS`. Run `create_settings` once to get one.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use informatics_exam::{
    archive::SevenZip,
    config::{self, Settings},
    correct::correct_tests,
    generate::generate_exams,
    question::{QuestionRegistry, SqliteStore},
    rename::{IdentityParser, rename_completed_tests},
    roster::Roster,
    spreadsheet::generate_spreadsheet,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Write a default settings file
    CreateSettings(Option<PathBuf>),
    /// Create the folders named in the settings
    CreateFolders(Option<PathBuf>),
    /// Print the parsed roster as CSV
    ParseStudents(Option<PathBuf>),
    /// Generate one exam per student
    GenerateTests,
    /// Rename returned exams
    RenameCompletedTests(Option<PathBuf>),
    /// Grade returned exams, optionally only some questions
    CorrectTests(Vec<usize>),
    /// Build the grade sheet from a correction folder
    GenerateSpreadsheet(PathBuf),
    /// Print the version
    Version,
}

/// Exit code used when the correction needs a look before it can be trusted.
const REVIEW_EXIT: u8 = 2;

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses an optional folder
    fn folder() -> impl Parser<Option<PathBuf>> {
        positional::<PathBuf>("FOLDER")
            .help("Folder to work in, defaults to the settings")
            .optional()
    }

    let create_settings = construct!(Cmd::CreateSettings(folder()))
        .to_options()
        .command("create_settings")
        .help("Write a default exam.toml unless one exists");

    let create_folders = construct!(Cmd::CreateFolders(folder()))
        .to_options()
        .command("create_folders")
        .help("Create the folders listed in exam.toml and a placeholder roster");

    let path = positional::<PathBuf>("PATH")
        .help("Roster file, defaults to the one in exam.toml")
        .optional();
    let parse_students = construct!(Cmd::ParseStudents(path))
        .to_options()
        .command("parse_students")
        .help("Print the student list as CSV");

    let generate_tests = pure(Cmd::GenerateTests)
        .to_options()
        .command("generate_tests")
        .help("Generate one password protected exam per student");

    let rename = construct!(Cmd::RenameCompletedTests(folder()))
        .to_options()
        .command("rename_completed_tests")
        .help("Rename returned exams to <name>_<id>_<md5>.txt");

    let questions = positional::<usize>("QUESTION")
        .help("Question numbers to correct, all when omitted")
        .many();
    let correct = construct!(Cmd::CorrectTests(questions))
        .to_options()
        .command("correct_tests")
        .help("Grade the renamed exams and write one report per question");

    let correction_folder =
        positional::<PathBuf>("CORRECTION_FOLDER").help("Folder holding the correction reports");
    let spreadsheet = construct!(Cmd::GenerateSpreadsheet(correction_folder))
        .to_options()
        .command("generate_spreadsheet")
        .help("Collect the graded reports into an .ods grade sheet");

    let version = short('v')
        .long("version")
        .help("Print the version")
        .req_flag(Cmd::Version);

    let cmd = construct!([
        create_settings,
        create_folders,
        parse_students,
        generate_tests,
        rename,
        correct,
        spreadsheet,
        version
    ]);

    cmd.to_options()
        .descr("Generate, distribute and grade text based exams")
        .run()
}

/// Settings for the current folder.
fn settings() -> Result<Settings> {
    Ok(Settings::load(Path::new("."))?)
}

/// Runs one command and returns the process exit code.
async fn run(cmd: Cmd) -> Result<ExitCode> {
    match cmd {
        Cmd::CreateSettings(folder) => {
            config::create_settings(&folder.unwrap_or_else(|| PathBuf::from(".")))?;
        }
        Cmd::CreateFolders(folder) => {
            config::create_folders_in(&folder.unwrap_or_else(|| PathBuf::from(".")))?;
        }
        Cmd::ParseStudents(path) => {
            let path = match path {
                Some(p) => p,
                None => settings()?.student_list(),
            };
            let roster = Roster::from_file(&path)?;
            print!("{}", roster.to_csv());
        }
        Cmd::GenerateTests => {
            let settings = settings()?;
            let roster = Roster::from_file(&settings.student_list())?;
            let mut store = SqliteStore::open(&settings.shelf_dir())?;
            let archiver = SevenZip::new(&settings.archive.program, settings.archive.timeout());
            let mut rng = rand::thread_rng();

            let report = generate_exams(
                &settings,
                &roster,
                &QuestionRegistry::default(),
                &mut store,
                &archiver,
                &mut rng,
            )
            .await?;
            println!("password: {}", report.password.bold().bright_yellow());
        }
        Cmd::RenameCompletedTests(folder) => {
            let settings = settings()?;
            let folder = folder.unwrap_or_else(|| settings.returned_exam_dir());
            let parser = IdentityParser::new(&settings.name_label, &settings.id_label)?;
            let renamed = rename_completed_tests(&folder, &parser)?;
            tracing::info!("{} files renamed", renamed.len());
        }
        Cmd::CorrectTests(only) => {
            let settings = settings()?;
            let store = SqliteStore::open(&settings.shelf_dir())?;
            let outcome = correct_tests(&settings, &QuestionRegistry::default(), &store, &only)?;
            tracing::info!(
                "{} reports written to {}",
                outcome.reports.len(),
                outcome.folder.display()
            );
            if outcome.needs_review() {
                let notice = format!(
                    "{} warnings, review them before using the reports",
                    outcome.warnings.len()
                );
                eprintln!("{}", notice.bright_red());
                return Ok(ExitCode::from(REVIEW_EXIT));
            }
        }
        Cmd::GenerateSpreadsheet(folder) => {
            let output = std::env::current_dir().context("Could not read the current folder")?;
            let (_, table) = generate_spreadsheet(&folder, &output)?;
            println!("{}", table.render());
        }
        Cmd::Version => {
            println!("informatics_exam {}", env!("CARGO_PKG_VERSION"));
        }
    };

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match run(options()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
