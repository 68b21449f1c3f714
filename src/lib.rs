//! # informatics_exam
//!
//! Generates per-student text exams for a bioinformatics course, packs them
//! into password protected archives, and grades the returned answer files.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Password protected archives and the retried move that follows them
pub mod archive;
/// Typed settings loaded from `exam.toml`
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Grades returned exams and writes one report per question
pub mod correct;
/// Builds exams and their answer keys
pub mod generate;
/// For all parsers used
pub mod parsers;
/// Subprocess helpers
pub mod process;
/// Question trait, registry and store
pub mod question;
/// Normalizes the file names of returned exams
pub mod rename;
/// Correction record layout
pub mod report;
/// Student list parsing
pub mod roster;
/// Grade sheet built from the correction reports
pub mod spreadsheet;
/// Utility functions for convenience
pub mod util;
