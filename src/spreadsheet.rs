#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use regex::Regex;
use serde::Serialize;
use spreadsheet_ods::{Sheet, WorkBook};
use tabled::{builder::Builder, settings::Style};

use crate::{
    constants::{PASS_THRESHOLD, REFERENCE_STUDENT, REPORT_FILE_PATTERN},
    report::{GradeRecord, parse_records},
    util::file_names,
};

/// Errors in the reports that make a grade sheet meaningless.
#[derive(thiserror::Error, Debug)]
pub enum SpreadsheetError {
    /// Records of one question disagree on its weight.
    #[error("question {question} carries different weights: {weights:?}")]
    InconsistentWeights {
        /// Question number
        question: u32,
        /// Distinct weights seen
        weights:  Vec<f64>,
    },
}

/// Grades of one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentGrades {
    /// Name as written in the first record of the student
    pub name:   String,
    /// Student id
    pub id:     String,
    /// question number -> grade in percent
    pub grades: BTreeMap<u32, f64>,
}

/// Content of one spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Nothing
    Empty,
    /// Text
    Text(String),
    /// Number
    Number(f64),
    /// OpenFormula expression, `of:=` prefixed
    Formula(String),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl Cell {
    /// Numeric ids become numbers, anything else stays text.
    fn id(id: &str) -> Self {
        match id.parse::<u64>() {
            Ok(n) => Cell::Number(n as f64),
            Err(_) => Cell::Text(id.to_string()),
        }
    }
}

/// Grades of every student for every question found in the reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradeTable {
    /// Question numbers, ascending
    pub questions: Vec<u32>,
    /// Weight of each question, same order as `questions`
    pub weights:   Vec<f64>,
    /// Students ordered by id
    pub students:  Vec<StudentGrades>,
}

/// Spreadsheet column name of a 0-based column index, `A`, ..., `Z`, `AA`, ...
pub fn column_letter(index: usize) -> String {
    let mut index = index + 1;
    let mut letters = vec![];
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl GradeTable {
    /// Aggregates records; the first record of a student fixes the name, the
    /// manual grade wins over the automatic one.
    pub fn from_records(
        records: impl IntoIterator<Item = GradeRecord>,
    ) -> Result<Self, SpreadsheetError> {
        let mut students: BTreeMap<String, StudentGrades> = BTreeMap::new();
        let mut weights: BTreeMap<u32, Vec<f64>> = BTreeMap::new();

        for record in records {
            let grade = record.grade();
            let student = students
                .entry(record.id.clone())
                .or_insert_with(|| StudentGrades {
                    name:   record.name.clone(),
                    id:     record.id.clone(),
                    grades: BTreeMap::new(),
                });
            student.grades.insert(record.question, grade);
            weights.entry(record.question).or_default().push(record.points);
        }

        let mut table = GradeTable {
            students: students.into_values().collect(),
            ..Default::default()
        };
        for (question, seen) in weights {
            let distinct: Vec<f64> = seen.into_iter().unique_by(|w| w.to_bits()).collect();
            if distinct.len() > 1 {
                return Err(SpreadsheetError::InconsistentWeights {
                    question,
                    weights: distinct,
                });
            }
            table.questions.push(question);
            table.weights.push(distinct[0]);
        }
        Ok(table)
    }

    /// The 0-20 weighted average of a student's grades. Missing grades count
    /// as 0.
    pub fn weighted_total(&self, grades: &BTreeMap<u32, f64>) -> f64 {
        let max: f64 = self.weights.iter().map(|w| 100.0 * w).sum();
        if max == 0.0 {
            return 0.0;
        }
        let earned: f64 = self
            .questions
            .iter()
            .zip(&self.weights)
            .map(|(q, w)| w * grades.get(q).copied().unwrap_or(0.0))
            .sum();
        20.0 * earned / max
    }

    /// Whether a total fails the course.
    pub fn fails(total: f64) -> bool {
        total < PASS_THRESHOLD
    }

    /// Index of the total column.
    fn total_column(&self) -> usize {
        2 + self.questions.len()
    }

    /// Weighted total formula for a 1-based sheet row.
    fn total_formula(&self, row: usize) -> String {
        let terms = (0..self.questions.len())
            .map(|i| {
                let col = column_letter(2 + i);
                format!("[.${col}$2]*[.{col}{row}]")
            })
            .join("+");
        let max: f64 = self.weights.iter().map(|w| 100.0 * w).sum();
        if terms.is_empty() {
            "of:=0".to_string()
        } else {
            format!("of:=20*({terms})/{max}")
        }
    }

    /// Pass flag formula for a 1-based sheet row.
    fn flag_formula(&self, row: usize) -> String {
        let col = column_letter(self.total_column());
        format!("of:=IF([.{col}{row}]<{PASS_THRESHOLD};\"R\";\"\")")
    }

    /// Cells of the sheet: header, weights, reference row, then one row per
    /// student.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        let mut rows = vec![];

        let mut header: Vec<Cell> = vec!["name".into(), "mec".into()];
        header.extend(self.questions.iter().map(|q| Cell::Text(format!("Q{q}"))));
        header.extend(["grade(0-20)".into(), "status".into()]);
        rows.push(header);

        let mut weights = vec![Cell::Empty, Cell::Empty];
        weights.extend(self.weights.iter().map(|w| Cell::Number(*w)));
        rows.push(weights);

        let (reference_name, reference_id) = REFERENCE_STUDENT;
        let mut reference: Vec<Cell> = vec![reference_name.into(), Cell::Number(reference_id as f64)];
        reference.extend(self.questions.iter().map(|_| Cell::Number(100.0)));
        rows.push(reference);

        for student in &self.students {
            let mut row = vec![Cell::Text(student.name.clone()), Cell::id(&student.id)];
            row.extend(
                self.questions
                    .iter()
                    .map(|q| student.grades.get(q).map_or(Cell::Empty, |g| Cell::Number(*g))),
            );
            rows.push(row);
        }

        // totals and flags for every row below the weights
        for (index, row) in rows.iter_mut().enumerate().skip(2) {
            let sheet_row = index + 1;
            row.push(Cell::Formula(self.total_formula(sheet_row)));
            row.push(Cell::Formula(self.flag_formula(sheet_row)));
        }
        rows
    }

    /// Writes the grade sheet as an OpenDocument spreadsheet.
    pub fn write_ods(&self, path: &Path) -> Result<()> {
        let mut sheet = Sheet::new("grades");
        for (r, row) in self.rows().into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                let (r, c) = (r as u32, c as u32);
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => sheet.set_value(r, c, s),
                    Cell::Number(n) => sheet.set_value(r, c, n),
                    Cell::Formula(f) => sheet.set_formula(r, c, f),
                }
            }
        }

        let mut workbook = WorkBook::new_empty();
        workbook.push_sheet(sheet);
        spreadsheet_ods::write_ods(&mut workbook, path)
            .map_err(|e| anyhow!("Could not write {}: {e}", path.display()))
    }

    /// Renders the sheet with computed totals for the terminal.
    pub fn render(&self) -> String {
        let mut builder = Builder::default();

        let mut header = vec!["name".to_string(), "mec".to_string()];
        header.extend(self.questions.iter().map(|q| format!("Q{q}")));
        header.extend(["grade(0-20)".to_string(), "status".to_string()]);
        builder.push_record(header);

        for student in &self.students {
            let total = self.weighted_total(&student.grades);
            let mut row = vec![student.name.clone(), student.id.clone()];
            row.extend(
                self.questions
                    .iter()
                    .map(|q| student.grades.get(q).map(|g| g.to_string()).unwrap_or_default()),
            );
            row.push(format!("{total:.2}"));
            row.push(if Self::fails(total) { "R" } else { "" }.to_string());
            builder.push_record(row);
        }

        builder.build().with(Style::modern()).to_string()
    }
}

/// Reads every `questionNNN.txt` report in `folder` into a grade table.
pub fn collect_grades(folder: &Path) -> Result<GradeTable> {
    let pattern = Regex::new(REPORT_FILE_PATTERN)?;
    let mut records = vec![];
    for name in file_names(folder)?.into_iter().filter(|n| pattern.is_match(n)) {
        tracing::info!("processing: {name}");
        let path = folder.join(&name);
        let bytes =
            std::fs::read(&path).with_context(|| format!("Could not read {}", path.display()))?;
        let found = parse_records(&String::from_utf8_lossy(&bytes));
        if found.is_empty() {
            tracing::warn!("{name}: no grade records found");
        }
        records.extend(found);
    }
    Ok(GradeTable::from_records(records)?)
}

/// Builds the grade sheet from the reports in `correction_folder` and writes
/// it into `output_dir` as `grades_bioinformatics_<timestamp>.ods`.
pub fn generate_spreadsheet(
    correction_folder: &Path,
    output_dir: &Path,
) -> Result<(PathBuf, GradeTable)> {
    let table = collect_grades(correction_folder)?;
    if table.students.is_empty() {
        tracing::warn!("No grades found in {}", correction_folder.display());
    }

    let stamp = chrono::Local::now().format("%Y-%m-%d %H_%M_%S");
    let path = output_dir.join(format!("grades_bioinformatics_{stamp}.ods"));
    table.write_ods(&path)?;
    tracing::info!("Wrote {}", path.display());
    Ok((path, table))
}
