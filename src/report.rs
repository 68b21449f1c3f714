#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    constants::{correct_answer_rule, correction_rule, record_end_rule, student_answer_rule},
    parsers::parser,
};

/// One student's graded answer, as written into a correction report.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct ReportRecord {
    /// 1-based question number
    pub question:       usize,
    /// Weight of the question
    pub points:         f64,
    /// Student name
    pub name:           String,
    /// Student id
    pub id:             String,
    /// Answer key of the question
    pub correct_answer: String,
    /// What the student wrote
    pub answer:         String,
    /// Automatic grade in percent
    pub grade:          f64,
    /// Comment of the automatic correction
    #[builder(default)]
    pub comment:        String,
}

impl ReportRecord {
    /// Renders the record block. The `manual grade` field is left empty for
    /// the reviewer to fill in.
    pub fn render(&self) -> String {
        format!(
            "\n{rule1}\n{correct}\n{rule2}\n{answer}\n{rule3}\n\nautomatic comments:\n{comment}\n\
             manual comment:\n\nquestion..........: {question:03}\npoints............: \
             {points}\nname..............: {name}\nmec...............: {id}\nautomatic \
             grade(%): {grade}\nmanual grade(%)...:\n{rule4}\n",
            rule1 = correct_answer_rule(),
            correct = self.correct_answer,
            rule2 = student_answer_rule(),
            answer = self.answer,
            rule3 = correction_rule(),
            comment = self.comment,
            question = self.question,
            points = self.points,
            name = self.name,
            id = self.id,
            grade = self.grade,
            rule4 = record_end_rule(),
        )
    }
}

/// The labelled fields of a record, read back from a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    /// Question number
    pub question:  u32,
    /// Weight of the question
    pub points:    f64,
    /// Student name
    pub name:      String,
    /// Student id
    pub id:        String,
    /// Automatic grade in percent
    pub automatic: f64,
    /// Grade typed in by the reviewer, if any
    pub manual:    Option<f64>,
}

/// Parses a decimal that may use a comma as separator.
fn decimal(s: &str) -> Result<f64, &'static str> {
    s.replace(',', ".").parse().or(Err("decimal number"))
}

impl GradeRecord {
    /// Builds a record from the raw field texts matched by the grammar.
    pub(crate) fn from_fields(
        question: &str,
        points: &str,
        name: &str,
        id: &str,
        automatic: &str,
        manual: Option<&str>,
    ) -> Result<Self, &'static str> {
        let id = id.trim();
        if id.is_empty() {
            return Err("student number");
        }
        Ok(Self {
            question:  question.parse().or(Err("question number"))?,
            points:    decimal(points)?,
            name:      name.trim().to_string(),
            id:        id.to_string(),
            automatic: decimal(automatic)?,
            manual:    manual.map(decimal).transpose()?,
        })
    }

    /// The grade that counts: the manual one when given, else the automatic one.
    pub fn grade(&self) -> f64 {
        self.manual.unwrap_or(self.automatic)
    }
}

/// Every record found in the text of a correction report.
pub fn parse_records(text: &str) -> Vec<GradeRecord> {
    // `records` skips anything it cannot read, so it only fails on bugs in
    // the grammar itself.
    parser::records(text).unwrap_or_default()
}
