#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use anyhow::Result;
use itertools::Itertools;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use uuid::Uuid;

use super::{Correction, Question, QuestionKind, answer_body};

/// Random DNA of `len` bases.
fn random_dna(rng: &mut dyn RngCore, len: usize) -> String {
    const BASES: [char; 4] = ['A', 'C', 'G', 'T'];
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}

/// FASTA record with 60 bases per line.
fn fasta(name: &str, seq: &str) -> String {
    let body = seq
        .as_bytes()
        .chunks(60)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .join("\n");
    format!(">{name}\n{body}\n")
}

/// Bases in `text`, uppercased, everything else dropped.
fn bases(text: &str) -> String {
    text.chars()
        .filter(|c| matches!(c, 'A' | 'C' | 'G' | 'T' | 'a' | 'c' | 'g' | 't'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// First number in `text`, accepting a decimal comma.
fn first_number(text: &str) -> Option<f64> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .find(|t| t.chars().any(|c| c.is_ascii_digit()))
        .and_then(|t| t.replace(',', ".").trim_matches('.').parse().ok())
}

/// The student writes the reverse complement of a sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseComplement {
    /// Question id
    id:       String,
    /// Weight
    points:   f64,
    /// Bundled files
    files:    Vec<PathBuf>,
    /// Sequence shown to the student
    sequence: String,
}

impl ReverseComplement {
    /// Reverse complement of the shown sequence.
    pub fn expected(&self) -> String {
        self.sequence
            .chars()
            .rev()
            .map(|c| match c {
                'A' => 'T',
                'T' => 'A',
                'C' => 'G',
                _ => 'C',
            })
            .collect()
    }

    /// Body with `answer` below the label.
    fn body(&self, answer: &str) -> String {
        format!(
            "Write the reverse complement of the sequence below.\n\n{}\nanswer:\n{answer}\n",
            fasta("seq", &self.sequence)
        )
    }
}

impl QuestionKind for ReverseComplement {
    const KIND: &'static str = "reverse_complement";

    fn generate(points: f64, files: Vec<PathBuf>, rng: &mut dyn RngCore) -> Self {
        let len = rng.gen_range(30..=60);
        Self {
            id: Uuid::new_v4().to_string(),
            points,
            files,
            sequence: random_dna(rng, len),
        }
    }
}

impl Question for ReverseComplement {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn points(&self) -> f64 {
        self.points
    }

    fn empty_question(&self) -> String {
        self.body("?")
    }

    fn correct_answer(&self) -> String {
        self.body(&self.expected())
    }

    fn included_files(&self) -> Vec<PathBuf> {
        self.files.clone()
    }

    fn correct(&self, answer: &str) -> Correction {
        let given = bases(answer_body(answer));
        let expected = self.expected();
        if given.is_empty() {
            return Correction::builder().grade(0.0).comment("no answer").build();
        }
        if given == expected {
            return Correction::builder().grade(100.0).comment("correct").build();
        }
        let similarity = TextDiff::from_chars(expected.as_str(), given.as_str()).ratio();
        let comment = if bases(&self.sequence) == given {
            "the original sequence was given, not its reverse complement".to_string()
        } else {
            format!(
                "sequence differs ({} bp expected, {} bp given, {:.0}% similar)",
                expected.len(),
                given.len(),
                similarity * 100.0
            )
        };
        Correction::builder().grade(0.0).comment(comment).build()
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// The student counts the bases of a sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceSize {
    /// Question id
    id:       String,
    /// Weight
    points:   f64,
    /// Bundled files
    files:    Vec<PathBuf>,
    /// Sequence shown to the student
    sequence: String,
}

impl SequenceSize {
    /// Body with `answer` below the label.
    fn body(&self, answer: &str) -> String {
        format!(
            "What is the size in base pairs of the sequence below?\n\n{}\nanswer:\n{answer} bp\n",
            fasta("seq", &self.sequence)
        )
    }
}

impl QuestionKind for SequenceSize {
    const KIND: &'static str = "sequence_size";

    fn generate(points: f64, files: Vec<PathBuf>, rng: &mut dyn RngCore) -> Self {
        let len = rng.gen_range(100..=400);
        Self {
            id: Uuid::new_v4().to_string(),
            points,
            files,
            sequence: random_dna(rng, len),
        }
    }
}

impl Question for SequenceSize {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn points(&self) -> f64 {
        self.points
    }

    fn empty_question(&self) -> String {
        self.body("?")
    }

    fn correct_answer(&self) -> String {
        self.body(&self.sequence.len().to_string())
    }

    fn included_files(&self) -> Vec<PathBuf> {
        self.files.clone()
    }

    fn correct(&self, answer: &str) -> Correction {
        let expected = self.sequence.len() as f64;
        match first_number(answer_body(answer)) {
            None => Correction::builder().grade(0.0).comment("no answer").build(),
            Some(n) if n == expected => {
                Correction::builder().grade(100.0).comment("correct").build()
            }
            Some(n) => Correction::builder()
                .grade(0.0)
                .comment(format!("{n} bp given, {expected} bp expected"))
                .build(),
        }
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// The student computes the GC content of a sequence, in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcContent {
    /// Question id
    id:       String,
    /// Weight
    points:   f64,
    /// Bundled files
    files:    Vec<PathBuf>,
    /// Sequence shown to the student
    sequence: String,
}

impl GcContent {
    /// Accepted distance from the exact value, in percentage points.
    const TOLERANCE: f64 = 0.5;

    /// Exact GC content in percent.
    pub fn expected(&self) -> f64 {
        let gc = self.sequence.chars().filter(|c| matches!(c, 'G' | 'C')).count();
        100.0 * gc as f64 / self.sequence.len() as f64
    }

    /// Body with `answer` below the label.
    fn body(&self, answer: &str) -> String {
        format!(
            "What is the GC content of the sequence below? Answer in percent with one \
             decimal.\n\n{}\nanswer:\n{answer} %\n",
            fasta("seq", &self.sequence)
        )
    }
}

impl QuestionKind for GcContent {
    const KIND: &'static str = "gc_content";

    fn generate(points: f64, files: Vec<PathBuf>, rng: &mut dyn RngCore) -> Self {
        let len = rng.gen_range(40..=120);
        Self {
            id: Uuid::new_v4().to_string(),
            points,
            files,
            sequence: random_dna(rng, len),
        }
    }
}

impl Question for GcContent {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn points(&self) -> f64 {
        self.points
    }

    fn empty_question(&self) -> String {
        self.body("?")
    }

    fn correct_answer(&self) -> String {
        self.body(&format!("{:.1}", self.expected()))
    }

    fn included_files(&self) -> Vec<PathBuf> {
        self.files.clone()
    }

    fn correct(&self, answer: &str) -> Correction {
        let expected = self.expected();
        match first_number(answer_body(answer)) {
            None => Correction::builder().grade(0.0).comment("no answer").build(),
            Some(n) if (n - expected).abs() <= Self::TOLERANCE => {
                Correction::builder().grade(100.0).comment("correct").build()
            }
            Some(n) if (n - expected / 100.0).abs() <= Self::TOLERANCE / 100.0 => {
                Correction::builder()
                    .grade(50.0)
                    .comment(format!("{n} given as a fraction, {expected:.1} % expected"))
                    .build()
            }
            Some(n) => Correction::builder()
                .grade(0.0)
                .comment(format!("{n} % given, {expected:.1} % expected"))
                .build(),
        }
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
