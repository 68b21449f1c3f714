#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Built-in question kinds
pub mod kinds;
/// Persistent id -> question mapping
pub mod store;

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Serialize, de::DeserializeOwned};
use typed_builder::TypedBuilder;

pub use self::{
    kinds::{GcContent, ReverseComplement, SequenceSize},
    store::{MemoryStore, QuestionStore, SqliteStore, StoredQuestion},
};
use crate::config::QuestionSpec;

/// Outcome of correcting one answer.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Correction {
    /// Grade in percent of the question's points, 0-100
    pub grade:   f64,
    /// Explanation shown to the person reviewing the correction
    #[builder(default)]
    pub comment: String,
}

/// A unit of exam content: produces the blank and the answered text of
/// itself, lists the files it needs and grades an answer.
pub trait Question {
    /// Registry name of the question type.
    fn kind(&self) -> &'static str;

    /// Unique id, written into the exam as the question marker.
    fn id(&self) -> &str;

    /// Weight of the question.
    fn points(&self) -> f64;

    /// Question text with `?` where the student answers.
    fn empty_question(&self) -> String;

    /// Question text with the correct answer filled in.
    fn correct_answer(&self) -> String;

    /// Files the student needs to answer.
    fn included_files(&self) -> Vec<PathBuf> {
        vec![]
    }

    /// Grades the text a student wrote below the question marker.
    fn correct(&self, answer: &str) -> Correction;

    /// Serialized state needed to rebuild this exact instance.
    fn state(&self) -> Result<serde_json::Value>;
}

/// A question type the registry knows how to create and restore.
pub trait QuestionKind: Question + Serialize + DeserializeOwned + 'static {
    /// Registry name, matching [`Question::kind`].
    const KIND: &'static str;

    /// Creates a fresh instance with randomized content.
    fn generate(points: f64, files: Vec<PathBuf>, rng: &mut dyn RngCore) -> Self;
}

/// Constructs a fresh instance of a kind.
type CreateFn = fn(f64, Vec<PathBuf>, &mut dyn RngCore) -> Box<dyn Question>;
/// Rebuilds an instance of a kind from stored state.
type RestoreFn = fn(serde_json::Value) -> Result<Box<dyn Question>>;

/// Errors raised by the registry.
#[derive(thiserror::Error, Debug)]
pub enum QuestionError {
    /// The settings name a kind nobody registered.
    #[error("Unknown question kind `{0}`. Known kinds: {1}")]
    UnknownKind(String, String),
}

/// Factory of question instances keyed by kind name.
pub struct QuestionRegistry {
    /// name -> (create, restore)
    kinds: BTreeMap<&'static str, (CreateFn, RestoreFn)>,
}

impl Default for QuestionRegistry {
    /// A registry with every built-in kind.
    fn default() -> Self {
        Self::empty()
            .with::<ReverseComplement>()
            .with::<SequenceSize>()
            .with::<GcContent>()
    }
}

impl QuestionRegistry {
    /// A registry without any kinds.
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Registers `K`.
    pub fn with<K: QuestionKind>(mut self) -> Self {
        fn create<K: QuestionKind>(
            points: f64,
            files: Vec<PathBuf>,
            rng: &mut dyn RngCore,
        ) -> Box<dyn Question> {
            Box::new(K::generate(points, files, rng))
        }

        fn restore<K: QuestionKind>(state: serde_json::Value) -> Result<Box<dyn Question>> {
            let q: K = serde_json::from_value(state)
                .with_context(|| format!("Stored state is not a valid `{}` question", K::KIND))?;
            Ok(Box::new(q))
        }

        self.kinds.insert(K::KIND, (create::<K>, restore::<K>));
        self
    }

    /// Names of all registered kinds.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.kinds.keys().copied().collect()
    }

    /// Looks up a kind by name.
    fn entry(&self, kind: &str) -> Result<&(CreateFn, RestoreFn), QuestionError> {
        self.kinds
            .get(kind)
            .ok_or_else(|| QuestionError::UnknownKind(kind.to_string(), self.kinds().join(", ")))
    }

    /// Fails on the first question spec naming an unknown kind.
    pub fn check(&self, specs: &[QuestionSpec]) -> Result<(), QuestionError> {
        for spec in specs {
            self.entry(&spec.kind)?;
        }
        Ok(())
    }

    /// Creates a fresh randomized question for `spec`.
    pub fn create(&self, spec: &QuestionSpec, rng: &mut dyn RngCore) -> Result<Box<dyn Question>> {
        let (create, _) = self.entry(&spec.kind)?;
        Ok(create(spec.points, spec.files.clone(), rng))
    }

    /// Rebuilds a question from the store.
    pub fn restore(&self, stored: &StoredQuestion) -> Result<Box<dyn Question>> {
        let (_, restore) = self.entry(&stored.kind)?;
        restore(stored.state.clone())
            .with_context(|| format!("Could not restore question {}", stored.id))
    }
}

/// Text below the last `answer:` label, or all of `answer` when there is none.
pub(crate) fn answer_body(answer: &str) -> &str {
    match answer.rfind("answer:") {
        Some(at) => &answer[at + "answer:".len()..],
        None => answer,
    }
}
