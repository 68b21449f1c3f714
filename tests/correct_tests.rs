use std::{
    fs,
    path::{Path, PathBuf},
};

use informatics_exam::{
    config::Settings,
    correct::{
        CorrectionError, CorrectionWarning, SubmissionIssue, SubmissionParser, correct_folder,
    },
    generate::compose_exam,
    question::{MemoryStore, QuestionRegistry},
    report::parse_records,
    roster::Student,
};
use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("informatics-correct-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

fn settings(root: &Path, questions: &[(&str, f64)]) -> Settings {
    let mut toml = String::new();
    for (kind, points) in questions {
        toml.push_str(&format!("[[questions]]\nkind = \"{kind}\"\npoints = {points:?}\n"));
    }
    Settings::from_toml(&toml).expect("parse settings").with_root(root)
}

fn student(name: &str, id: &str) -> Student {
    Student {
        id:   id.to_string(),
        name: name.to_string(),
    }
}

/// Answer key of a freshly composed exam, as returned by the student.
fn answer_key(settings: &Settings, store: &mut MemoryStore, who: &Student, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    compose_exam(settings, &QuestionRegistry::default(), store, who, 1_700_000_000, &mut rng)
        .expect("compose exam")
        .answer_key
}

fn submit(folder: &Path, stem: &str, digit: char, text: &str) {
    let name = format!("{stem}_{}.txt", digit.to_string().repeat(32));
    fs::write(folder.join(name), text).expect("write submission");
}

#[test]
fn parser_splits_header_and_trims_answers() {
    let root = temp_root();
    let settings = settings(&root, &[("sequence_size", 1.0), ("gc_content", 1.0)]);
    let mut store = MemoryStore::default();
    let key = answer_key(&settings, &mut store, &student("Ana Lima", "a12345"), 1);

    let parser = SubmissionParser::new(&settings).expect("parser");
    let submission = parser.parse(&key).expect("parse");

    assert_eq!(submission.name, "Ana Lima");
    assert_eq!(submission.id, "a12345");
    assert_eq!(submission.answers.len(), 2);
    assert_eq!(submission.answers[0].number, 1);
    assert!(!submission.answers[0].text.contains("Question 2"));
    assert!(!submission.answers[0].text.contains("QuestionID"));
    assert!(!submission.answers[1].text.contains("end of exame"));

    assert_eq!(parser.parse("no markers at all"), Err(SubmissionIssue::NoMarkers));
    let anonymous = format!("header\n{}\nanswer: 3", Uuid::new_v4());
    assert_eq!(parser.parse(&anonymous), Err(SubmissionIssue::MissingIdentity));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn odd_submissions_become_warnings() {
    let root = temp_root();
    let returned = root.join("returned");
    fs::create_dir_all(&returned).expect("create returned");

    let full = settings(&root, &[("sequence_size", 1.0), ("gc_content", 1.0)]);
    let short = settings(&root, &[("sequence_size", 1.0)]);
    let mut store = MemoryStore::default();
    let mut elsewhere = MemoryStore::default();

    let ana = answer_key(&full, &mut store, &student("Ana Lima", "a12345"), 1);
    let bruno = answer_key(&short, &mut store, &student("Bruno Costa", "a23456"), 2);
    let carla = answer_key(&full, &mut elsewhere, &student("Carla Dias", "a34567"), 3);

    submit(&returned, "Ana_Lima_a12345", '0', &ana);
    submit(&returned, "Ana_Lima_a12345", '1', &ana);
    submit(&returned, "Bruno_Costa_a23456", '0', &bruno);
    submit(&returned, "Carla_Dias_a34567", '0', &carla);
    submit(&returned, "Empty_e00000", '0', "nothing to see here");
    fs::write(returned.join("not_renamed.txt"), &ana).expect("write stray file");

    let parser = SubmissionParser::new(&full).expect("parser");
    let out = root.join("correction");
    let outcome = correct_folder(
        &returned,
        &out,
        &parser,
        &QuestionRegistry::default(),
        &store,
        &[],
    )
    .expect("correct");

    assert_eq!(outcome.files.len(), 3);
    let w = &outcome.warnings;
    assert!(w.iter().any(|w| matches!(
        w,
        CorrectionWarning::DuplicateSubmission { id, .. } if id == "a12345"
    )));
    assert!(w.iter().any(|w| matches!(
        w,
        CorrectionWarning::Unreadable { issue: SubmissionIssue::NoMarkers, .. }
    )));
    assert_eq!(
        w.iter()
            .filter(|w| matches!(w, CorrectionWarning::UnknownQuestion { .. }))
            .count(),
        2
    );

    let counts = w
        .iter()
        .find_map(|w| match w {
            CorrectionWarning::UnequalAnswerCounts { counts } => Some(counts.clone()),
            _ => None,
        })
        .expect("count mismatch reported");
    assert_eq!(counts["a12345"], 2);
    assert_eq!(counts["a23456"], 1);
    assert_eq!(counts["a34567"], 0);

    let q1 = fs::read_to_string(out.join("question001.txt")).expect("read report");
    let ana_at = q1.find("mec...............: a12345").expect("ana record");
    let bruno_at = q1.find("mec...............: a23456").expect("bruno record");
    assert!(ana_at < bruno_at);
    assert!(q1.contains("\r\n"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn differing_weights_for_one_question_stop_the_run() {
    let root = temp_root();
    let returned = root.join("returned");
    fs::create_dir_all(&returned).expect("create returned");

    let light = settings(&root, &[("sequence_size", 1.0)]);
    let heavy = settings(&root, &[("sequence_size", 2.0)]);
    let mut store = MemoryStore::default();
    let ana = answer_key(&light, &mut store, &student("Ana Lima", "a12345"), 1);
    let bruno = answer_key(&heavy, &mut store, &student("Bruno Costa", "a23456"), 2);
    submit(&returned, "Ana_Lima_a12345", '0', &ana);
    submit(&returned, "Bruno_Costa_a23456", '0', &bruno);

    let parser = SubmissionParser::new(&light).expect("parser");
    let err = correct_folder(
        &returned,
        &root.join("correction"),
        &parser,
        &QuestionRegistry::default(),
        &store,
        &[],
    )
    .expect_err("weights differ");

    match err.downcast_ref::<CorrectionError>() {
        Some(CorrectionError::InconsistentPoints { question, weights }) => {
            assert_eq!(*question, 1);
            assert_eq!(weights, &vec![1.0, 2.0]);
        }
        None => panic!("unexpected error: {err:#}"),
    }
    assert!(!root.join("correction").exists());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn ids_with_punctuation_survive_into_the_reports() {
    let root = temp_root();
    let returned = root.join("returned");
    fs::create_dir_all(&returned).expect("create returned");

    let settings = settings(&root, &[("sequence_size", 1.0)]);
    let mut store = MemoryStore::default();
    let dashed = answer_key(&settings, &mut store, &student("Ana Lima", "a12345-b"), 1);
    let spaced = answer_key(&settings, &mut store, &student("Bruno Costa", "a23456 turma B"), 2);
    submit(&returned, "Ana_Lima_a12345-b", '0', &dashed);
    submit(&returned, "Bruno_Costa_a23456", '0', &spaced);

    let parser = SubmissionParser::new(&settings).expect("parser");
    let out = root.join("correction");
    let outcome = correct_folder(
        &returned,
        &out,
        &parser,
        &QuestionRegistry::default(),
        &store,
        &[],
    )
    .expect("correct");
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    let report = fs::read_to_string(out.join("question001.txt")).expect("read report");
    let ids: Vec<String> = parse_records(&report).into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["a12345-b", "a23456 turma B"]);

    let _ = fs::remove_dir_all(root);
}
