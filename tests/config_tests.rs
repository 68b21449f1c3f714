use std::{fs, path::PathBuf};

use informatics_exam::{
    config::{ConfigError, Settings, create_folders, create_folders_in, create_settings},
    constants::SETTINGS_FILE,
};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("informatics-config-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

#[test]
fn missing_settings_is_a_typed_error() {
    let root = temp_root();
    let err = Settings::from_file(&root.join(SETTINGS_FILE)).expect_err("no settings yet");
    assert!(matches!(err, ConfigError::Missing(_)));
    assert!(err.to_string().contains("create_settings"));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn template_round_trips_and_resolves_against_its_folder() {
    let root = temp_root();
    assert!(create_settings(&root).expect("write template"));
    assert!(!create_settings(&root).expect("second call is a no-op"));

    let settings = Settings::from_file(&root.join(SETTINGS_FILE)).expect("load template");
    assert_eq!(settings.root(), root.as_path());
    assert_eq!(settings.questions.len(), 3);
    assert_eq!(settings.questions[2].kind, "gc_content");
    assert_eq!(settings.questions[2].points, 2.0);
    assert_eq!(settings.archive.password_length, 5);
    assert_eq!(settings.shelf_dir(), root.join("shelf"));
    assert_eq!(
        settings.correction_dir("2024-01-01T10:00:00"),
        root.join("correction__2024-01-01T10:00:00")
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn create_folders_seeds_a_roster_once() {
    let root = temp_root();
    let settings = Settings::default().with_root(&root);
    create_folders(&settings).expect("create folders");

    for dir in ["shelf", "empty_exams", "correct_exams", "returned_exams"] {
        assert!(root.join(dir).is_dir(), "{dir} missing");
    }
    let roster = root.join("students.txt");
    assert_eq!(fs::read_to_string(&roster).expect("roster"), "Name,Number\nMax Maximus,99999");

    fs::write(&roster, "Name,Number\nAna Lima,a12345\n").expect("edit roster");
    create_folders(&settings).expect("create folders again");
    assert!(fs::read_to_string(&roster).expect("roster").contains("Ana Lima"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn folders_need_a_settings_file() {
    let root = temp_root();
    let err = create_folders_in(&root).expect_err("no settings yet");
    assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Missing(_))));
    assert!(!root.join("shelf").exists());
    assert!(!root.join("students.txt").exists());

    create_settings(&root).expect("write template");
    create_folders_in(&root).expect("create folders");
    assert!(root.join("shelf").is_dir());
    assert!(root.join("students.txt").is_file());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn unknown_keys_and_bad_values_are_rejected() {
    assert!(Settings::from_toml("exam_folders = \"typo\"").is_err());

    let settings = Settings::from_toml("question_separator = \"no number here\"").expect("parses");
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::Invalid { key: "question_separator", .. })
    ));

    let settings = Settings::from_toml("[[questions]]\nkind = \"gc_content\"\npoints = 0.0\n")
        .expect("parses");
    assert!(matches!(settings.validate(), Err(ConfigError::Invalid { key: "questions", .. })));
}

#[test]
fn templates_render_placeholders() {
    let settings = Settings::from_toml(
        "header = \"{name} / {id} / {timestamp} / {number_of_questions}\"\n\
         [[questions]]\nkind = \"sequence_size\"\npoints = 1.0\n",
    )
    .expect("parses");

    assert_eq!(
        settings.render_header("Ana Lima", "a12345", 1700000000),
        "Ana Lima / a12345 / 1700000000 / 1"
    );
    assert_eq!(settings.render_separator(3), "\n*********** Question 3 ***********\n");
    assert_eq!(settings.render_marker("abc"), "QuestionID abc\n");
}
