use std::{fs, path::PathBuf};

use informatics_exam::{
    rename::{IdentityParser, plan_renames, rename_completed_tests},
    util::{encode_latin1, file_names, md5_hex},
};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("informatics-rename-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

fn parser() -> IdentityParser {
    IdentityParser::new("Nome", "(mec)").expect("parser")
}

#[test]
fn first_labels_win_and_ids_are_lowercased() {
    let text = "Nome                       João Almeida\n\
                Número mecanográfico (mec) A12345\n\
                Nome Someone Else\n\
                (mec) 99999\n";
    let bytes = encode_latin1(text);
    let identity = parser().identify("whatever.txt", &bytes).expect("identity");

    assert_eq!(identity.name, "João Almeida");
    assert_eq!(identity.id, "a12345");
    assert_eq!(identity.checksum, md5_hex(&bytes));
    assert_eq!(identity.file_name(), format!("João_Almeida_a12345_{}.txt", md5_hex(&bytes)));
}

#[test]
fn synthetic_ids_fall_back_to_the_file_name() {
    let bytes = b"Nome Ana Lima\n(mec) NA3\n";
    let identity = parser()
        .identify("exam_e54321_final.txt", bytes)
        .expect("identity");
    assert_eq!(identity.id, "e54321");

    // a real id is kept even when the file name carries another one
    let bytes = b"Nome Ana Lima\n(mec) a12345\n";
    let identity = parser()
        .identify("exam_e54321_final.txt", bytes)
        .expect("identity");
    assert_eq!(identity.id, "a12345");

    // no usable number in the file name: the synthetic id stays
    let bytes = b"Nome Ana Lima\n(mec) NA3\n";
    let identity = parser().identify("exam.txt", bytes).expect("identity");
    assert_eq!(identity.id, "na3");
}

#[test]
fn missing_labels_leave_the_file_alone() {
    assert!(parser().identify("a12345.txt", b"Nome Ana Lima\n").is_none());

    let root = temp_root();
    fs::write(root.join("anonymous.txt"), "just an answer\n").expect("write");
    assert!(plan_renames(&root, &parser()).expect("plan").is_empty());
    assert_eq!(file_names(&root).expect("list"), vec!["anonymous.txt"]);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn renaming_is_idempotent() {
    let root = temp_root();
    fs::write(root.join("Exam.TXT"), "Nome Ana Lima\n(mec) a12345\nanswer\n").expect("write");
    fs::write(root.join("notes.md"), "Nome X\n(mec) a99999\n").expect("write");

    let renamed = rename_completed_tests(&root, &parser()).expect("rename");
    assert_eq!(renamed.len(), 1);
    let expected = format!(
        "Ana_Lima_a12345_{}.txt",
        md5_hex(b"Nome Ana Lima\n(mec) a12345\nanswer\n")
    );
    assert_eq!(file_names(&root).expect("list"), vec![expected.clone(), "notes.md".to_string()]);

    assert!(rename_completed_tests(&root, &parser()).expect("rename again").is_empty());
    assert_eq!(file_names(&root).expect("list"), vec![expected, "notes.md".to_string()]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn names_with_path_characters_stay_in_the_folder() {
    let root = temp_root();
    let returned = root.join("returned");
    fs::create_dir_all(&returned).expect("create returned");

    let slashed = b"Nome Ana/Lima\n(mec) a12345\n";
    let climbing = b"Nome ../../Bruno Costa\n(mec) a23456\n";
    let plain = b"Nome Carla Dias\n(mec) a34567\n";
    fs::write(returned.join("a.txt"), slashed).expect("write");
    fs::write(returned.join("b.txt"), climbing).expect("write");
    fs::write(returned.join("c.txt"), plain).expect("write");

    let renamed = rename_completed_tests(&returned, &parser()).expect("rename");
    assert_eq!(renamed.len(), 3);
    assert!(renamed.iter().all(|r| r.to.parent() == Some(returned.as_path())));

    let mut expected = vec![
        format!("Ana_Lima_a12345_{}.txt", md5_hex(slashed)),
        format!(".._.._Bruno_Costa_a23456_{}.txt", md5_hex(climbing)),
        format!("Carla_Dias_a34567_{}.txt", md5_hex(plain)),
    ];
    expected.sort();
    assert_eq!(file_names(&returned).expect("list"), expected);
    assert!(file_names(&root).expect("list root").is_empty());

    let _ = fs::remove_dir_all(root);
}
