use std::{fs, path::PathBuf};

use informatics_exam::{
    generate::stage_files,
    util::{
        decode_detected, decode_latin1, encode_latin1, find_files, student_file_stem, to_crlf,
        to_lf,
    },
};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("informatics-util-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

#[test]
fn line_endings_normalize_both_ways() {
    assert_eq!(to_crlf("a\nb\r\nc"), "a\r\nb\r\nc");
    assert_eq!(to_crlf(&to_crlf("a\nb")), "a\r\nb");
    assert_eq!(to_lf("a\r\nb\nc"), "a\nb\nc");
}

#[test]
fn legacy_encoding_round_trips_portuguese() {
    let text = "Número mecanográfico, João";
    let bytes = encode_latin1(text);
    assert_eq!(bytes.len(), text.chars().count());
    assert_eq!(decode_latin1(&bytes), text);
}

#[test]
fn detection_reads_utf8_and_legacy_text() {
    let (text, _) = decode_detected("Nome João Almeida".as_bytes());
    assert_eq!(text, "Nome João Almeida");

    let (text, _) = decode_detected(&encode_latin1("Número mecanográfico (mec) a12345"));
    assert!(text.contains("(mec) a12345"));
}

#[test]
fn stems_use_underscores() {
    assert_eq!(student_file_stem("Ana Maria Lima", "a12345"), "Ana_Maria_Lima_a12345");
}

#[test]
fn staging_is_recreated_and_text_gets_crlf() {
    let root = temp_root();
    let staging = root.join("staging");
    fs::create_dir_all(&staging).expect("create staging");
    fs::write(staging.join("leftover.txt"), "from the previous student").expect("write");

    let seq = root.join("seq.GB");
    let blob = root.join("plot.png");
    fs::write(&seq, "LOCUS x\nORIGIN\n").expect("write");
    fs::write(&blob, [0u8, 10, 13, 10]).expect("write");

    stage_files(&staging, &[seq, blob]).expect("stage");

    assert!(!staging.join("leftover.txt").exists());
    assert_eq!(fs::read_to_string(staging.join("seq.GB")).expect("read"), "LOCUS x\r\nORIGIN\r\n");
    assert_eq!(fs::read(staging.join("plot.png")).expect("read"), vec![0u8, 10, 13, 10]);

    let found = find_files("gb", &staging).expect("find");
    assert_eq!(found, vec![staging.join("seq.GB")]);

    let _ = fs::remove_dir_all(root);
}
