use std::{ffi::OsString, fs, path::PathBuf, time::Duration};

use informatics_exam::{
    archive::{SevenZip, generate_password, move_with_retry},
    constants::PASSWORD_ALPHABET,
};
use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("informatics-archive-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

#[test]
fn passwords_use_the_alphabet() {
    let mut rng = StdRng::seed_from_u64(42);
    let password = generate_password(&mut rng, 5);
    assert_eq!(password.len(), 5);
    assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    assert_ne!(password, generate_password(&mut rng, 5));
}

#[test]
fn seven_zip_arguments_list_every_staged_file() {
    let root = temp_root();
    let staging = root.join("exam");
    fs::create_dir_all(&staging).expect("create staging");
    fs::write(staging.join("test_Ana_Lima_a12345.txt"), "exam").expect("write");
    fs::write(staging.join("seq.gb"), "LOCUS").expect("write");

    let dest = root.join("Ana_Lima_a12345.zip");
    let args = SevenZip::arguments(&staging, &dest, "ab12c").expect("arguments");
    let expected: Vec<OsString> = vec![
        "a".into(),
        "-tzip".into(),
        dest.clone().into(),
        staging.join("seq.gb").into(),
        staging.join("test_Ana_Lima_a12345.txt").into(),
        "-pab12c".into(),
        "-scrcSHA256".into(),
    ];
    assert_eq!(args, expected);

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn move_waits_for_a_late_archive() {
    let root = temp_root();
    let source = root.join("late.zip");
    let dest = root.join("out").join("late.zip");
    fs::create_dir_all(root.join("out")).expect("create out");

    let writer = {
        let (partial, source) = (root.join("late.part"), source.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            fs::write(&partial, "zip").expect("write late archive");
            fs::rename(partial, source).expect("publish late archive");
        })
    };

    move_with_retry(&source, &dest, 50, Duration::from_millis(20))
        .await
        .expect("move");
    writer.await.expect("writer task");

    assert!(!source.exists());
    assert_eq!(fs::read_to_string(&dest).expect("read moved"), "zip");

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn move_gives_up_after_the_last_attempt() {
    let root = temp_root();
    let missing = root.join("never.zip");
    let err = move_with_retry(&missing, &root.join("x.zip"), 3, Duration::from_millis(1))
        .await
        .expect_err("nothing to move");
    assert!(format!("{err:#}").contains("never appeared after 3 attempts"));

    let _ = fs::remove_dir_all(root);
}
