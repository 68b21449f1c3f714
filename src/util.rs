#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::WINDOWS_1252;
use glob::{MatchOptions, glob_with};
use md5::{Digest, Md5};
use which::which;

/// Finds and returns the path to the archiver binary
pub fn archiver_path(program: &str) -> Result<OsString> {
    which(program)
        .map(PathBuf::into_os_string)
        .with_context(|| format!("Cannot find the archiver on path ({program})"))
}

/// A glob utility function to find the files directly inside `dir` with a
/// certain extension, matched case-insensitively, sorted by name.
///
/// * `extension`: the file extension to find paths for
/// * `dir`: the directory to look in
pub fn find_files(extension: &str, dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join(format!("*.{extension}"));
    let pattern = pattern
        .to_str()
        .context("Could not convert directory to string")?
        .to_string();

    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut files: Vec<PathBuf> = glob_with(&pattern, options)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Returns the names of all regular files in `dir`, sorted.
pub fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = vec![];
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Could not read {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Rewrites every line ending as CRLF.
pub fn to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Rewrites every line ending as LF.
pub fn to_lf(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Hex encoded MD5 digest of `bytes`.
pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Decodes bytes written in the legacy single byte encoding of the exams.
pub fn decode_latin1(bytes: &[u8]) -> String {
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}

/// Encodes text in the legacy single byte encoding of the exams. Characters
/// the encoding lacks are written as numeric character references.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    WINDOWS_1252.encode(text).0.into_owned()
}

/// Decodes bytes of unknown encoding, guessing the encoding from the content.
/// Returns the text and the name of the encoding used.
pub fn decode_detected(bytes: &[u8]) -> (String, &'static str) {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, used, _) = encoding.decode(bytes);
    (text.into_owned(), used.name())
}

/// File name for a student, `<name_with_underscores>_<id>`.
pub fn student_file_stem(name: &str, id: &str) -> String {
    format!("{}_{id}", name.replace(' ', "_"))
}
