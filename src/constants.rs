#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Name of the settings file looked up in the exam folder
pub const SETTINGS_FILE: &str = "exam.toml";

/// Environment variable that may point at a settings file elsewhere
pub const SETTINGS_ENV: &str = "INFORMATICS_EXAM_SETTINGS";

/// File name of the question store inside the shelf folder
pub const STORE_FILE: &str = "shelf.sqlite3";

/// Placeholder roster written by `create_folders`
pub const PLACEHOLDER_ROSTER: &str = "Name,Number\nMax Maximus,99999";

/// Name and id of the reference row in the grade sheet
pub const REFERENCE_STUDENT: (&str, i64) = ("Max Maximus", 99999);

/// Institutional student number: one of digit/a/A/e/E followed by 4-5 digits
pub const ROSTER_ID_PATTERN: &str = r"[\daAeE]\d{4,5}";

/// Prefix of generated ids for roster rows without a student number
pub const SYNTHETIC_ID_PREFIX: &str = "NA";

/// Boilerplate tokens removed from roster names
pub const ROSTER_BOILERPLATE: [&str; 3] = ["ORD", "T-E", "TE"];

/// Suffix of a submission that was already renamed, `_<md5>.txt`
pub const CHECKSUM_SUFFIX_PATTERN: &str = r"_([a-fA-F\d]{32})\.(txt|TXT)$";

/// Correction report file names, `question001.txt`
pub const REPORT_FILE_PATTERN: &str = r"^question\d{3}\.txt$";

/// Default pattern of the question id markers embedded in every exam
pub const UUID_PATTERN: &str =
    "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}";

/// Alphabet used for the archive password
pub const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Pass threshold on the 0-20 scale
pub const PASS_THRESHOLD: f64 = 9.5;

/// Banner above the correct answer in a correction record
pub fn correct_answer_rule() -> String {
    format!("{} CORRECT ANSWER", "^".repeat(79 - 15))
}

/// Banner above the student's answer in a correction record
pub fn student_answer_rule() -> String {
    format!("{} students answer", "=".repeat(79 - 16))
}

/// Banner above the correction block of a record
pub fn correction_rule() -> String {
    format!("{} correction", "_".repeat(79 - 11))
}

/// Closing rule of a correction record
pub fn record_end_rule() -> String {
    "~".repeat(79)
}

/// Default header template of every generated exam.
/// Placeholders: `{timestamp}`, `{name}`, `{id}`, `{number_of_questions}`.
pub const DEFAULT_HEADER: &str = r#"================================================================================
BMA19 | Biologia Molecular Aplicada 9505N3 | Unix timestamp {timestamp}
Nome                       {name}
Número mecanográfico (mec) {id}
================================================================================

Instruções:
----------

- Preencha a sua resposta, substituindo o simbolo "?" dentro neste documento.

- Por favor NÂO MODIFIQUE MAIS NADA, será corrigido automaticamente.
  em particular, não modifique ou remova o QuestionID, que serve para identificar
  as respostas certas.

- Quando estiver pronto, escreva a soma de verificação MD5 deste ficheiro no formulário MD5.

Instructions:
------------

- Fill in your answers where you find the "?" symbol(s) in each of the {number_of_questions} questions.

- Please do not edit anything else, as this test will be automatically corrected.
  In particular, do NOT modify the QuestionID as this is used for identifying the
  correct answer.

- When you are ready, write the MD5 checksum of *this* file on the MD5 form.
"#;

/// Default separator placed before every question, `{}` is the question number
pub const DEFAULT_QUESTION_SEPARATOR: &str = "\n*********** Question {} ***********\n";

/// Default marker line carrying the question id
pub const DEFAULT_QUESTION_MARKER: &str = "QuestionID {id}\n";

/// Default trailer closing every exam
pub const DEFAULT_END_SEPARATOR: &str = "\n========== end of exame \
                                         ========================================================";
