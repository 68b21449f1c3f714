use informatics_exam::{
    parsers::parser,
    report::{ReportRecord, parse_records},
    util::to_crlf,
};

fn record(question: usize, id: &str, grade: f64) -> ReportRecord {
    ReportRecord::builder()
        .question(question)
        .points(2.0)
        .name("Ana Lima")
        .id(id)
        .correct_answer("answer:\n120 bp")
        .answer("answer:\n12 bp")
        .grade(grade)
        .comment("12 bp given, 120 bp expected")
        .build()
}

#[test]
fn rendered_record_has_the_fixed_layout() {
    let text = record(7, "a12345", 0.0).render();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "");
    assert_eq!(lines[1], format!("{} CORRECT ANSWER", "^".repeat(64)));
    assert!(text.contains(&format!("{} students answer\n", "=".repeat(63))));
    assert!(text.contains(&format!("{} correction\n", "_".repeat(68))));
    assert!(text.contains("automatic comments:\n12 bp given, 120 bp expected\nmanual comment:\n"));
    assert!(text.contains("question..........: 007\n"));
    assert!(text.contains("manual grade(%)...:\n"));
    assert!(text.ends_with(&format!("{}\n", "~".repeat(79))));
}

#[test]
fn reads_back_automatic_grades() {
    let report = to_crlf(
        &(record(2, "a12345", 40.0).render() + &record(2, "a23456", 100.0).render()),
    );
    let records = parse_records(&report);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].question, 2);
    assert_eq!(records[0].points, 2.0);
    assert_eq!(records[0].name, "Ana Lima");
    assert_eq!(records[0].id, "a12345");
    assert_eq!(records[0].manual, None);
    assert_eq!(records[0].grade(), 40.0);
    assert_eq!(records[1].grade(), 100.0);
}

#[test]
fn manual_grade_overrides_and_accepts_decimal_comma() {
    let report = record(1, "a12345", 0.0)
        .render()
        .replace("manual grade(%)...:\n", "manual grade(%)...: 87,5\n");
    let records = parse_records(&report);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].automatic, 0.0);
    assert_eq!(records[0].manual, Some(87.5));
    assert_eq!(records[0].grade(), 87.5);
}

#[test]
fn fields_parse_without_the_surrounding_record() {
    let fields = "question..........: 003\n\
                  points............: 1,5\n\
                  name..............: Bruno Costa\n\
                  mec...............: 12345\n\
                  automatic grade(%): 50\n\
                  manual grade(%)...:";
    let parsed = parser::record(fields).expect("parse fields");
    assert_eq!(parsed.question, 3);
    assert_eq!(parsed.points, 1.5);
    assert_eq!(parsed.id, "12345");

    assert!(parse_records("no records here").is_empty());
}
