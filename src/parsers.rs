#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::report::GradeRecord;

peg::parser! {
    /// grammars for the labelled fields at the bottom of a correction record.
    pub grammar parser() for str {
        /// matches any run of whitespace, line breaks included
        rule ws() = quiet!{[' ' | '\t' | '\r' | '\n']*}

        /// matches spaces and tabs only
        rule hs() = quiet!{[' ' | '\t']*}

        /// matches digits, dots and commas
        rule num() -> &'input str
            = $(['0'..='9' | '.' | ',']+)

        /// matches everything up to the end of the line
        rule rest_of_line() -> &'input str
            = $([^ '\r' | '\n']*)

        /// parses the labelled fields of one record, from `question` to `manual grade`
        pub rule record() -> GradeRecord
            = "question..........:" ws() q:num() ws()
              "points............:" ws() p:num() ws()
              "name..............:" hs() n:rest_of_line() ws()
              "mec...............:" hs() m:rest_of_line() ws()
              "automatic grade(%):" ws() a:num() ws()
              "manual grade(%)...:" hs() g:num()?
            {? GradeRecord::from_fields(q, p, n, m, a, g) }

        /// skips anything that does not start a record
        rule junk() = (!record() [_])*

        /// matches the next record after any amount of junk
        rule next_record() -> GradeRecord
            = junk() r:record() { r }

        /// parses every record in a report, ignoring the text around them
        pub rule records() -> Vec<GradeRecord>
            = rs:next_record()* junk() { rs }
    }
}
