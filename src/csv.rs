//! Record codec for the two comma-separated files this tool owns: the
//! seen-entry store and the feed configuration. RFC 4180-style quoting,
//! nothing more.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CsvError {
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
    #[error("unexpected character after closing quote on line {line}")]
    TrailingGarbage { line: usize },
}

/// Parse an entire document into records. Quoted fields may contain
/// separators, doubled quotes, and newlines; records end at an unquoted
/// newline (LF or CRLF).
pub fn parse_records(input: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut records = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while chars.peek().is_some() {
        let mut fields = Vec::new();

        loop {
            let field = if chars.peek() == Some(&'"') {
                chars.next();
                let opening_line = line;
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                value.push('"');
                            } else {
                                break;
                            }
                        }
                        Some('\n') => {
                            line += 1;
                            value.push('\n');
                        }
                        Some(c) => value.push(c),
                        None => return Err(CsvError::UnterminatedQuote { line: opening_line }),
                    }
                }
                // Only a separator or end of record may follow the closing quote.
                match chars.peek() {
                    Some(',') | Some('\r') | Some('\n') | None => {}
                    Some(_) => return Err(CsvError::TrailingGarbage { line }),
                }
                value
            } else {
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' || c == '\n' || c == '\r' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                value
            };
            fields.push(field);

            match chars.next() {
                Some(',') => {}
                Some('\r') => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    break;
                }
                Some('\n') => {
                    line += 1;
                    break;
                }
                None => break,
                Some(_) => unreachable!("field parsing stops only at a separator"),
            }
        }

        records.push(fields);
    }

    Ok(records)
}

/// Format one record, quoting fields that carry separators, quotes, or
/// newlines. No trailing newline.
pub fn format_record(fields: &[&str]) -> String {
    let mut out = String::new();

    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        let needs_quoting = field
            .chars()
            .any(|c| matches!(c, '"' | ',' | '\n' | '\r'));
        if needs_quoting {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_records() {
        let records = parse_records("a,b,c\nd,e,f\n").unwrap();
        assert_eq!(records, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
    }

    #[test]
    fn parses_quoted_separators_and_doubled_quotes() {
        let records = parse_records("\"a,b\",\"say \"\"hi\"\"\",plain\n").unwrap();
        assert_eq!(records, vec![vec!["a,b", "say \"hi\"", "plain"]]);
    }

    #[test]
    fn parses_newlines_inside_quoted_fields() {
        let records = parse_records("\"line one\nline two\",x\n").unwrap();
        assert_eq!(records, vec![vec!["line one\nline two", "x"]]);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let records = parse_records("a,b\r\nc,d\r\n").unwrap();
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn last_record_without_newline_is_kept() {
        let records = parse_records("a,b\nc,d").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["c", "d"]);
    }

    #[test]
    fn rejects_unterminated_quotes() {
        assert_eq!(
            parse_records("a,\"open\n"),
            Err(CsvError::UnterminatedQuote { line: 1 })
        );
    }

    #[test]
    fn rejects_text_after_a_closing_quote() {
        assert_eq!(
            parse_records("\"a\"b,c\n"),
            Err(CsvError::TrailingGarbage { line: 1 })
        );
    }

    #[test]
    fn formatting_round_trips_awkward_fields() {
        let fields = ["with,comma", "with \"quote\"", "with\nnewline", "plain"];
        let formatted = format_record(&fields);
        let mut reparsed = parse_records(&formatted).unwrap();
        assert_eq!(reparsed.remove(0), fields);
    }

    #[test]
    fn empty_fields_survive() {
        let records = parse_records("a,,c\n").unwrap();
        assert_eq!(records, vec![vec!["a", "", "c"]]);
    }
}
