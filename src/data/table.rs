//! CSV reading and writing for labeled matrices.
//!
//! Layout: the header row holds the name of the label column (may be
//! empty) followed by the column labels; each following row holds a row
//! label followed by its values. Fields may be double-quoted.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::data::matrix::LabeledMatrix;
use crate::error::{OrthoError, Result};

/// Read and parse a matrix CSV from disk.
pub fn read_matrix_csv(path: &Path) -> anyhow::Result<LabeledMatrix> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read matrix file '{}'", path.display()))?;
    let matrix = parse_matrix_csv(&text)
        .with_context(|| format!("failed to parse matrix file '{}'", path.display()))?;
    tracing::info!(
        "Loaded {}x{} matrix from {}",
        matrix.nrows(),
        matrix.ncols(),
        path.display()
    );
    Ok(matrix)
}

/// Parse matrix CSV text.
pub fn parse_matrix_csv(text: &str) -> Result<LabeledMatrix> {
    let mut records = split_records(text).into_iter();

    let (_, header) = records
        .next()
        .ok_or_else(|| OrthoError::data_format("line 1", "empty input"))?;
    if header.len() < 2 {
        return Err(OrthoError::data_format("header", "no column labels"));
    }
    let col_labels: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();

    let mut row_labels = Vec::new();
    let mut rows = Vec::new();
    for (lineno, fields) in records {
        let label = fields[0].trim().to_string();
        if fields.len() != col_labels.len() + 1 {
            return Err(OrthoError::data_format(
                format!("line {} ('{}')", lineno, label),
                format!(
                    "expected {} values, found {}",
                    col_labels.len(),
                    fields.len() - 1
                ),
            ));
        }
        let mut values = Vec::with_capacity(col_labels.len());
        for (field, col) in fields[1..].iter().zip(&col_labels) {
            let value: f64 = field.trim().parse().map_err(|_| {
                OrthoError::data_format(
                    format!("line {}, column '{}'", lineno, col),
                    format!("'{}' is not a number", field.trim()),
                )
            })?;
            values.push(value);
        }
        row_labels.push(label);
        rows.push(values);
    }

    LabeledMatrix::from_rows(row_labels, col_labels, rows)
}

/// Write a matrix in the same layout [`parse_matrix_csv`] reads.
pub fn write_matrix_csv<W: Write>(matrix: &LabeledMatrix, mut out: W) -> anyhow::Result<()> {
    let mut header = vec![String::new()];
    header.extend(matrix.col_labels().iter().map(|l| quote_field(l)));
    writeln!(out, "{}", header.join(","))?;

    for (label, row) in matrix.row_labels().iter().zip(matrix.values().rows()) {
        let mut fields = vec![quote_field(label)];
        fields.extend(row.iter().map(|v| v.to_string()));
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Split CSV text into records, each tagged with the 1-based line it
/// starts on. Quoted fields may span lines and `""` escapes a quote.
/// Records that are blank outside quotes are dropped.
pub(crate) fn split_records(text: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut record = RecordBuilder::default();
    let mut line = 1;
    let mut start = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if record.in_quotes && chars.peek() == Some(&'"') => {
                record.field.push('"');
                chars.next();
            }
            '"' => {
                record.in_quotes = !record.in_quotes;
                record.quoted = true;
            }
            ',' if !record.in_quotes => record.end_field(),
            '\r' if !record.in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !record.in_quotes => {
                if let Some(fields) = std::mem::take(&mut record).finish() {
                    records.push((start, fields));
                }
                line += 1;
                start = line;
            }
            '\n' => {
                record.field.push(ch);
                line += 1;
            }
            _ => record.field.push(ch),
        }
    }
    if let Some(fields) = record.finish() {
        records.push((start, fields));
    }
    records
}

#[derive(Default)]
struct RecordBuilder {
    fields: Vec<String>,
    field: String,
    in_quotes: bool,
    quoted: bool,
}

impl RecordBuilder {
    fn end_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.field));
    }

    /// `None` for a blank record.
    fn finish(mut self) -> Option<Vec<String>> {
        self.end_field();
        let blank = !self.quoted && self.fields.len() == 1 && self.fields[0].trim().is_empty();
        if blank {
            None
        } else {
            Some(self.fields)
        }
    }
}

/// Quote a field if it contains a separator, quote, or line break.
pub(crate) fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    const SAMPLE: &str = "mutant,glucose,\"acetate, 2mM\"\n101,1500,200\n102,50,3000\n\n";

    #[test]
    fn test_parse_sample() {
        let m = parse_matrix_csv(SAMPLE).unwrap();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 2);
        assert_eq!(m.col_label(1), "acetate, 2mM");
        assert_eq!(m.row_label(0), "101");
        assert_eq!(m.values()[[1, 1]], 3000.0);
    }

    #[test]
    fn test_parse_rejects_text_value() {
        let err = parse_matrix_csv("x,a,b\nr1,1,oops\n").unwrap_err();
        match err {
            OrthoError::DataFormat { location, reason } => {
                assert!(location.contains("line 2"));
                assert!(reason.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_ragged_row() {
        let err = parse_matrix_csv("x,a,b\nr1,1\n").unwrap_err();
        assert!(err.to_string().contains("expected 2 values, found 1"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_matrix_csv("\n\n").is_err());
    }

    #[test]
    fn test_split_records_escaped_quote() {
        let records = split_records("a,\"b \"\"q\"\"\",c\r\n");
        let fields = vec!["a".to_string(), "b \"q\"".to_string(), "c".to_string()];
        assert_eq!(records, vec![(1, fields)]);
    }

    #[test]
    fn test_split_records_quoted_newline() {
        let records = split_records("x,\"a\nb\"\n\nr,1\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1[1], "a\nb");
        assert_eq!(records[1].0, 4);
    }

    #[test]
    fn test_label_with_newline_round_trips() {
        let m = LabeledMatrix::from_rows(
            vec!["r\n1".into()],
            vec!["glu\ncose".into(), "ace".into()],
            vec![vec![1.0, 2.0]],
        )
        .unwrap();
        let mut buf = Vec::new();
        write_matrix_csv(&m, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let back = parse_matrix_csv(&text).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        let m = parse_matrix_csv(SAMPLE).unwrap();
        write_matrix_csv(&m, File::create(&path).unwrap()).unwrap();

        let back = read_matrix_csv(&path).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_read_missing_file_has_context() {
        let dir = tempdir().unwrap();
        let err = read_matrix_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("failed to read matrix file"));
    }
}
