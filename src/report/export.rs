//! CSV export of ranked and network tables.
//!
//! Multi-valued cells (label lists, ranks) are joined with `;`. An embedded
//! sub-matrix is written row by row, rows joined with `;` and values with a
//! space.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use crate::data::table::quote_field;
use crate::report::formatter::{NetworkTable, RankedTable};

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Write a ranked table; `embed_matrix` adds the sub-matrix column.
pub fn write_ranked_csv<W: Write>(
    table: &RankedTable,
    embed_matrix: bool,
    mut out: W,
) -> anyhow::Result<()> {
    let pair_cols = table
        .entries
        .iter()
        .map(|e| e.pairs.len())
        .max()
        .unwrap_or(0);

    let mut header: Vec<String> = ["rank", "o_score", "score", "rows", "columns"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if embed_matrix {
        header.push("matrix".into());
    }
    for i in 1..=pair_cols {
        header.push(format!("c{i}"));
        header.push(format!("m{i}"));
    }
    writeln!(out, "{}", header.join(","))?;

    for entry in &table.entries {
        let mut fields = vec![
            entry.rank.to_string(),
            entry.orthogonality_index.to_string(),
            entry.score.to_string(),
            quote_field(&join(&entry.rows)),
            quote_field(&join(&entry.cols)),
        ];
        if embed_matrix {
            let rows: Vec<String> = entry
                .submatrix
                .rows()
                .into_iter()
                .map(|r| {
                    r.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            fields.push(rows.join(";"));
        }
        for i in 0..pair_cols {
            match entry.pairs.get(i) {
                Some(pair) => {
                    fields.push(quote_field(&pair.column));
                    fields.push(quote_field(&pair.row));
                }
                None => fields.extend([String::new(), String::new()]),
            }
        }
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Write a network table.
pub fn write_network_csv<W: Write>(table: &NetworkTable, mut out: W) -> anyhow::Result<()> {
    writeln!(out, "rank,score,o_score,compounds,mutants,source_ranks")?;
    for entry in &table.entries {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            entry.rank,
            entry.score,
            entry.orthogonality_index,
            quote_field(&join(&entry.compounds)),
            quote_field(&join(&entry.mutants)),
            join(&entry.source_ranks),
        )?;
    }
    Ok(())
}

pub fn save_ranked_csv(
    table: &RankedTable,
    embed_matrix: bool,
    path: &Path,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut out = BufWriter::new(file);
    write_ranked_csv(table, embed_matrix, &mut out)
        .with_context(|| format!("failed to write ranked table to '{}'", path.display()))?;
    out.flush()?;
    tracing::info!("Wrote {} ranked entries to {}", table.len(), path.display());
    Ok(())
}

pub fn save_network_csv(table: &NetworkTable, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut out = BufWriter::new(file);
    write_network_csv(table, &mut out)
        .with_context(|| format!("failed to write network table to '{}'", path.display()))?;
    out.flush()?;
    tracing::info!("Wrote {} networks to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    use crate::report::formatter::{LabelPair, NetworkEntry, PairingMethod, RankedEntry};
    use crate::search::scoring::Metric;

    fn table() -> RankedTable {
        RankedTable {
            m: 2,
            n: 2,
            metric: Metric::RmsIdentity,
            entries: vec![RankedEntry {
                rank: 1,
                score: 0.5,
                orthogonality_index: 2.0,
                rows: vec!["9".into(), "10".into()],
                cols: vec!["ace".into(), "gly, 2mM".into()],
                submatrix: array![[1.0, 2.0], [3.0, 4.0]],
                pairs: vec![
                    LabelPair {
                        column: "ace".into(),
                        row: "10".into(),
                    },
                    LabelPair {
                        column: "gly, 2mM".into(),
                        row: "9".into(),
                    },
                ],
                pairing: PairingMethod::MaxResponse,
            }],
        }
    }

    #[test]
    fn test_ranked_csv_layout() {
        let mut buf = Vec::new();
        write_ranked_csv(&table(), false, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "rank,o_score,score,rows,columns,c1,m1,c2,m2");
        assert_eq!(
            lines[1],
            "1,2,0.5,9;10,\"ace;gly, 2mM\",ace,10,\"gly, 2mM\",9"
        );
    }

    #[test]
    fn test_ranked_csv_embeds_matrix() {
        let mut buf = Vec::new();
        write_ranked_csv(&table(), true, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().next().unwrap().contains(",matrix,"));
        assert!(text.contains(",1 2;3 4,"));
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let empty = RankedTable {
            entries: Vec::new(),
            ..table()
        };
        let mut buf = Vec::new();
        write_ranked_csv(&empty, false, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "rank,o_score,score,rows,columns\n"
        );
    }

    #[test]
    fn test_save_network_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("networks.csv");
        let networks = NetworkTable {
            dim: 3,
            metric: Metric::RmsIdentity,
            entries: vec![NetworkEntry {
                rank: 1,
                score: 0.25,
                orthogonality_index: 4.0,
                compounds: vec!["a".into(), "b".into(), "c".into()],
                mutants: vec!["1".into(), "2".into(), "3".into()],
                source_ranks: vec![1, 4, 7],
            }],
        };
        save_network_csv(&networks, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "rank,score,o_score,compounds,mutants,source_ranks\n1,0.25,4,a;b;c,1;2;3,1;4;7\n"
        );
    }

    #[test]
    fn test_save_into_missing_dir_fails_with_context() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = save_ranked_csv(&table(), false, &path).unwrap_err();
        assert!(err.to_string().contains("failed to create"));
    }
}
