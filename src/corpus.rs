//! Corpus tables: one row per publication, string cells, named columns.
//!
//! The table is an interchange shape, not a data frame: the pipeline only needs
//! to find the `urn` column, drop columns that carry no values, and join score
//! rows back on `urn`. Delimited text (CSV, TSV or `;`) is the wire format.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, SentimentError};

/// Document identifier column.
pub const URN_COLUMN: &str = "urn";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CorpusTable {
    /// Every row must have exactly one cell per column; column names must be unique.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].contains(c) {
                return Err(SentimentError::malformed(format!("duplicate column `{c}`")));
            }
        }
        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(SentimentError::malformed(format!(
                "row {i} has {} cells, expected {}",
                r.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse delimited text with a header row. The delimiter is picked from the
    /// header line: tab, then `;` (when there is no comma), else comma.
    pub fn from_delimited(text: &str) -> Result<Self> {
        let header = text.lines().next().unwrap_or_default();
        let delimiter = sniff_delimiter(header);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| SentimentError::malformed(format!("failed to read header: {e}")))?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| SentimentError::malformed(format!("failed to read record: {e}")))?;
            rows.push(record.iter().map(|c| c.trim().to_string()).collect());
        }
        Self::new(columns, rows)
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            SentimentError::unavailable(format!("corpus file {}", path.display()), e)
        })?;
        Self::from_delimited(&text)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let encode = |e: csv::Error| SentimentError::decode("csv output", e);
        writer.write_record(&self.columns).map_err(encode)?;
        for row in &self.rows {
            writer.write_record(row).map_err(encode)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SentimentError::decode("csv output", e.error()))?;
        String::from_utf8(bytes).map_err(|e| SentimentError::decode("csv output", e))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            SentimentError::malformed(format!("corpus table has no `{name}` column"))
        })
    }

    /// Cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let c = self.column_index(column)?;
        self.rows.get(row).map(|r| r[c].as_str())
    }

    /// Non-empty document ids in row order (duplicates kept).
    pub fn urns(&self) -> Result<Vec<String>> {
        let idx = self.require_column(URN_COLUMN)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r[idx].clone())
            .filter(|u| !u.is_empty())
            .collect())
    }

    /// Drop columns whose cells are empty in every row. Columns named in `keep`
    /// survive regardless (the join key must not vanish from an empty table).
    pub fn strip_empty_columns(&self, keep: &[&str]) -> Self {
        let retained: Vec<usize> = (0..self.columns.len())
            .filter(|&c| {
                keep.contains(&self.columns[c].as_str())
                    || self.rows.iter().any(|r| !r[c].trim().is_empty())
            })
            .collect();
        self.project(&retained)
    }

    /// Drop the named columns; names not present are ignored.
    pub fn without_columns(&self, names: &[&str]) -> Self {
        let retained: Vec<usize> = (0..self.columns.len())
            .filter(|&c| !names.contains(&self.columns[c].as_str()))
            .collect();
        self.project(&retained)
    }

    fn project(&self, retained: &[usize]) -> Self {
        Self {
            columns: retained.iter().map(|&c| self.columns[c].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| retained.iter().map(|&c| r[c].clone()).collect())
                .collect(),
        }
    }

    /// Inner join on column `on`, keeping `self`'s row order. Each left row is
    /// repeated once per matching right row; left rows without a match are dropped.
    /// The right table's `on` column is not repeated, and right columns whose
    /// names clash with left ones are suffixed with `_y`.
    pub fn inner_join(&self, right: &CorpusTable, on: &str) -> Result<Self> {
        let lk = self.require_column(on)?;
        let rk = right.require_column(on)?;

        let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, r) in right.rows.iter().enumerate() {
            index.entry(r[rk].as_str()).or_default().push(i);
        }

        let right_cols: Vec<usize> = (0..right.columns.len()).filter(|&c| c != rk).collect();
        let mut columns = self.columns.clone();
        for &c in &right_cols {
            let name = &right.columns[c];
            if columns.contains(name) {
                columns.push(format!("{name}_y"));
            } else {
                columns.push(name.clone());
            }
        }

        let mut rows = Vec::new();
        for l in &self.rows {
            let Some(matches) = index.get(l[lk].as_str()) else {
                continue;
            };
            for &m in matches {
                let mut row = l.clone();
                row.extend(right_cols.iter().map(|&c| right.rows[m][c].clone()));
                rows.push(row);
            }
        }
        Self::new(columns, rows)
    }
}

fn sniff_delimiter(header: &str) -> u8 {
    if header.contains('\t') {
        b'\t'
    } else if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

/// Turn user keyword input into a list.
///
/// Newline-separated when the input contains a newline, else comma-separated,
/// else a single keyword. Items are trimmed; blanks are dropped.
pub fn parse_keywords(value: &str) -> Result<Vec<String>> {
    let parts: Vec<&str> = if value.contains('\n') {
        value.split('\n').collect()
    } else if value.contains(',') {
        value.split(',').collect()
    } else {
        vec![value]
    };
    let words: Vec<String> = parts
        .into_iter()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Err(SentimentError::malformed("no keyword given"));
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cols: &[&str], rows: &[&[&str]]) -> CorpusTable {
        CorpusTable::new(
            cols.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn reads_csv_and_tsv() {
        let csv = CorpusTable::from_delimited("urn,title,year\nA,Avis,1999\nB,\"Bok, en\",2001\n").unwrap();
        assert_eq!(csv.columns(), &["urn", "title", "year"]);
        assert_eq!(csv.cell(1, "title"), Some("Bok, en"));

        let tsv = CorpusTable::from_delimited("urn\tyear\nA\t1999\n").unwrap();
        assert_eq!(tsv.cell(0, "year"), Some("1999"));

        let semi = CorpusTable::from_delimited("urn;year\nA;1999\n").unwrap();
        assert_eq!(semi.urns().unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let err = CorpusTable::from_delimited("urn,year\nA,1999,extra\n").unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn missing_urn_column_is_malformed() {
        let t = table(&["id"], &[&["A"]]);
        assert_eq!(t.urns().unwrap_err().kind(), "malformed_input");
    }

    #[test]
    fn strip_drops_all_empty_columns_only() {
        let t = table(
            &["urn", "author", "year"],
            &[&["A", "", "1999"], &["B", " ", ""]],
        );
        let s = t.strip_empty_columns(&[]);
        assert_eq!(s.columns(), &["urn", "year"]);
        assert_eq!(s.rows()[1], vec!["B".to_string(), "".to_string()]);
    }

    #[test]
    fn strip_keeps_key_on_empty_table() {
        let t = table(&["urn", "title"], &[]);
        assert_eq!(t.strip_empty_columns(&[URN_COLUMN]).columns(), &["urn"]);
    }

    #[test]
    fn without_columns_ignores_unknown_names() {
        let t = table(&["urn", "positive", "year"], &[&["A", "0", "1999"]]);
        let s = t.without_columns(&["positive", "missing"]);
        assert_eq!(s.columns(), &["urn", "year"]);
        assert_eq!(s.rows()[0], vec!["A".to_string(), "1999".to_string()]);
    }

    #[test]
    fn inner_join_keeps_left_order_and_drops_unmatched() {
        let left = table(&["urn", "year"], &[&["A", "1"], &["B", "2"], &["C", "3"]]);
        let right = table(
            &["urn", "score", "year"],
            &[&["C", "-1", "x"], &["A", "4", "y"], &["A", "5", "z"]],
        );
        let j = left.inner_join(&right, "urn").unwrap();
        assert_eq!(j.columns(), &["urn", "year", "score", "year_y"]);
        let urns: Vec<_> = j.rows().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(urns, vec!["A", "A", "C"]);
    }

    #[test]
    fn csv_output_round_trips_quotes() {
        let t = table(&["urn", "title"], &[&["A", "Bok, \"en\""]]);
        let out = t.to_csv().unwrap();
        assert_eq!(CorpusTable::from_delimited(&out).unwrap(), t);
    }

    #[test]
    fn keywords_split_by_newline_then_comma() {
        assert_eq!(parse_keywords("sol").unwrap(), vec!["sol"]);
        assert_eq!(parse_keywords(" sol, regn ,").unwrap(), vec!["sol", "regn"]);
        assert_eq!(
            parse_keywords("sol, sommer\nregn\n").unwrap(),
            vec!["sol, sommer", "regn"]
        );
        assert_eq!(parse_keywords("  \n \n").unwrap_err().kind(), "malformed_input");
    }
}
