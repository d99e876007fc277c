use crate::charts::Figure;
use crate::utils::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// In-memory CSV table. Cells stay as text; numeric views are parsed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(StatsError::ValidationError {
                message: format!(
                    "row has {} cells but table has {} columns",
                    row.len(),
                    self.headers.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
        let headers = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        Self::from_csv_reader(data)
    }

    /// Reads a CSV that has no header row, naming the columns from `headers`.
    pub fn from_headerless_csv(data: &[u8], headers: &[&str]) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(data);

        let mut table = Table::new(headers.iter().copied());
        for record in csv_reader.records() {
            let record = record?;
            if record.iter().all(|c| c.is_empty()) {
                continue;
            }
            table.push_row(record.iter().map(|c| c.to_string()).collect())?;
        }
        Ok(table)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| StatsError::IoError(e.into_error()))
    }

    /// Trims header names, optionally lowercasing them.
    pub fn normalize_headers(&mut self, lowercase: bool) {
        for header in &mut self.headers {
            let trimmed = header.trim();
            *header = if lowercase {
                trimmed.to_lowercase()
            } else {
                trimmed.to_string()
            };
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First candidate present in the table.
    pub fn pick_column<'a>(&self, candidates: &[&'a str]) -> Result<&'a str> {
        candidates
            .iter()
            .copied()
            .find(|c| self.has_column(c))
            .ok_or_else(|| StatsError::missing_column(candidates))
    }

    fn require_index(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| StatsError::missing_column(&[name]))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.require_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.column(name)?.into_iter().map(parse_numeric).collect())
    }

    /// Like [`Table::numeric_column`] but accepts `$12,345.67` style cells.
    pub fn currency_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.column(name)?.into_iter().map(parse_currency).collect())
    }

    /// Numeric values with missing cells dropped.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.numeric_column(name)?.into_iter().flatten().collect())
    }

    /// Appends a column, or replaces it when a column of that name exists.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(StatsError::ValidationError {
                message: format!(
                    "column '{}' has {} values but table has {} rows",
                    name,
                    values.len(),
                    self.rows.len()
                ),
            });
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    pub fn map_column<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(&str) -> String,
    {
        let idx = self.require_index(name)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }

    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    pub fn filter_rows<F>(&self, predicate: F) -> Table
    where
        F: Fn(&[String]) -> bool,
    {
        Table {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }
}

/// Parses a plain numeric cell; blanks and non-finite values are missing.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses `$12,345.67` -> 12345.67.
pub fn parse_currency(cell: &str) -> Option<f64> {
    let cleaned: String = cell.chars().filter(|c| *c != '$' && *c != ',').collect();
    parse_numeric(&cleaned)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Formats with thousands separators, e.g. `1234567.891` -> `1,234,567.89`.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

pub fn format_currency(value: f64) -> String {
    format!("${}", format_thousands(value, 2))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

/// Files produced by an analysis, written during the load phase.
#[derive(Debug, Clone)]
pub enum Artifact {
    Csv { name: String, table: Table },
    Json { name: String, value: serde_json::Value },
    Chart { name: String, figure: Figure },
}

impl Artifact {
    pub fn name(&self) -> &str {
        match self {
            Artifact::Csv { name, .. }
            | Artifact::Json { name, .. }
            | Artifact::Chart { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub title: String,
    pub summary: Vec<SummaryLine>,
    pub artifacts: Vec<Artifact>,
}

impl AnalysisOutput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn line(&mut self, label: impl Into<String>, value: impl ToString) -> &mut Self {
        self.summary.push(SummaryLine {
            label: label.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn artifact(&mut self, artifact: Artifact) -> &mut Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn value_of(&self, label: &str) -> Option<&str> {
        self.summary
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.value.as_str())
    }

    pub fn render_summary(&self) -> String {
        render_lines(&self.title, &self.summary)
    }
}

/// Console rendering: a `=== title ===` banner followed by aligned lines.
fn render_lines(title: &str, lines: &[SummaryLine]) -> String {
    let width = lines
        .iter()
        .map(|l| l.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = format!("=== {} ===\n", title);
    for line in lines {
        out.push_str(&format!(
            "{:<width$} : {}\n",
            line.label,
            line.value,
            width = width
        ));
    }
    out
}

/// What the load phase wrote.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub title: String,
    pub summary: Vec<SummaryLine>,
    pub written: Vec<String>,
}

impl RunSummary {
    pub fn render(&self) -> String {
        let mut out = render_lines(&self.title, &self.summary);
        for file in &self.written {
            out.push_str(&format!("Saved: {}\n", file));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::from_csv_bytes(b" Income ,experience\n\"$1,200.50\",3\n,4\nabc,5\n").unwrap()
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("$12,345.67"), Some(12345.67));
        assert_eq!(parse_currency("  42 "), Some(42.0));
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("n/a"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("$5"), None);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(500.0), "$500.00");
        assert_eq!(format_thousands(-1234.5, 1), "-1,234.5");
        assert_eq!(format_thousands(999.0, 0), "999");
    }

    #[test]
    fn test_normalize_and_pick_column() {
        let mut table = sample_table();
        assert!(table.pick_column(&["income"]).is_err());
        table.normalize_headers(true);
        assert_eq!(table.pick_column(&["income_num", "income"]).unwrap(), "income");
        let income = table.currency_column("income").unwrap();
        assert_eq!(income, vec![Some(1200.5), None, None]);
    }

    #[test]
    fn test_set_column_appends_and_replaces() {
        let mut table = sample_table();
        table
            .set_column("flag", vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        assert_eq!(table.headers.len(), 3);
        table
            .set_column("flag", vec!["x".into(), "y".into(), "z".into()])
            .unwrap();
        assert_eq!(table.column("flag").unwrap(), vec!["x", "y", "z"]);
        assert!(table.set_column("short", vec!["1".into()]).is_err());
    }

    #[test]
    fn test_headerless_csv() {
        let table = Table::from_headerless_csv(b"10,5\n\n20, 7\n", &["sale", "cost"]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.numeric_values("cost").unwrap(), vec![5.0, 7.0]);
    }

    #[test]
    fn test_csv_round_trip_keeps_quoting() {
        let table = sample_table();
        let bytes = table.to_csv_bytes().unwrap();
        let back = Table::from_csv_bytes(&bytes).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_render_summary_aligns_labels() {
        let mut output = AnalysisOutput::new("demo");
        output.line("Count", 3).line("Mean value", "2.00");
        let text = output.render_summary();
        assert!(text.starts_with("=== demo ==="));
        assert!(text.contains("Count      : 3"));
        assert_eq!(output.value_of("Mean value"), Some("2.00"));
    }
}
