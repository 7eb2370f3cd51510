use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{SessionError, SessionResult};

/// One declared column of a [`TableKey`]: name, unit, and a printf-style
/// format string (spec.md §6 "table-key section... declares each column's
/// name, unit and printf-style format"; `TableKey::Column` in
/// `tablekey.cc`).
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub name: String,
    pub unit: String,
    pub format: String,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, format: impl Into<String>) -> Self {
        Self { name: name.into(), unit: unit.into(), format: format.into() }
    }
}

/// Declares the columns of a table: name/unit/format triples plus the
/// formatting knobs `tablekey.cc` exposes (key-line prefix, separator,
/// missing-value placeholder).
#[derive(Debug, Clone)]
pub struct TableKey {
    columns: Vec<TableColumn>,
    key_start: String,
    separator: String,
    missing: String,
}

impl Default for TableKey {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            key_start: "# ".to_string(),
            separator: "\t".to_string(),
            missing: "-".to_string(),
        }
    }
}

impl TableKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, column: TableColumn) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn set_missing(&mut self, missing: impl Into<String>) {
        self.missing = missing.into();
    }

    pub fn set_separator(&mut self, separator: impl Into<String>) {
        self.separator = separator.into();
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Writes the `# key:` column-declaration block followed by the
    /// name/unit/number header rows, per spec.md §6 (`TableKey::saveKey`
    /// reduced to a single non-grouped column level — the original's
    /// hierarchical group headers have no counterpart in the distilled
    /// format).
    pub fn write_header<W: Write>(&self, out: &mut W) -> SessionResult<()> {
        if self.columns.is_empty() {
            return Err(SessionError::EmptyTableKey);
        }
        writeln!(out, "{}Key", self.key_start.trim_end())?;

        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(out, "{}{}", self.key_start, names.join(&self.separator))?;

        if self.columns.iter().any(|c| !c.unit.is_empty()) {
            let units: Vec<&str> = self
                .columns
                .iter()
                .map(|c| if c.unit.is_empty() { "-" } else { c.unit.as_str() })
                .collect();
            writeln!(out, "{}{}", self.key_start, units.join(&self.separator))?;
        }

        let numbers: Vec<String> = (1..=self.columns.len()).map(|n| n.to_string()).collect();
        writeln!(out, "{}{}", self.key_start, numbers.join(&self.separator))?;
        Ok(())
    }

    /// Formats one data row, substituting [`Self::missing`] for `None`
    /// values (spec.md §6 "missing values are rendered as a configurable
    /// placeholder").
    pub fn format_row(&self, values: &[Option<f64>]) -> SessionResult<String> {
        if values.len() != self.columns.len() {
            return Err(SessionError::ColumnMismatch { expected: self.columns.len(), got: values.len() });
        }
        let cells: Vec<String> = values
            .iter()
            .zip(&self.columns)
            .map(|(v, col)| match v {
                Some(x) => format_value(*x, &col.format),
                None => self.missing.clone(),
            })
            .collect();
        Ok(cells.join(&self.separator))
    }
}

/// Minimal printf-style formatter covering the `%d`/`%g`/`%f.N` forms
/// `tablekey.cc` uses for numeric columns; anything else falls back to
/// Rust's default float formatting.
fn format_value(value: f64, format: &str) -> String {
    if let Some(rest) = format.strip_prefix("%.") {
        if let Some(prec) = rest.strip_suffix('f').and_then(|p| p.parse::<usize>().ok()) {
            return format!("{value:.prec$}");
        }
    }
    if format.ends_with('d') {
        return format!("{}", value.round() as i64);
    }
    format!("{value}")
}

/// Appends tab-separated tables to a single on-disk file: a `# key:
/// value` metadata header, the [`TableKey`] declaration, then rows,
/// terminated by a blank-line pair before the next table (spec.md §6
/// "a file is an append-only concatenation of tables").
pub struct TableWriter {
    key: TableKey,
    file: BufWriter<File>,
}

impl TableWriter {
    pub fn create(path: impl AsRef<Path>, key: TableKey) -> SessionResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { key, file: BufWriter::new(file) })
    }

    /// Writes the `# key: value` metadata header lines preceding a table.
    pub fn write_metadata(&mut self, entries: &[(String, String)]) -> SessionResult<()> {
        for (k, v) in entries {
            writeln!(self.file, "# {k}: {v}")?;
        }
        Ok(())
    }

    pub fn write_header(&mut self) -> SessionResult<()> {
        self.key.write_header(&mut self.file)
    }

    pub fn write_row(&mut self, values: &[Option<f64>]) -> SessionResult<()> {
        let row = self.key.format_row(values)?;
        writeln!(self.file, "{row}")?;
        Ok(())
    }

    /// Terminates the current table with two blank lines.
    pub fn end_table(&mut self) -> SessionResult<()> {
        writeln!(self.file, "\n")?;
        self.file.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> SessionResult<()> {
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lists_name_unit_and_number_rows() {
        let mut key = TableKey::new();
        key.add_column(TableColumn::new("time", "s", "%.3f"));
        key.add_column(TableColumn::new("voltage", "mV", "%.2f"));
        let mut buf = Vec::new();
        key.write_header(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("# Key\n"));
        assert!(text.contains("time\tvoltage"));
        assert!(text.contains("s\tmV"));
        assert!(text.contains("1\t2"));
    }

    #[test]
    fn missing_values_use_the_configured_placeholder() {
        let mut key = TableKey::new();
        key.add_column(TableColumn::new("x", "", "%.1f"));
        key.add_column(TableColumn::new("y", "", "%.1f"));
        let row = key.format_row(&[Some(1.5), None]).unwrap();
        assert_eq!(row, "1.5\t-");
    }

    #[test]
    fn writer_appends_tables_to_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.dat");

        let mut key = TableKey::new();
        key.add_column(TableColumn::new("t", "s", "%.2f"));

        {
            let mut writer = TableWriter::create(&path, key.clone()).unwrap();
            writer.write_metadata(&[("experiment".into(), "baseline".into())]).unwrap();
            writer.write_header().unwrap();
            writer.write_row(&[Some(0.0)]).unwrap();
            writer.end_table().unwrap();
        }
        {
            let mut writer = TableWriter::create(&path, key).unwrap();
            writer.write_header().unwrap();
            writer.write_row(&[Some(1.0)]).unwrap();
            writer.end_table().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("# Key").count(), 2);
        assert!(contents.contains("0.00"));
        assert!(contents.contains("1.00"));
    }
}
