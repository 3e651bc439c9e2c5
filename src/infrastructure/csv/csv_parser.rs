// ============================================================
// CSV PARSER
// ============================================================
// Load CSV files into tables with encoding fallback and missing-value detection

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::WINDOWS_1252;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::domain::csv::{Cell, Table};
use crate::domain::error::{AppError, Result};

/// Markers read as missing values unless configured otherwise
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// CSV parser producing [`Table`]s
#[derive(Debug, Clone)]
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,

    /// Raw values treated as missing cells
    na_values: HashSet<String>,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: false,
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to trim whitespace
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Replace the set of missing-value markers
    pub fn with_na_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.na_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a CSV file into a table
    pub fn parse_file(&self, path: &Path) -> Result<Table> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.parse_bytes(&bytes)
    }

    /// Parse raw uploaded bytes into a table
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Table> {
        let content = decode(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(AppError::EmptyData(
                "No columns to parse from file".to_string(),
            ));
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(AppError::ParseError(format!(
                    "Error tokenizing data. Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                )));
            }
            rows.push(self.parse_row(&record));
        }

        Table::from_rows(normalize_headers(&headers), rows)
    }

    fn parse_row(&self, record: &StringRecord) -> Vec<Cell> {
        record
            .iter()
            .map(|value| {
                if self.na_values.contains(value) {
                    None
                } else {
                    Some(value.to_string())
                }
            })
            .collect()
    }
}

/// Decode as UTF-8, falling back to Windows-1252 for legacy exports.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (content, _, _) = WINDOWS_1252.decode(bytes);
            content.into_owned()
        }
    }
}

/// Name blank headers `Unnamed: <i>` and suffix duplicates with `.1`, `.2`, ...
fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());

    for (idx, raw) in headers.iter().enumerate() {
        let base = if raw.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        while used.contains(&name) {
            let count = counts.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }

        used.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let content = "name,age,city\nAlice,30,NYC\nBob,25,LA";
        let table = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["name", "age", "city"]);
        assert_eq!(
            table.column("name").unwrap().cells[0].as_deref(),
            Some("Alice")
        );
    }

    #[test]
    fn test_missing_values_are_counted() {
        let content = "Name,Email\nA,a@x.com\nB,\nC,c@x.com\nD,d@x.com\nE,e@x.com\n";
        let table = CsvParser::new().parse_content(content).unwrap();
        let stats = table.column_stats();

        assert_eq!(stats[1].0, "Email");
        assert_eq!(stats[1].1.total, 4);
        assert_eq!(stats[1].1.percentage, 80.0);
        assert_eq!(stats[0].1.percentage, 100.0);
    }

    #[test]
    fn test_na_markers_are_missing() {
        let content = "a,b\nNA,1\nnull,2\nvalue,N/A";
        let table = CsvParser::new().parse_content(content).unwrap();
        assert_eq!(table.column("a").unwrap().non_missing(), 1);
        assert_eq!(table.column("b").unwrap().non_missing(), 2);
    }

    #[test]
    fn test_custom_na_values() {
        let content = "a\nNA\n-";
        let table = CsvParser::new()
            .with_na_values(["", "-"])
            .parse_content(content)
            .unwrap();
        assert_eq!(table.column("a").unwrap().cells, vec![Some("NA".to_string()), None]);
    }

    #[test]
    fn test_empty_input_is_empty_data() {
        let err = CsvParser::new().parse_content("").unwrap_err();
        assert!(matches!(err, AppError::EmptyData(_)));
    }

    #[test]
    fn test_too_many_fields_is_parse_error() {
        let err = CsvParser::new()
            .parse_content("a,b\n1,2\n3,4,5\n")
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
        assert!(err.message().contains("Expected 2 fields"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = CsvParser::new().parse_content("a,b,c\n1\n").unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column("c").unwrap().cells, vec![None]);
    }

    #[test]
    fn test_header_normalization() {
        let table = CsvParser::new().parse_content("x,,x,x\n1,2,3,4").unwrap();
        assert_eq!(table.column_names(), vec!["x", "Unnamed: 1", "x.1", "x.2"]);
    }

    #[test]
    fn test_latin1_fallback_and_bom() {
        let latin1 = b"nome\nJo\xE3o\n";
        let table = CsvParser::new().parse_bytes(latin1).unwrap();
        assert_eq!(table.column("nome").unwrap().cells[0].as_deref(), Some("João"));

        let bom = b"\xEF\xBB\xBFid\n1\n";
        let table = CsvParser::new().parse_bytes(bom).unwrap();
        assert_eq!(table.column_names(), vec!["id"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let table = CsvParser::new()
            .with_delimiter(b';')
            .with_trim(true)
            .parse_content("a; b\n1; 2")
            .unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.column("b").unwrap().cells[0].as_deref(), Some("2"));
    }
}
