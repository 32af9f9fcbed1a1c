//! Result export: SQL, CSV and JSON files.
//!
//! An export is built in memory as an [`ExportFile`] and then handed to a
//! [`DownloadSink`]. The SQL format exports the query text, the other two
//! export the last result set.

use crate::error::{PanelError, Result};
use crate::executor::{ResultSet, Row};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const NO_DATA_MESSAGE: &str = "No data to export";
pub const NO_QUERY_MESSAGE: &str = "No query to export";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    SqlQuery,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::SqlQuery, Self::Csv, Self::Json];

    /// User-facing label, as shown in the controls bar.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SqlQuery => "SQL Query",
            Self::Csv => "CSV File",
            Self::Json => "JSON File",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::SqlQuery => "query.sql",
            Self::Csv => "data.csv",
            Self::Json => "data.json",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::SqlQuery => "text/sql",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExportFormat {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sql query" | "sql" => Ok(Self::SqlQuery),
            "csv file" | "csv" => Ok(Self::Csv),
            "json file" | "json" => Ok(Self::Json),
            _ => Err(PanelError::export(format!(
                "Unknown export format: '{s}'. Expected: SQL Query, CSV File or JSON File"
            ))),
        }
    }
}

/// An export ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub contents: String,
}

/// Builds the export for `format`.
///
/// SQL needs non-blank query text; CSV and JSON need at least one result row.
pub fn build_export(
    format: ExportFormat,
    query: &str,
    results: Option<&ResultSet>,
) -> Result<ExportFile> {
    let contents = match format {
        ExportFormat::SqlQuery => {
            if query.trim().is_empty() {
                return Err(PanelError::export(NO_QUERY_MESSAGE));
            }
            query.to_string()
        }
        ExportFormat::Csv | ExportFormat::Json => {
            let rows = match results {
                Some(rows) if !rows.is_empty() => rows,
                _ => return Err(PanelError::export(NO_DATA_MESSAGE)),
            };
            if format == ExportFormat::Csv {
                to_csv(rows)
            } else {
                to_json(rows)?
            }
        }
    };

    Ok(ExportFile {
        file_name: format.file_name(),
        mime: format.mime(),
        contents,
    })
}

/// Serializes rows as CSV.
///
/// The header comes from the first row's keys and every row is written in that
/// key order. Cells are not quoted, so values containing commas, quotes or
/// newlines produce ambiguous output.
pub fn to_csv(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let columns: Vec<&String> = first.keys().collect();
    let header = columns
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let body = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c.as_str()).map(csv_cell).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{header}\n{body}")
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items.iter().map(csv_cell).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Serializes rows as a compact JSON array.
pub fn to_json(rows: &[Row]) -> Result<String> {
    serde_json::to_string(rows)
        .map_err(|e| PanelError::export(format!("Failed to serialize rows: {e}")))
}

/// Destination for finished exports.
pub trait DownloadSink {
    /// Delivers the file, overwriting any previous delivery of the same name.
    fn deliver(&mut self, file: &ExportFile) -> Result<()>;
}

/// Writes exports into a directory on disk.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for FileDownloader {
    fn deliver(&mut self, file: &ExportFile) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            PanelError::export(format!("Cannot create {}: {e}", self.dir.display()))
        })?;

        let path = self.dir.join(file.file_name);
        std::fs::write(&path, &file.contents)
            .map_err(|e| PanelError::export(format!("Cannot write {}: {e}", path.display())))?;

        info!(path = %path.display(), mime = file.mime, "Export written");
        Ok(())
    }
}

/// Collects exports in memory.
impl DownloadSink for Vec<ExportFile> {
    fn deliver(&mut self, file: &ExportFile) -> Result<()> {
        self.push(file.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rows(value: Value) -> ResultSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("SQL Query".parse::<ExportFormat>().unwrap(), ExportFormat::SqlQuery);
        assert_eq!("csv file".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_format_labels_parse_back() {
        for format in ExportFormat::ALL {
            assert_eq!(format.label().parse::<ExportFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_csv_single_row() {
        let data = rows(json!([{ "x": 1, "y": 2 }]));
        assert_eq!(to_csv(&data), "x,y\n1,2");
    }

    #[test]
    fn test_csv_uses_first_row_key_order() {
        let data = rows(json!([
            { "name": "Alice", "id": 1 },
            { "id": 2, "name": "Bob" }
        ]));
        assert_eq!(to_csv(&data), "name,id\nAlice,1\nBob,2");
    }

    #[test]
    fn test_csv_value_rendering() {
        let data = rows(json!([{
            "n": null,
            "b": true,
            "f": 1.5,
            "s": "text",
            "a": [1, "two", null],
            "o": { "k": 1 }
        }]));
        assert_eq!(to_csv(&data), "n,b,f,s,a,o\n,true,1.5,text,1,two,,{\"k\":1}");
    }

    #[test]
    fn test_csv_does_not_quote() {
        let data = rows(json!([{ "v": "a,b" }]));
        assert_eq!(to_csv(&data), "v\na,b");
    }

    #[test]
    fn test_csv_missing_key_is_empty() {
        let data = rows(json!([{ "a": 1, "b": 2 }, { "a": 3 }]));
        assert_eq!(to_csv(&data), "a,b\n1,2\n3,");
    }

    #[test]
    fn test_json_round_trip() {
        let data = rows(json!([
            { "id": 1, "tags": ["x", "y"], "meta": { "ok": true }, "gone": null },
            { "id": 2, "tags": [], "meta": {}, "gone": "no" }
        ]));
        let text = to_json(&data).unwrap();
        let parsed: ResultSet = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_build_sql_exports_query_text() {
        let file = build_export(ExportFormat::SqlQuery, "SELECT 1", None).unwrap();
        assert_eq!(file.file_name, "query.sql");
        assert_eq!(file.mime, "text/sql");
        assert_eq!(file.contents, "SELECT 1");
    }

    #[test]
    fn test_build_sql_requires_query() {
        let err = build_export(ExportFormat::SqlQuery, "  ", None).unwrap_err();
        assert_eq!(err.detail(), NO_QUERY_MESSAGE);
    }

    #[test]
    fn test_build_data_requires_rows() {
        let empty = ResultSet::new();
        for format in [ExportFormat::Csv, ExportFormat::Json] {
            let err = build_export(format, "SELECT 1", None).unwrap_err();
            assert_eq!(err.detail(), NO_DATA_MESSAGE);
            let err = build_export(format, "SELECT 1", Some(&empty)).unwrap_err();
            assert_eq!(err.detail(), NO_DATA_MESSAGE);
        }
    }

    #[test]
    fn test_file_downloader_writes_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileDownloader::new(dir.path().join("exports"));
        let data = rows(json!([{ "x": 1 }]));

        let first = build_export(ExportFormat::Json, "", Some(&data)).unwrap();
        sink.deliver(&first).unwrap();

        let data = rows(json!([{ "x": 2 }]));
        let second = build_export(ExportFormat::Json, "", Some(&data)).unwrap();
        sink.deliver(&second).unwrap();

        let written = std::fs::read_to_string(sink.dir().join("data.json")).unwrap();
        assert_eq!(written, r#"[{"x":2}]"#);
        assert_eq!(sink.dir(), dir.path().join("exports"));
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<ExportFile> = Vec::new();
        let file = build_export(ExportFormat::SqlQuery, "SELECT 1", None).unwrap();
        sink.deliver(&file).unwrap();
        assert_eq!(sink, vec![file]);
    }
}
