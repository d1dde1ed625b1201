use crate::flatten::FlatTable;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

static NON_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid regex"));

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = fields.into_iter().map(|f| csv_quote(f.as_ref())).collect();
    quoted.join(",")
}

/// Renders the table as CSV text: the header row, then one line per row.
///
/// Empty cells are empty fields and numbers carry no trailing `.0`.
pub fn to_csv(table: &FlatTable) -> String {
    let mut csv = csv_line(&table.columns);
    csv.push('\n');
    for row in &table.rows {
        csv.push_str(&csv_line(row.values.iter().map(|v| v.to_string())));
        csv.push('\n');
    }
    csv
}

/// Writes the table to `path` as CSV, creating missing parent directories.
///
/// Returns:
/// - `Ok(PathBuf)`: The path that was written.
/// - `Err(_)`: The directory or the file could not be written.
pub fn write_csv(table: &FlatTable, path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_csv(table))?;
    info!("Exported {} rows to {}", table.rows.len(), path.display());
    Ok(path.to_path_buf())
}

/// File name for an assignment export, e.g. `essay_1_rubric_1234.csv`.
pub fn export_file_name(assignment_name: Option<&str>, assignment_id: Option<&str>) -> String {
    let slug = |s: &str| {
        NON_FILENAME
            .replace_all(s, "_")
            .trim_matches('_')
            .to_lowercase()
    };

    let mut parts: Vec<String> = Vec::new();
    if let Some(name) = assignment_name.map(slug).filter(|s| !s.is_empty()) {
        parts.push(name);
    }
    parts.push("rubric".to_string());
    if let Some(id) = assignment_id.map(slug).filter(|s| !s.is_empty()) {
        parts.push(id);
    }
    format!("{}.csv", parts.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{CellValue, FlatRow};

    fn table() -> FlatTable {
        FlatTable {
            columns: vec!["Student Name".to_string(), "Clarity Points".to_string(), "Clarity Comments".to_string()],
            criteria: Vec::new(),
            rows: vec![
                FlatRow {
                    values: vec![
                        CellValue::Text("Doe, Jane".to_string()),
                        CellValue::Number(4.0),
                        CellValue::Text("Said \"great\"\nsecond line".to_string()),
                    ],
                },
                FlatRow {
                    values: vec![CellValue::Text("Bob".to_string()), CellValue::Number(2.5), CellValue::Empty],
                },
            ],
        }
    }

    #[test]
    fn test_to_csv_quotes_fields() {
        assert_eq!(
            to_csv(&table()),
            "Student Name,Clarity Points,Clarity Comments\n\
             \"Doe, Jane\",4,\"Said \"\"great\"\"\nsecond line\"\n\
             Bob,2.5,\n"
        );
    }

    #[test]
    fn test_to_csv_header_only() {
        let empty = FlatTable {
            columns: vec!["A".to_string(), "B".to_string()],
            ..FlatTable::default()
        };
        assert_eq!(to_csv(&empty), "A,B\n");
    }

    #[test]
    fn test_write_csv_creates_directories() {
        let dir = std::env::temp_dir().join(format!("rubric_export_{}", std::process::id()));
        let path = dir.join("nested").join("out.csv");

        let written = write_csv(&table(), &path).unwrap();
        assert_eq!(written, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), to_csv(&table()));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(Some("Essay 1: Draft!"), Some("1234")),
            "essay_1_draft_rubric_1234.csv"
        );
        assert_eq!(export_file_name(None, Some("9")), "rubric_9.csv");
        assert_eq!(export_file_name(Some("???"), None), "rubric.csv");
    }
}
