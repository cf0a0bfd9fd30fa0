use calamine::{open_workbook_auto_from_rs, Data, DataType as _, Reader};
use log::{error, info};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

use crate::error::LoadError;
use crate::models::dataset::Dataset;

/// Supported input formats, keyed by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> Result<Self, LoadError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") | Some("xls") => Ok(FileFormat::Excel),
            _ => Err(LoadError::UnsupportedFormat {
                filename: filename.to_string(),
            }),
        }
    }
}

/// Read a local file into a dataset
pub fn load_path(path: &Path) -> Result<Dataset, LoadError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    // Reject by extension before touching the disk
    FileFormat::from_filename(&filename)?;

    let bytes = std::fs::read(path).map_err(|source| {
        error!("❌ Failed to read {}: {}", path.display(), source);
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    load_dataset(bytes, &filename)
}

/// Parse uploaded bytes according to the declared filename
pub fn load_dataset(bytes: Vec<u8>, filename: &str) -> Result<Dataset, LoadError> {
    let format = FileFormat::from_filename(filename)?;
    info!("📊 Parsing {} ({:?}, {} bytes)", filename, format, bytes.len());

    let parse_start = std::time::Instant::now();
    let frame = match format {
        FileFormat::Csv => parse_csv_data(&bytes),
        FileFormat::Excel => parse_excel_data(bytes),
    }
    .map_err(|reason| {
        error!("❌ Failed to parse {}: {}", filename, reason);
        LoadError::Parse {
            filename: filename.to_string(),
            reason,
        }
    })?;

    if frame.width() == 0 {
        return Err(LoadError::Parse {
            filename: filename.to_string(),
            reason: "no columns found".to_string(),
        });
    }

    info!(
        "✅ Parsed {} in {:.2?}: {} rows, {} columns",
        filename,
        parse_start.elapsed(),
        frame.height(),
        frame.width()
    );
    Ok(Dataset::new(filename, frame))
}

/// Parse raw CSV bytes into a `DataFrame`
fn parse_csv_data(csv_data: &[u8]) -> Result<DataFrame, String> {
    let cursor = Cursor::new(csv_data);
    CsvReader::new(cursor)
        .infer_schema(Some(100))
        .has_header(true)
        .finish()
        .map_err(|e| e.to_string())
}

/// Read the first worksheet; the first row holds the column names
fn parse_excel_data(bytes: Vec<u8>) -> Result<DataFrame, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                Data::Empty => format!("Unnamed: {}", idx),
                other => other.to_string(),
            })
            .collect(),
        None => return Ok(DataFrame::default()),
    };
    let body: Vec<&[Data]> = rows.collect();

    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, name)| sheet_column(name, &body, idx))
        .collect::<Vec<_>>();

    DataFrame::new(columns).map_err(|e| e.to_string())
}

fn sheet_column(name: &str, rows: &[&[Data]], idx: usize) -> Series {
    let cells: Vec<&Data> = rows
        .iter()
        .map(|row| row.get(idx).unwrap_or(&Data::Empty))
        .collect();

    let all_int = cells
        .iter()
        .all(|cell| matches!(cell, Data::Int(_) | Data::Empty));
    let all_numeric = cells
        .iter()
        .all(|cell| matches!(cell, Data::Int(_) | Data::Float(_) | Data::Empty));

    if all_int {
        let values: Vec<Option<i64>> = cells.iter().map(|cell| cell.get_int()).collect();
        Series::new(name, values)
    } else if all_numeric {
        let values: Vec<Option<f64>> = cells.iter().map(|cell| cell.as_f64()).collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells.iter().map(|cell| cell_text(cell)).collect();
        Series::new(name, values)
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::DateTime(_) | Data::DateTimeIso(_) => Some(
            cell.as_datetime()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| cell.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dataset::ColumnKind;
    use std::io::Write;

    const SALES: &str = "date,category,amount\n\
        2024-01-01,Books,12.5\n\
        2024-01-02,Games,40\n\
        2024-01-03,Books,7.25\n\
        2024-01-04,Music,19.99\n\
        2024-01-05,Games,55\n\
        2024-01-06,Books,3\n\
        2024-01-07,Music,11\n\
        2024-01-08,Games,23.5\n\
        2024-01-09,Books,8\n\
        2024-01-10,Music,14\n";

    #[test]
    fn csv_shape_matches_source() {
        let dataset = load_dataset(SALES.as_bytes().to_vec(), "sales.csv").unwrap();
        assert_eq!(dataset.shape(), (10, 3));
        assert_eq!(dataset.column_names(), ["date", "category", "amount"]);
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(FileFormat::from_filename("SALES.CSV").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_filename("book.XLSX").unwrap(), FileFormat::Excel);
        assert_eq!(FileFormat::from_filename("legacy.xls").unwrap(), FileFormat::Excel);
    }

    #[test]
    fn rejects_unsupported_extensions() {
        for name in ["notes.txt", "data.json", "archive.csv.gz", "noextension"] {
            let result = load_dataset(b"a,b\n1,2\n".to_vec(), name);
            assert!(
                matches!(result, Err(LoadError::UnsupportedFormat { .. })),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn empty_csv_is_a_parse_error() {
        let result = load_dataset(Vec::new(), "empty.csv");
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }

    /// Same rows as `SALES`, as a single-sheet workbook
    fn sales_workbook() -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            for (row, line) in SALES.lines().enumerate() {
                for (col, cell) in line.split(',').enumerate() {
                    let (row, col) = (row as u32, col as u16);
                    let written = match cell.parse::<f64>() {
                        Ok(number) if row > 0 && col == 2 => sheet.write_number(row, col, number),
                        _ => sheet.write_string(row, col, cell),
                    };
                    written.unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn xlsx_first_sheet_is_loaded() {
        let dataset = load_dataset(sales_workbook(), "sales.xlsx").unwrap();
        assert_eq!(dataset.shape(), (10, 3));
        assert_eq!(dataset.column_names(), ["date", "category", "amount"]);
        assert_eq!(dataset.column("amount").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(dataset.column("date").unwrap().kind, ColumnKind::DateLike);
        assert_eq!(dataset.column("category").unwrap().kind, ColumnKind::Text);

        let amounts = dataset.frame().column("amount").unwrap().f64().unwrap();
        assert_eq!(amounts.get(1), Some(40.0));
    }

    #[test]
    fn xlsx_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Q1 Sales.XLSX");
        std::fs::write(&path, sales_workbook()).unwrap();

        let dataset = load_path(&path).unwrap();
        assert_eq!(dataset.filename(), "Q1 Sales.XLSX");
        assert_eq!(dataset.shape(), (10, 3));
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let result = load_dataset(b"definitely not a zip".to_vec(), "broken.xlsx");
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_path(Path::new("/nonexistent/andy/sales.csv"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn load_path_reads_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SALES.as_bytes()).unwrap();

        let dataset = load_path(&path).unwrap();
        assert_eq!(dataset.filename(), "sales.csv");
        assert_eq!(dataset.shape(), (10, 3));
    }
}
