use anyhow::{Context, Result};
use polars::io::json::{JsonFormat, JsonWriter};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DATE_NAME_HINTS: [&str; 5] = ["date", "time", "day", "month", "year"];

/// How a column is treated by prompts and chart tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    DateLike,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub kind: ColumnKind,
}

/// Shape and column overview handed back after a successful load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub filename: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
}

/// The table currently under analysis
#[derive(Debug, Clone)]
pub struct Dataset {
    filename: String,
    frame: DataFrame,
    columns: Vec<ColumnInfo>,
}

impl Dataset {
    pub fn new(filename: impl Into<String>, frame: DataFrame) -> Self {
        let columns = frame
            .get_columns()
            .iter()
            .map(|s| ColumnInfo {
                name: s.name().to_string(),
                data_type: format!("{}", s.dtype()),
                kind: infer_kind(s.name(), s.dtype()),
            })
            .collect();

        Self {
            filename: filename.into(),
            frame,
            columns,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.frame.shape()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn summary(&self) -> DatasetSummary {
        let (row_count, column_count) = self.shape();
        DatasetSummary {
            filename: self.filename.clone(),
            row_count,
            column_count,
            columns: self.columns.clone(),
        }
    }

    /// First `n` rows as a printable table
    pub fn head_text(&self, n: usize) -> String {
        format!("{}", self.frame.head(Some(n)))
    }

    /// First `n` rows as an array of JSON records
    pub fn head_json(&self, n: usize) -> Result<Value> {
        frame_to_json(&self.frame.head(Some(n)))
    }

    pub fn estimated_size_mb(&self) -> f64 {
        self.frame.estimated_size() as f64 / (1024.0 * 1024.0)
    }
}

/// Serialize a frame into JSON records
pub fn frame_to_json(frame: &DataFrame) -> Result<Value> {
    let mut buf = Vec::new();
    let mut frame = frame.clone();
    JsonWriter::new(&mut buf)
        .with_json_format(JsonFormat::Json)
        .finish(&mut frame)
        .context("Failed to write DataFrame to JSON")?;
    let json_string =
        std::str::from_utf8(&buf).context("Failed to convert JSON bytes to string")?;
    serde_json::from_str::<Value>(json_string).context("Failed to parse JSON string into Value")
}

pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn infer_kind(name: &str, dtype: &DataType) -> ColumnKind {
    if is_numeric(dtype) {
        return ColumnKind::Numeric;
    }
    if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
        return ColumnKind::DateLike;
    }
    let lowered = name.to_lowercase();
    if DATE_NAME_HINTS.iter().any(|hint| lowered.contains(hint)) {
        ColumnKind::DateLike
    } else {
        ColumnKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Dataset {
        let frame = df!(
            "order_date" => &["2024-01-01", "2024-01-02"],
            "category" => &["Books", "Games"],
            "amount" => &[12.5, 40.0]
        )
        .unwrap();
        Dataset::new("sales.csv", frame)
    }

    #[test]
    fn infers_column_kinds() {
        let dataset = sales();
        assert_eq!(dataset.column("order_date").unwrap().kind, ColumnKind::DateLike);
        assert_eq!(dataset.column("category").unwrap().kind, ColumnKind::Text);
        assert_eq!(dataset.column("amount").unwrap().kind, ColumnKind::Numeric);
    }

    #[test]
    fn numeric_dtype_wins_over_date_name() {
        let frame = df!("year" => &[2021i64, 2022]).unwrap();
        let dataset = Dataset::new("years.csv", frame);
        assert_eq!(dataset.columns()[0].kind, ColumnKind::Numeric);
    }

    #[test]
    fn head_json_returns_records() {
        let json = sales().head_json(1).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["category"], "Books");
    }

    #[test]
    fn summary_reports_shape() {
        let summary = sales().summary();
        assert_eq!((summary.row_count, summary.column_count), (2, 3));
        assert_eq!(summary.filename, "sales.csv");
    }
}
