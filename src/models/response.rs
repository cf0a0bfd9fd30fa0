use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::models::conversation::ConversationTurn;
use crate::models::dataset::{ColumnInfo, DatasetSummary};

/// Profile of one column. Numeric columns carry `numeric`, text columns
/// carry `frequent_values`, date-like columns carry neither.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ColumnStatistics {
    pub name: String,
    pub data_type: String,
    pub null_count: usize,
    pub unique_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequent_values: Option<HashMap<String, u32>>,
}

/// Spread of a numeric column; averages rounded to two decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Absent below two values
    pub std_dev: Option<f64>,
    pub percentile_25: f64,
    pub percentile_75: f64,
}

/// Summary of the dataset
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DataSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub summary_text: String,
}

/// Everything the `describe_dataset` tool reports
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DatasetProfile {
    pub data_summary: DataSummary,
    pub column_statistics: Vec<ColumnStatistics>,
    pub correlations: Option<HashMap<String, f64>>,
}

/// Session flags, mostly for debugging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionInfo {
    pub data_loaded: bool,
    pub has_dataset: bool,
    pub has_agent: bool,
    pub conversation_length: usize,
    pub memory_length: usize,
    pub initial_analysis_done: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataPreview {
    pub row_count: usize,
    pub column_count: usize,
    pub memory_usage_mb: f64,
    pub columns: Vec<ColumnInfo>,
    pub rows: serde_json::Value,
}

/// Full view of a session for the dashboard
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub info: SessionInfo,
    pub filename: Option<String>,
    pub preview: Option<DataPreview>,
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadResponse {
    pub message: String,
    pub dataset: DatasetSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub charts: Vec<String>,
    /// The agent call failed and nothing was recorded; `answer` holds the error text
    #[serde(default)]
    pub failed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuickActionResponse {
    pub label: String,
    pub question: String,
}

/// Error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status_code: u16,
}

/// Maps an artifact path to the URL the dashboard serves it from
pub fn chart_url(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!("/charts/{}", name))
}
