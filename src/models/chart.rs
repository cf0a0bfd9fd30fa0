use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Categorical chart flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalKind {
    #[default]
    Bar,
    Pie,
    Treemap,
}

impl CategoricalKind {
    /// Unrecognized names fall back to a bar chart.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "pie" => CategoricalKind::Pie,
            "treemap" => CategoricalKind::Treemap,
            _ => CategoricalKind::Bar,
        }
    }
}

/// Kind of artifact; doubles as the filename prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    TimeSeries,
    Bar,
    Pie,
    Treemap,
    Scatter,
}

impl ChartKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ChartKind::TimeSeries => "time_series",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Treemap => "treemap",
            ChartKind::Scatter => "scatter",
        }
    }
}

impl From<CategoricalKind> for ChartKind {
    fn from(kind: CategoricalKind) -> Self {
        match kind {
            CategoricalKind::Bar => ChartKind::Bar,
            CategoricalKind::Pie => ChartKind::Pie,
            CategoricalKind::Treemap => ChartKind::Treemap,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A chart the agent asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum ChartRequest {
    TimeSeries {
        date_column: String,
        value_column: String,
        title: String,
    },
    Categorical {
        category_column: String,
        value_column: String,
        kind: CategoricalKind,
    },
    Scatter {
        x_column: String,
        y_column: String,
        color_column: Option<String>,
        title: String,
    },
}

/// Points of a scatter trace sharing one colour value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterGroup {
    /// `None` when no colour encoding is applied
    pub name: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub hover: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    Line {
        x: Vec<NaiveDateTime>,
        y: Vec<f64>,
    },
    Categories {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Scatter {
        groups: Vec<ScatterGroup>,
        hover_columns: Vec<String>,
    },
}

/// Declarative description of a chart, ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
    pub output_path: PathBuf,
}
