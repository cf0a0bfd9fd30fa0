//! Tools exposed to the model, and their dispatch.

use chrono::Local;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::chart::{CategoricalKind, ChartRequest};
use crate::models::dataset::{frame_to_json, Dataset};
use crate::services::charts::ChartTemplates;
use crate::services::profile::profile_dataset;
use crate::services::query::DataQuery;
use crate::services::render::ChartRenderer;

pub const TIME_SERIES_TOOL: &str = "create_time_series_chart";
pub const CATEGORICAL_TOOL: &str = "create_categorical_chart";
pub const SCATTER_TOOL: &str = "create_scatter_plot";
pub const DESCRIBE_TOOL: &str = "describe_dataset";
pub const QUERY_TOOL: &str = "query_dataframe";

#[derive(Debug, Deserialize)]
struct TimeSeriesArgs {
    date_column: String,
    value_column: String,
    #[serde(default = "default_time_series_title")]
    title: String,
}

#[derive(Debug, Deserialize)]
struct CategoricalArgs {
    category_column: String,
    value_column: String,
    #[serde(default)]
    chart_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScatterArgs {
    x_column: String,
    y_column: String,
    #[serde(default)]
    color_column: Option<String>,
    #[serde(default = "default_scatter_title")]
    title: String,
}

fn default_time_series_title() -> String {
    "Time Series".to_string()
}

fn default_scatter_title() -> String {
    "Scatter Plot".to_string()
}

/// What a tool call produced
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
    pub chart: Option<PathBuf>,
}

impl ToolOutcome {
    fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
            chart: None,
        }
    }

    fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
            chart: None,
        }
    }
}

/// Dataset-bound tool implementations
#[derive(Clone)]
pub struct Toolbox {
    dataset: Arc<Dataset>,
    templates: ChartTemplates,
    renderer: Arc<dyn ChartRenderer>,
}

impl Toolbox {
    pub fn new(
        dataset: Arc<Dataset>,
        templates: ChartTemplates,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            dataset,
            templates,
            renderer,
        }
    }

    /// JSON schema definitions in the provider's tool format
    pub fn definitions(&self) -> Vec<Value> {
        vec![
            json!({
                "name": TIME_SERIES_TOOL,
                "description": "Create an interactive time series chart. Use this when you need to show trends over time.",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "date_column": {"type": "string", "description": "Column holding dates"},
                        "value_column": {"type": "string", "description": "Numeric column to plot"},
                        "title": {"type": "string", "description": "Chart title"}
                    },
                    "required": ["date_column", "value_column"]
                }
            }),
            json!({
                "name": CATEGORICAL_TOOL,
                "description": "Create categorical charts (bar, pie, treemap). Values are summed per category first. Chart types: 'bar', 'pie', 'treemap'.",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "category_column": {"type": "string"},
                        "value_column": {"type": "string", "description": "Numeric column summed per category"},
                        "chart_type": {"type": "string", "enum": ["bar", "pie", "treemap"]}
                    },
                    "required": ["category_column", "value_column"]
                }
            }),
            json!({
                "name": SCATTER_TOOL,
                "description": "Create an interactive scatter plot to show relationships between variables.",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "x_column": {"type": "string"},
                        "y_column": {"type": "string"},
                        "color_column": {"type": "string", "description": "Optional column used to colour points"},
                        "title": {"type": "string"}
                    },
                    "required": ["x_column", "y_column"]
                }
            }),
            json!({
                "name": DESCRIBE_TOOL,
                "description": "Summary statistics for every column plus pairwise correlations of numeric columns.",
                "input_schema": {"type": "object", "properties": {}}
            }),
            json!({
                "name": QUERY_TOOL,
                "description": "Run a read-only query on the dataset: filters, then optional group_by with aggregates, then sort and limit. Returns JSON rows.",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "columns": {"type": "array", "items": {"type": "string"}},
                        "filters": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "column": {"type": "string"},
                                    "operator": {"type": "string", "enum": ["==", "!=", ">", "<", ">=", "<="]},
                                    "value": {}
                                },
                                "required": ["column", "operator", "value"]
                            }
                        },
                        "group_by": {"type": "string"},
                        "aggregates": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "column": {"type": "string"},
                                    "function": {"type": "string", "enum": ["sum", "mean", "median", "count", "min", "max"]}
                                },
                                "required": ["column", "function"]
                            }
                        },
                        "sort_by": {"type": "string"},
                        "descending": {"type": "boolean"},
                        "limit": {"type": "integer"}
                    }
                }
            }),
        ]
    }

    /// Run one tool call; failures are reported back to the model, not raised
    pub fn dispatch(&self, name: &str, input: &Value) -> ToolOutcome {
        info!("🛠️ Tool call: {} {}", name, input);
        let outcome = match name {
            TIME_SERIES_TOOL => parse::<TimeSeriesArgs>(input).map(|args| {
                self.chart(ChartRequest::TimeSeries {
                    date_column: args.date_column,
                    value_column: args.value_column,
                    title: args.title,
                })
            }),
            CATEGORICAL_TOOL => parse::<CategoricalArgs>(input).map(|args| {
                self.chart(ChartRequest::Categorical {
                    category_column: args.category_column,
                    value_column: args.value_column,
                    kind: args
                        .chart_type
                        .as_deref()
                        .map(CategoricalKind::parse_lenient)
                        .unwrap_or_default(),
                })
            }),
            SCATTER_TOOL => parse::<ScatterArgs>(input).map(|args| {
                self.chart(ChartRequest::Scatter {
                    x_column: args.x_column,
                    y_column: args.y_column,
                    color_column: args.color_column.filter(|c| !c.trim().is_empty()),
                    title: args.title,
                })
            }),
            DESCRIBE_TOOL => Ok(self.describe()),
            QUERY_TOOL => parse::<DataQuery>(input).map(|query| self.query(&query)),
            other => Err(format!("Unknown tool '{}'", other)),
        };

        outcome.unwrap_or_else(|reason| {
            warn!("⚠️ Tool {} rejected: {}", name, reason);
            ToolOutcome::error(reason)
        })
    }

    pub fn chart(&self, request: ChartRequest) -> ToolOutcome {
        let result = self
            .templates
            .build(&self.dataset, &request, &Local::now())
            .and_then(|spec| self.renderer.render(&spec).map(|path| (spec, path)));

        match result {
            Ok((spec, path)) => ToolOutcome {
                content: format!(
                    "✨ {} chart '{}' created and saved to: {}",
                    spec.kind,
                    spec.title,
                    path.display()
                ),
                is_error: false,
                chart: Some(path),
            },
            Err(e) => ToolOutcome::error(format!("Chart failed: {}", e)),
        }
    }

    fn describe(&self) -> ToolOutcome {
        match profile_dataset(&self.dataset).and_then(|p| Ok(serde_json::to_string(&p)?)) {
            Ok(json) => ToolOutcome::ok(json),
            Err(e) => ToolOutcome::error(format!("Could not profile dataset: {}", e)),
        }
    }

    fn query(&self, query: &DataQuery) -> ToolOutcome {
        let result = query
            .execute(self.dataset.frame())
            .and_then(|frame| Ok((frame.height(), frame_to_json(&frame)?)));
        match result {
            Ok((row_count, rows)) => {
                ToolOutcome::ok(json!({ "row_count": row_count, "rows": rows }).to_string())
            }
            Err(e) => ToolOutcome::error(format!("Query failed: {}", e)),
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(input: &Value) -> Result<T, String> {
    serde_json::from_value(input.clone()).map_err(|e| format!("Invalid arguments: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::render::HtmlChartRenderer;
    use polars::prelude::*;

    fn toolbox(dir: &std::path::Path) -> Toolbox {
        let frame = df!(
            "date" => &["2024-01-01", "2024-01-02", "2024-01-03"],
            "category" => &["Books", "Games", "Books"],
            "amount" => &[10.0, 5.0, 2.5]
        )
        .unwrap();
        Toolbox::new(
            Arc::new(Dataset::new("sales.csv", frame)),
            ChartTemplates::new(dir),
            Arc::new(HtmlChartRenderer),
        )
    }

    #[test]
    fn definitions_cover_every_tool() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = toolbox(dir.path())
            .definitions()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            [TIME_SERIES_TOOL, CATEGORICAL_TOOL, SCATTER_TOOL, DESCRIBE_TOOL, QUERY_TOOL]
        );
    }

    #[test]
    fn categorical_tool_writes_chart() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = toolbox(dir.path()).dispatch(
            CATEGORICAL_TOOL,
            &json!({"category_column": "category", "value_column": "amount", "chart_type": "donut"}),
        );
        assert!(!outcome.is_error, "{}", outcome.content);
        let chart = outcome.chart.unwrap();
        let name = chart.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("bar_category_"));
        assert!(chart.exists());
    }

    #[test]
    fn bad_arguments_come_back_as_errors() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = toolbox(dir.path()).dispatch(SCATTER_TOOL, &json!({"x_column": 3}));
        assert!(outcome.is_error);
        assert!(outcome.content.starts_with("Invalid arguments"));
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = toolbox(dir.path()).dispatch("python_repl", &json!({}));
        assert!(outcome.is_error);
    }

    #[test]
    fn query_tool_returns_rows() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = toolbox(dir.path()).dispatch(
            QUERY_TOOL,
            &json!({"group_by": "category", "aggregates": [{"column": "amount", "function": "sum"}]}),
        );
        let parsed: Value = serde_json::from_str(&outcome.content).unwrap();
        assert_eq!(parsed["row_count"], 2);
    }

    #[test]
    fn describe_tool_reports_shape() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = toolbox(dir.path()).dispatch(DESCRIBE_TOOL, &json!({}));
        let parsed: Value = serde_json::from_str(&outcome.content).unwrap();
        assert_eq!(parsed["data_summary"]["row_count"], 3);
    }
}
