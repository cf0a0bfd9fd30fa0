//! Chart tool-call templates.
//!
//! Each template resolves the columns it needs from the dataset and returns a
//! [`ChartSpec`]: the chart's data, labels and the HTML path it will be
//! written to. Rendering happens separately (see [`crate::services::render`]).

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ChartError;
use crate::models::chart::{
    CategoricalKind, ChartData, ChartKind, ChartRequest, ChartSpec, ScatterGroup,
};
use crate::models::dataset::{is_numeric, Dataset};

pub const MAX_LABEL_LEN: usize = 30;
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d", "%b %d, %Y",
];

/// Keep `[A-Za-z0-9 _-]`, turn spaces into underscores, cap at 30 characters
pub fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_LABEL_LEN)
        .collect()
}

/// `<dir>/<prefix>_<label>_<YYYYMMDD_HHMMSS>.html`, label omitted when empty
pub fn output_path(dir: &Path, kind: ChartKind, label: &str, now: &DateTime<Local>) -> PathBuf {
    let timestamp = now.format(TIMESTAMP_FORMAT);
    let clean = sanitize_label(label);
    let filename = if clean.is_empty() {
        format!("{}_{}.html", kind.prefix(), timestamp)
    } else {
        format!("{}_{}_{}.html", kind.prefix(), clean, timestamp)
    };
    dir.join(filename)
}

#[derive(Debug, Clone)]
pub struct ChartTemplates {
    output_dir: PathBuf,
}

impl ChartTemplates {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn build(
        &self,
        dataset: &Dataset,
        request: &ChartRequest,
        now: &DateTime<Local>,
    ) -> Result<ChartSpec, ChartError> {
        match request {
            ChartRequest::TimeSeries {
                date_column,
                value_column,
                title,
            } => self.time_series(dataset, date_column, value_column, title, now),
            ChartRequest::Categorical {
                category_column,
                value_column,
                kind,
            } => self.categorical(dataset, category_column, value_column, *kind, now),
            ChartRequest::Scatter {
                x_column,
                y_column,
                color_column,
                title,
            } => self.scatter(
                dataset,
                x_column,
                y_column,
                color_column.as_deref(),
                title,
                now,
            ),
        }
    }

    /// Line chart of `value_column` over `date_column`, sorted by time
    pub fn time_series(
        &self,
        dataset: &Dataset,
        date_column: &str,
        value_column: &str,
        title: &str,
        now: &DateTime<Local>,
    ) -> Result<ChartSpec, ChartError> {
        let dates = text_values(dataset, date_column)?;
        let values = numeric_values(dataset, value_column)?;

        let mut points = Vec::with_capacity(dates.len());
        for (date, value) in dates.into_iter().zip(values) {
            let (Some(date), Some(value)) = (date, value) else {
                continue;
            };
            let parsed = parse_temporal(&date).ok_or_else(|| ChartError::InvalidTemporal {
                column: date_column.to_string(),
                value: date.clone(),
            })?;
            points.push((parsed, value));
        }
        if points.is_empty() {
            return Err(ChartError::Empty(title.to_string()));
        }
        points.sort_by_key(|(date, _)| *date);
        let (x, y) = points.into_iter().unzip();

        Ok(ChartSpec {
            kind: ChartKind::TimeSeries,
            title: title.to_string(),
            x_label: "Date".to_string(),
            y_label: value_column.to_string(),
            data: ChartData::Line { x, y },
            output_path: output_path(&self.output_dir, ChartKind::TimeSeries, title, now),
        })
    }

    /// Sum of `value_column` per category, drawn as bar, pie or treemap
    pub fn categorical(
        &self,
        dataset: &Dataset,
        category_column: &str,
        value_column: &str,
        kind: CategoricalKind,
        now: &DateTime<Local>,
    ) -> Result<ChartSpec, ChartError> {
        require_column(dataset, category_column)?;
        require_numeric(dataset, value_column)?;

        let grouped = dataset
            .frame()
            .clone()
            .lazy()
            .group_by_stable([col(category_column)])
            .agg([col(value_column).cast(DataType::Float64).sum()])
            .collect()?;

        let labels_series = grouped.column(category_column)?.cast(&DataType::Utf8)?;
        let values_series = grouped.column(value_column)?.cast(&DataType::Float64)?;
        let mut labels = Vec::with_capacity(grouped.height());
        let mut values = Vec::with_capacity(grouped.height());
        for (label, value) in labels_series
            .utf8()?
            .into_iter()
            .zip(values_series.f64()?.into_iter())
        {
            // Null categories are dropped
            if let Some(label) = label {
                labels.push(label.to_string());
                values.push(value.unwrap_or(0.0));
            }
        }
        if labels.is_empty() {
            return Err(ChartError::Empty(category_column.to_string()));
        }

        let chart_kind = ChartKind::from(kind);
        let title = match kind {
            CategoricalKind::Treemap => format!("Treemap of {}", category_column),
            CategoricalKind::Bar | CategoricalKind::Pie => {
                format!("Distribution by {}", category_column)
            }
        };

        Ok(ChartSpec {
            kind: chart_kind,
            title,
            x_label: category_column.to_string(),
            y_label: value_column.to_string(),
            data: ChartData::Categories { labels, values },
            output_path: output_path(&self.output_dir, chart_kind, category_column, now),
        })
    }

    /// Scatter of two numeric columns, optionally split into one trace per colour value
    pub fn scatter(
        &self,
        dataset: &Dataset,
        x_column: &str,
        y_column: &str,
        color_column: Option<&str>,
        title: &str,
        now: &DateTime<Local>,
    ) -> Result<ChartSpec, ChartError> {
        let xs = numeric_values(dataset, x_column)?;
        let ys = numeric_values(dataset, y_column)?;
        let colors = match color_column {
            Some(column) => Some(text_values(dataset, column)?),
            None => None,
        };

        let hover_columns: Vec<String> = dataset
            .column_names()
            .into_iter()
            .filter(|name| name != x_column && name != y_column)
            .collect();
        let hover_values = hover_columns
            .iter()
            .map(|name| text_values(dataset, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: Vec<ScatterGroup> = Vec::new();
        let mut index_of: HashMap<Option<String>, usize> = HashMap::new();
        for row in 0..xs.len() {
            let (Some(x), Some(y)) = (xs[row], ys[row]) else {
                continue;
            };
            let key = colors.as_ref().map(|c| c[row].clone().unwrap_or_default());
            let idx = *index_of.entry(key.clone()).or_insert_with(|| {
                groups.push(ScatterGroup {
                    name: key,
                    x: Vec::new(),
                    y: Vec::new(),
                    hover: Vec::new(),
                });
                groups.len() - 1
            });

            let hover = hover_columns
                .iter()
                .zip(&hover_values)
                .map(|(name, values)| {
                    format!("{}={}", name, values[row].as_deref().unwrap_or(""))
                })
                .collect::<Vec<_>>()
                .join("<br>");

            let group = &mut groups[idx];
            group.x.push(x);
            group.y.push(y);
            group.hover.push(hover);
        }
        if groups.is_empty() {
            return Err(ChartError::Empty(title.to_string()));
        }

        Ok(ChartSpec {
            kind: ChartKind::Scatter,
            title: title.to_string(),
            x_label: x_column.to_string(),
            y_label: y_column.to_string(),
            data: ChartData::Scatter {
                groups,
                hover_columns,
            },
            output_path: output_path(&self.output_dir, ChartKind::Scatter, title, now),
        })
    }
}

fn require_column<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Series, ChartError> {
    dataset
        .frame()
        .column(name)
        .map_err(|_| ChartError::UnknownColumn(name.to_string()))
}

fn require_numeric<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Series, ChartError> {
    let series = require_column(dataset, name)?;
    if !is_numeric(series.dtype()) {
        return Err(ChartError::NotNumeric(name.to_string()));
    }
    Ok(series)
}

fn numeric_values(dataset: &Dataset, name: &str) -> Result<Vec<Option<f64>>, ChartError> {
    let series = require_numeric(dataset, name)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

fn text_values(dataset: &Dataset, name: &str) -> Result<Vec<Option<String>>, ChartError> {
    let series = require_column(dataset, name)?.cast(&DataType::Utf8)?;
    let values = series
        .utf8()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Coerce a cell to a timestamp, trying the common spreadsheet layouts
pub fn parse_temporal(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    // Year-month, e.g. "2024-03"
    NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
