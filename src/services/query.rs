use anyhow::{anyhow, Result};
use log::warn;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunction {
    Sum,
    Mean,
    Median,
    Count,
    Min,
    Max,
}

impl AggFunction {
    fn apply(&self, column: &str) -> Expr {
        let expr = col(column);
        let expr = match self {
            AggFunction::Sum => expr.sum(),
            AggFunction::Mean => expr.mean(),
            AggFunction::Median => expr.median(),
            AggFunction::Count => expr.count(),
            AggFunction::Min => expr.min(),
            AggFunction::Max => expr.max(),
        };
        expr.alias(&format!("{}_{}", self.name(), column))
    }

    fn name(&self) -> &'static str {
        match self {
            AggFunction::Sum => "sum",
            AggFunction::Mean => "mean",
            AggFunction::Median => "median",
            AggFunction::Count => "count",
            AggFunction::Min => "min",
            AggFunction::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    pub column: String,
    pub function: AggFunction,
}

/// Structured read-only query the agent can run against the dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataQuery {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    pub group_by: Option<String>,
    #[serde(default)]
    pub aggregates: Vec<Aggregate>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
    pub limit: Option<usize>,
}

impl DataQuery {
    /// Filter → group/aggregate → sort → limit
    pub fn execute(&self, df: &DataFrame) -> Result<DataFrame> {
        self.check_columns(df)?;
        let mut lazy = df.clone().lazy();

        for filter in &self.filters {
            lazy = lazy.filter(filter_expr(filter)?);
        }

        let aggregations: Vec<Expr> = self
            .aggregates
            .iter()
            .map(|agg| agg.function.apply(&agg.column))
            .collect();

        lazy = match (&self.group_by, aggregations.is_empty()) {
            (Some(group), false) => lazy.group_by_stable([col(group)]).agg(aggregations),
            (Some(group), true) => lazy
                .group_by_stable([col(group)])
                .agg([count().alias("count")]),
            (None, false) => lazy.select(aggregations),
            (None, true) if !self.columns.is_empty() => {
                lazy.select(self.columns.iter().map(|c| col(c)).collect::<Vec<_>>())
            }
            (None, true) => lazy,
        };

        if let Some(sort_by) = &self.sort_by {
            lazy = lazy.sort(
                sort_by,
                SortOptions {
                    descending: self.descending,
                    nulls_last: true,
                    ..Default::default()
                },
            );
        }

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        Ok(lazy.limit(limit as IdxSize).collect()?)
    }

    fn check_columns(&self, df: &DataFrame) -> Result<()> {
        let known = df.get_column_names();
        let referenced = self
            .columns
            .iter()
            .chain(self.filters.iter().map(|f| &f.column))
            .chain(self.group_by.iter())
            .chain(self.aggregates.iter().map(|a| &a.column));

        for name in referenced {
            if !known.contains(&name.as_str()) {
                return Err(anyhow!(
                    "Unknown column '{}'. Available columns: {}",
                    name,
                    known.join(", ")
                ));
            }
        }
        Ok(())
    }
}

fn filter_expr(filter: &Filter) -> Result<Expr> {
    let value = match &filter.value {
        Value::Number(n) => n
            .as_f64()
            .map(lit)
            .ok_or_else(|| anyhow!("Unsupported number {}", n))?,
        Value::Bool(b) => lit(*b),
        Value::String(s) => match (filter.operator.as_str(), s.trim().parse::<f64>()) {
            (">" | "<" | ">=" | "<=", Ok(num)) => lit(num),
            _ => lit(s.clone()),
        },
        other => return Err(anyhow!("Unsupported filter value {}", other)),
    };

    let column = col(&filter.column);
    let expr = match filter.operator.as_str() {
        "=" | "==" => column.eq(value),
        "!=" | "<>" => column.neq(value),
        ">" => column.gt(value),
        "<" => column.lt(value),
        ">=" => column.gt_eq(value),
        "<=" => column.lt_eq(value),
        other => {
            warn!("Unsupported operator: {}", other);
            return Err(anyhow!("Unsupported operator '{}'", other));
        }
    };
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame() -> DataFrame {
        df!(
            "category" => &["Books", "Games", "Books", "Music", "Games"],
            "amount" => &[10.0, 5.0, 2.5, 4.0, 20.0]
        )
        .unwrap()
    }

    fn query(value: Value) -> DataQuery {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn groups_and_sorts_totals() {
        let result = query(json!({
            "group_by": "category",
            "aggregates": [{"column": "amount", "function": "sum"}],
            "sort_by": "sum_amount",
            "descending": true
        }))
        .execute(&frame())
        .unwrap();

        let categories = result.column("category").unwrap().utf8().unwrap();
        assert_eq!(categories.get(0), Some("Games"));
        let totals = result.column("sum_amount").unwrap().f64().unwrap();
        assert_eq!(totals.get(0), Some(25.0));
    }

    #[test]
    fn filters_numeric_values_given_as_strings() {
        let result = query(json!({
            "filters": [{"column": "amount", "operator": ">", "value": "4.5"}]
        }))
        .execute(&frame())
        .unwrap();
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn limit_caps_rows() {
        let result = query(json!({"limit": 2})).execute(&frame()).unwrap();
        assert_eq!(result.height(), 2);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let err = query(json!({"columns": ["price"]})).execute(&frame()).unwrap_err();
        assert!(err.to_string().contains("Unknown column 'price'"));
    }

    #[test]
    fn unsupported_operator_is_an_error() {
        let result = query(json!({
            "filters": [{"column": "amount", "operator": "~", "value": 1}]
        }))
        .execute(&frame());
        assert!(result.is_err());
    }
}
