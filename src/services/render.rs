use log::info;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

use crate::error::ChartError;
use crate::models::chart::{ChartData, ChartKind, ChartSpec};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Turns a chart specification into a persisted artifact
pub trait ChartRenderer: Send + Sync {
    fn render(&self, spec: &ChartSpec) -> Result<PathBuf, ChartError>;
}

/// Writes a standalone interactive HTML page per chart
#[derive(Debug, Clone, Default)]
pub struct HtmlChartRenderer;

impl ChartRenderer for HtmlChartRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<PathBuf, ChartError> {
        if let Some(dir) = spec.output_path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&spec.output_path, html_document(spec))?;
        info!("📊 {} chart saved to: {}", spec.kind, spec.output_path.display());
        Ok(spec.output_path.clone())
    }
}

/// Plotly figure (`data` + `layout`) for a spec
pub fn figure(spec: &ChartSpec) -> Value {
    let data = match &spec.data {
        ChartData::Line { x, y } => {
            let x: Vec<String> = x
                .iter()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .collect();
            json!([{ "type": "scatter", "mode": "lines", "x": x, "y": y, "name": spec.y_label }])
        }
        ChartData::Categories { labels, values } => match spec.kind {
            ChartKind::Pie => json!([{ "type": "pie", "labels": labels, "values": values }]),
            ChartKind::Treemap => {
                let parents = vec![""; labels.len()];
                json!([{
                    "type": "treemap",
                    "labels": labels,
                    "parents": parents,
                    "values": values
                }])
            }
            _ => json!([{ "type": "bar", "x": labels, "y": values, "name": spec.y_label }]),
        },
        ChartData::Scatter { groups, .. } => Value::Array(
            groups
                .iter()
                .map(|group| {
                    json!({
                        "type": "scatter",
                        "mode": "markers",
                        "name": group.name.clone().unwrap_or_default(),
                        "showlegend": group.name.is_some(),
                        "x": group.x,
                        "y": group.y,
                        "text": group.hover,
                    })
                })
                .collect(),
        ),
    };

    let mut layout = json!({
        "title": { "text": spec.title },
        "xaxis": { "title": { "text": spec.x_label } },
        "yaxis": { "title": { "text": spec.y_label } },
    });
    match spec.kind {
        ChartKind::TimeSeries => layout["hovermode"] = json!("x unified"),
        ChartKind::Bar => layout["xaxis"]["tickangle"] = json!(-45),
        ChartKind::Pie | ChartKind::Treemap | ChartKind::Scatter => {}
    }

    json!({ "data": data, "layout": layout })
}

fn html_document(spec: &ChartSpec) -> String {
    let escaped_title = spec
        .title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    // `<` only occurs inside JSON strings, where \u003c is equivalent
    let figure = figure(spec).to_string().replace('<', "\\u003c");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:90vh;"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = escaped_title,
        cdn = PLOTLY_CDN,
        figure = figure,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chart::ScatterGroup;

    fn bar_spec(dir: &std::path::Path) -> ChartSpec {
        ChartSpec {
            kind: ChartKind::Bar,
            title: "Distribution by <category>".to_string(),
            x_label: "category".to_string(),
            y_label: "amount".to_string(),
            data: ChartData::Categories {
                labels: vec!["Books".to_string(), "Games".to_string()],
                values: vec![12.5, 5.0],
            },
            output_path: dir.join("nested").join("bar_category_20240517_090307.html"),
        }
    }

    #[test]
    fn writes_html_and_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = bar_spec(dir.path());
        let path = HtmlChartRenderer.render(&spec).unwrap();

        assert_eq!(path, spec.output_path);
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("Distribution by &lt;category&gt;"));
        assert!(!html.contains("<category>"));
    }

    #[test]
    fn bar_figure_tilts_labels() {
        let dir = tempfile::tempdir().unwrap();
        let figure = figure(&bar_spec(dir.path()));
        assert_eq!(figure["data"][0]["type"], "bar");
        assert_eq!(figure["layout"]["xaxis"]["tickangle"], -45);
    }

    #[test]
    fn uncoloured_scatter_hides_legend() {
        let spec = ChartSpec {
            kind: ChartKind::Scatter,
            title: "Units vs Amount".to_string(),
            x_label: "units".to_string(),
            y_label: "amount".to_string(),
            data: ChartData::Scatter {
                groups: vec![ScatterGroup {
                    name: None,
                    x: vec![1.0],
                    y: vec![2.0],
                    hover: vec!["category=Books".to_string()],
                }],
                hover_columns: vec!["category".to_string()],
            },
            output_path: PathBuf::from("scatter.html"),
        };
        let figure = figure(&spec);
        assert_eq!(figure["data"][0]["showlegend"], false);
        assert_eq!(figure["data"][0]["text"][0], "category=Books");
    }
}
