use actix_web::{http::StatusCode, web, Error, HttpResponse};
use log::warn;

use crate::config::Config;
use crate::handlers::error_response;

/// Serve a chart artifact from the output directory
pub async fn serve_chart(
    path: web::Path<String>,
    config: web::Data<Config>,
) -> Result<HttpResponse, Error> {
    let filename = path.into_inner();
    if !is_chart_filename(&filename) {
        warn!("⚠️ Rejected chart request for '{}'", filename);
        return Ok(error_response(StatusCode::BAD_REQUEST, "Invalid chart name"));
    }

    match tokio::fs::read(config.chart_output_dir.join(&filename)).await {
        Ok(html) => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html)),
        Err(_) => Ok(error_response(
            StatusCode::NOT_FOUND,
            format!("Chart {} not found", filename),
        )),
    }
}

fn is_chart_filename(name: &str) -> bool {
    name.ends_with(".html")
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}
