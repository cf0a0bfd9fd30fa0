use actix_multipart::Multipart;
use actix_web::{http::StatusCode, web, Error, HttpResponse};
use futures::StreamExt;
use log::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::handlers::{error_response, find_session, load_error_response};
use crate::models::response::LoadResponse;
use crate::services::session::SessionStore;

/// Load an uploaded CSV or Excel file into the session
pub async fn upload_file(
    path: web::Path<Uuid>,
    mut payload: Multipart,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let shared = match find_session(&store, &id) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };

    let mut file_content = Vec::new();
    let mut filename = String::new();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let content_disposition = field.content_disposition();

        if content_disposition.get_name() == Some("file") {
            if let Some(fname) = content_disposition.get_filename() {
                filename = fname.to_string();
            }
            while let Some(chunk) = field.next().await {
                file_content.extend_from_slice(&chunk?);
            }
        }
    }

    if file_content.is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "No file uploaded"));
    }

    info!("📤 Received {} ({} bytes) for session {}", filename, file_content.len(), id);
    let mut session = shared.lock().await;
    match session.load_bytes(file_content, &filename) {
        Ok(summary) => Ok(HttpResponse::Ok().json(LoadResponse {
            message: format!(
                "✅ Data loaded! {} rows, {} columns",
                summary.row_count, summary.column_count
            ),
            dataset: summary,
        })),
        Err(e) => {
            error!("❌ Upload for session {} rejected: {}", id, e);
            Ok(load_error_response(&e))
        }
    }
}

/// Load the bundled sample sales data
pub async fn load_sample(
    path: web::Path<Uuid>,
    store: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let shared = match find_session(&store, &id) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };

    let mut session = shared.lock().await;
    match session.load(&config.sample_data_path) {
        Ok(summary) => Ok(HttpResponse::Ok().json(LoadResponse {
            message: "✅ Sample data loaded!".to_string(),
            dataset: summary,
        })),
        Err(e) => {
            error!("❌ Error loading sample data: {}", e);
            Ok(load_error_response(&e))
        }
    }
}
