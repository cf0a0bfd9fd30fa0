pub mod charts;
pub mod conversation;
pub mod dashboard;
pub mod session;
pub mod upload;

use actix_web::{http::StatusCode, web, HttpResponse};
use log::error;
use uuid::Uuid;

use crate::error::LoadError;
use crate::models::response::ErrorResponse;
use crate::services::session::{SessionStore, SharedSession};

pub use charts::*;
pub use conversation::*;
pub use dashboard::*;
pub use session::*;
pub use upload::*;

/// Every dashboard route
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/charts/{filename}", web::get().to(serve_chart))
        .route("/api/quick-actions", web::get().to(list_quick_actions))
        .route("/api/sessions", web::post().to(create_session))
        .route("/api/sessions/{id}", web::get().to(get_session))
        .route("/api/sessions/{id}", web::delete().to(delete_session))
        .route("/api/sessions/{id}/data", web::delete().to(reset_session))
        .route("/api/sessions/{id}/upload", web::post().to(upload_file))
        .route("/api/sessions/{id}/sample", web::post().to(load_sample))
        .route("/api/sessions/{id}/ask", web::post().to(ask))
        .route(
            "/api/sessions/{id}/initial-analysis",
            web::post().to(initial_analysis),
        )
        .route(
            "/api/sessions/{id}/quick-actions/{index}",
            web::post().to(quick_action),
        );
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: message.into(),
        status_code: status.as_u16(),
    })
}

/// Look a session up, or produce the response explaining why not
pub(crate) fn find_session(store: &SessionStore, id: &Uuid) -> Result<SharedSession, HttpResponse> {
    match store.get(id) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", id),
        )),
        Err(e) => {
            error!("❌ Session store error: {}", e);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub(crate) fn load_error_response(err: &LoadError) -> HttpResponse {
    let status = match err {
        LoadError::UnsupportedFormat { .. } | LoadError::Parse { .. } => StatusCode::BAD_REQUEST,
        LoadError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, format!("❌ Error loading file: {}", err))
}
