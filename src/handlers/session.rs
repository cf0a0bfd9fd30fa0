use actix_web::{http::StatusCode, web, Error, HttpResponse};
use log::{error, info};
use uuid::Uuid;

use crate::handlers::{error_response, find_session};
use crate::models::response::{CreateSessionResponse, DataPreview, SessionSnapshot};
use crate::services::session::{Session, SessionStore};

const PREVIEW_ROWS: usize = 10;

/// Start a fresh session for a browser tab
pub async fn create_session(store: web::Data<SessionStore>) -> Result<HttpResponse, Error> {
    match store.create() {
        Ok((session_id, _)) => Ok(HttpResponse::Created().json(CreateSessionResponse { session_id })),
        Err(e) => {
            error!("❌ Failed to create session: {}", e);
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Session flags, data preview and the display history
pub async fn get_session(
    path: web::Path<Uuid>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let shared = match find_session(&store, &id) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };
    let session = shared.lock().await;

    match snapshot(&session) {
        Ok(snapshot) => Ok(HttpResponse::Ok().json(snapshot)),
        Err(e) => {
            error!("❌ Failed to build preview for {}: {}", id, e);
            Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Drop the loaded data and conversation, keeping the session
pub async fn reset_session(
    path: web::Path<Uuid>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let shared = match find_session(&store, &id) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };
    let mut session = shared.lock().await;
    session.reset();
    Ok(HttpResponse::Ok().json(session.info()))
}

pub async fn delete_session(
    path: web::Path<Uuid>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    match store.remove(&id) {
        Ok(true) => {
            info!("🗑️ Session {} removed", id);
            Ok(HttpResponse::NoContent().finish())
        }
        Ok(false) => Ok(error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", id),
        )),
        Err(e) => Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

fn snapshot(session: &Session) -> anyhow::Result<SessionSnapshot> {
    let dataset = session.dataset();
    let preview = match &dataset {
        Some(dataset) => {
            let (row_count, column_count) = dataset.shape();
            Some(DataPreview {
                row_count,
                column_count,
                memory_usage_mb: dataset.estimated_size_mb(),
                columns: dataset.columns().to_vec(),
                rows: dataset.head_json(PREVIEW_ROWS)?,
            })
        }
        None => None,
    };

    Ok(SessionSnapshot {
        session_id: session.id(),
        info: session.info(),
        filename: dataset.map(|d| d.filename().to_string()),
        preview,
        history: session.history().to_vec(),
    })
}
