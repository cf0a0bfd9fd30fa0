use actix_web::{http::StatusCode, web, Error, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::handlers::{error_response, find_session};
use crate::models::response::{chart_url, AskRequest, AskResponse, QuickActionResponse};
use crate::services::orchestrator::Reply;
use crate::services::prompts::QUICK_ACTIONS;
use crate::services::session::SessionStore;

fn answer(reply: Reply) -> AskResponse {
    AskResponse {
        answer: reply.text,
        charts: reply.charts.iter().filter_map(|p| chart_url(p)).collect(),
        failed: reply.failed,
    }
}

/// Ask Andy a question about the loaded data
pub async fn ask(
    path: web::Path<Uuid>,
    request: web::Json<AskRequest>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let question = request.into_inner().question;
    if question.trim().is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Question must not be empty"));
    }

    let shared = match find_session(&store, &id) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };
    let mut session = shared.lock().await;
    let reply = session.ask(question.trim()).await;
    Ok(HttpResponse::Ok().json(answer(reply)))
}

pub async fn initial_analysis(
    path: web::Path<Uuid>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let shared = match find_session(&store, &id) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };
    let mut session = shared.lock().await;
    match session.initial_analysis().await {
        Some(reply) => Ok(HttpResponse::Ok().json(answer(reply))),
        None => Ok(error_response(
            StatusCode::CONFLICT,
            "Initial analysis already done for this dataset",
        )),
    }
}

pub async fn quick_action(
    path: web::Path<(Uuid, usize)>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, Error> {
    let (id, index) = path.into_inner();
    let shared = match find_session(&store, &id) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };
    let mut session = shared.lock().await;
    info!("⚡ Quick action {} for session {}", index, id);
    match session.quick_action(index).await {
        Some(reply) => Ok(HttpResponse::Ok().json(answer(reply))),
        None => Ok(error_response(
            StatusCode::NOT_FOUND,
            format!("No quick action {}", index),
        )),
    }
}

pub async fn list_quick_actions() -> Result<HttpResponse, Error> {
    let actions: Vec<QuickActionResponse> = QUICK_ACTIONS
        .iter()
        .map(|(label, question)| QuickActionResponse {
            label: label.to_string(),
            question: question.to_string(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(actions))
}
