use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::Result;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub session_key: String,
    pub since: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub session_key: String,
    pub text: String,
}

/// POST /api/chat/session
pub async fn session(
    state: web::Data<AppState>,
    body: web::Json<SessionRequest>,
) -> Result<HttpResponse> {
    let session_key = state.chat.ensure_session(body.session_key.as_deref()).await?;
    Ok(HttpResponse::Ok().json(SessionRequest {
        session_key: Some(session_key),
    }))
}

/// GET /api/chat/messages
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<MessagesQuery>,
) -> Result<HttpResponse> {
    let messages = state
        .chat
        .list_messages(&query.session_key, query.since.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /api/chat/messages
pub async fn send(state: web::Data<AppState>, body: web::Json<SendRequest>) -> Result<HttpResponse> {
    let text = body.text.trim();
    if text.is_empty() {
        return Ok(HttpResponse::BadRequest().finish());
    }

    if state.chat.send_message(&body.session_key, text).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(HttpResponse::BadGateway().finish())
    }
}
