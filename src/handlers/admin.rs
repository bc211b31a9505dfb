use actix_web::{HttpRequest, HttpResponse, http::header, web};
use log::{info, warn};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::{CurrexError, Result};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRateRequest {
    pub text: String,
}

/// POST /api/admin/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let response = state.auth.login(&body.password).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/admin/logout
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    state.auth.logout().await;
    HttpResponse::NoContent().finish()
}

/// POST /api/admin/rates
///
/// Requires a bearer token the backend accepts. The message text is parsed
/// into a rate which then becomes current.
pub async fn submit_rate(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<SubmitRateRequest>,
) -> Result<HttpResponse> {
    let token = bearer_token(&req)
        .ok_or_else(|| CurrexError::Auth("missing admin token".to_string()))?;
    if !state.auth.verify_token(token).await {
        warn!("Rejected rate submission with an invalid admin token");
        return Err(CurrexError::Auth("invalid admin token".to_string()));
    }

    let draft = state.parser.parse(&body.text).await?;
    let rate = state.publish_rate(draft).await?;
    info!("Admin submitted rate {}", rate.id);

    Ok(HttpResponse::Created().json(rate))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
