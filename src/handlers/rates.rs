use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::calculator::{Direction, convert, is_oversized, parse_amount};
use crate::error::{CurrexError, Result};

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: Option<String>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub direction: Direction,
    pub from_currency: &'static str,
    pub to_currency: &'static str,
    pub from: String,
    pub to: String,
    /// THB per 100,000 MMK.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate_used: Decimal,
    pub rate_id: String,
}

/// GET /api/rates/latest
pub async fn latest(state: web::Data<AppState>) -> Result<HttpResponse> {
    let book = state.book.read().await;
    match &book.current {
        Some(rate) => Ok(HttpResponse::Ok().json(rate)),
        None => Err(CurrexError::NotFound("no current rate".to_string())),
    }
}

/// GET /api/rates/history
pub async fn history(state: web::Data<AppState>) -> HttpResponse {
    let entries = state.book.read().await.all_entries();
    HttpResponse::Ok().json(entries)
}

/// GET /api/rates/chart
pub async fn chart(state: web::Data<AppState>) -> HttpResponse {
    let points = state.book.read().await.chart_points();
    HttpResponse::Ok().json(points)
}

/// GET /api/convert?amount=..&direction=..
pub async fn convert_amount(
    state: web::Data<AppState>,
    query: web::Query<ConvertQuery>,
) -> Result<HttpResponse> {
    let direction = query.direction.unwrap_or_default();
    let raw_amount = query
        .amount
        .as_deref()
        .unwrap_or_else(|| direction.default_amount());
    if is_oversized(raw_amount) {
        return Err(CurrexError::Parse("amount is too large".to_string()));
    }
    let amount = parse_amount(raw_amount);

    let book = state.book.read().await;
    let rate = book
        .current
        .as_ref()
        .ok_or_else(|| CurrexError::NotFound("no current rate".to_string()))?;
    let result = convert(rate, direction, amount);

    Ok(HttpResponse::Ok().json(ConvertResponse {
        direction,
        from_currency: direction.from_currency(),
        to_currency: direction.to_currency(),
        from: result.from_display(),
        to: result.to_display(),
        rate_used: result.rate_used,
        rate_id: rate.id.clone(),
    }))
}
