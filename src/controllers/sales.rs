use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::PosResult;
use crate::models::PaymentMethod;
use crate::services::sale::SaleRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sales", post(sell))
        .route("/sales/showtimes", get(on_sale_showtimes))
        .route("/sales/showtimes/{id}/seats", get(available_seats))
        .route("/sales/quote", post(quote))
        .route("/sales/payment-methods", get(payment_methods))
        .route("/sales/{payment_id}", get(receipt))
}

#[derive(Debug, Deserialize)]
pub struct SeatQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub showtime_id: i64,
    #[serde(default)]
    pub seat_ids: Vec<i64>,
}

async fn on_sale_showtimes(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(state.sales.on_sale_showtimes().await?))
}

async fn available_seats(
    State(state): State<Arc<AppState>>,
    Path(showtime_id): Path<i64>,
    Query(params): Query<SeatQuery>,
) -> PosResult<impl IntoResponse> {
    let seats = state
        .sales
        .available_seats(showtime_id, params.filter.as_deref())
        .await?;
    Ok(Json(seats))
}

// Recomputed on every selection change, nothing is written
async fn quote(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteRequest>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(
        state.sales.quote(request.showtime_id, &request.seat_ids).await?,
    ))
}

async fn sell(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaleRequest>,
) -> PosResult<impl IntoResponse> {
    let receipt = state.sales.sell(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn receipt(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<i64>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(state.sales.receipt(payment_id).await?))
}

async fn payment_methods() -> Json<[PaymentMethod; 4]> {
    Json(PaymentMethod::ALL)
}
