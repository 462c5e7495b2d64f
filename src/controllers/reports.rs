use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::PosResult;
use crate::services::reports;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports/tickets", get(tickets))
        .route("/reports/payments", get(payments))
        .route("/reports/daily", get(daily))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<NaiveDate>,
}

async fn tickets(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(reports::ticket_ledger(&state.db).await?))
}

async fn payments(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(reports::payment_ledger(&state.db).await?))
}

async fn daily(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DailyQuery>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(reports::daily_sales(&state.db, params.date).await?))
}
