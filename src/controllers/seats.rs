use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::PosResult;
use crate::models::seat::{Seat, SeatForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(list_seats).post(create_seat))
        .route(
            "/seats/{id}",
            get(get_seat).put(update_seat).delete(delete_seat),
        )
}

async fn list_seats(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(Seat::list(&state.db).await?))
}

async fn get_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Seat::get(&state.db, id).await?))
}

async fn create_seat(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SeatForm>,
) -> PosResult<impl IntoResponse> {
    let created = Seat::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<SeatForm>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Seat::update(&state.db, id, form).await?))
}

async fn delete_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<StatusCode> {
    Seat::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
