use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::PosResult;
use crate::models::showtime::{Showtime, ShowtimeForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/showtimes", get(list_showtimes).post(create_showtime))
        .route(
            "/showtimes/{id}",
            get(get_showtime).put(update_showtime).delete(delete_showtime),
        )
}

async fn list_showtimes(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(Showtime::list(&state.db).await?))
}

async fn get_showtime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Showtime::get(&state.db, id).await?))
}

async fn create_showtime(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ShowtimeForm>,
) -> PosResult<impl IntoResponse> {
    let created = Showtime::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_showtime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<ShowtimeForm>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Showtime::update(&state.db, id, form).await?))
}

async fn delete_showtime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<StatusCode> {
    Showtime::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
