use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::PosResult;
use crate::models::room::{Room, RoomForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route(
            "/rooms/{id}",
            get(get_room).put(update_room).delete(delete_room),
        )
}

async fn list_rooms(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(Room::list(&state.db).await?))
}

async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Room::get(&state.db, id).await?))
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RoomForm>,
) -> PosResult<impl IntoResponse> {
    let created = Room::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<RoomForm>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Room::update(&state.db, id, form).await?))
}

async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<StatusCode> {
    Room::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
