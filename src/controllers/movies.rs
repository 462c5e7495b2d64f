use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::PosResult;
use crate::models::movie::{Movie, MovieForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/{id}",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
}

async fn list_movies(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(Movie::list(&state.db).await?))
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Movie::get(&state.db, id).await?))
}

async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(form): Json<MovieForm>,
) -> PosResult<impl IntoResponse> {
    let created = Movie::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<MovieForm>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Movie::update(&state.db, id, form).await?))
}

async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<StatusCode> {
    Movie::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
