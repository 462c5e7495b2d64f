use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::PosResult;
use crate::models::customer::{Customer, CustomerForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

async fn list_customers(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(Customer::list(&state.db).await?))
}

async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Customer::get(&state.db, id).await?))
}

async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CustomerForm>,
) -> PosResult<impl IntoResponse> {
    let created = Customer::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<CustomerForm>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Customer::update(&state.db, id, form).await?))
}

async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<StatusCode> {
    Customer::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
