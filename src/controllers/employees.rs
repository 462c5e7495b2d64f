use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::PosResult;
use crate::models::employee::{Employee, EmployeeForm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

async fn list_employees(State(state): State<Arc<AppState>>) -> PosResult<impl IntoResponse> {
    Ok(Json(Employee::list(&state.db).await?))
}

async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Employee::get(&state.db, id).await?))
}

async fn create_employee(
    State(state): State<Arc<AppState>>,
    Json(form): Json<EmployeeForm>,
) -> PosResult<impl IntoResponse> {
    let created = Employee::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<EmployeeForm>,
) -> PosResult<impl IntoResponse> {
    Ok(Json(Employee::update(&state.db, id, form).await?))
}

async fn delete_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> PosResult<StatusCode> {
    Employee::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
