pub mod customers;
pub mod employees;
pub mod movies;
pub mod reports;
pub mod rooms;
pub mod sales;
pub mod seats;
pub mod showtimes;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(movies::routes())
        .merge(rooms::routes())
        .merge(seats::routes())
        .merge(showtimes::routes())
        .merge(customers::routes())
        .merge(employees::routes())
        .merge(sales::routes())
        .merge(reports::routes())
}
