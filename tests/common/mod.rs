//! Shared fixtures for the integration tests.
//!
//! Every test gets a fresh database from `#[sqlx::test]`; the helpers here
//! seed a small theater on top of it through the public model API.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use cinema_pos::config::Config;
use cinema_pos::database::Database;
use cinema_pos::models::customer::CustomerForm;
use cinema_pos::models::employee::EmployeeForm;
use cinema_pos::models::movie::MovieForm;
use cinema_pos::models::room::RoomForm;
use cinema_pos::models::seat::SeatForm;
use cinema_pos::models::showtime::ShowtimeForm;
use cinema_pos::models::{Customer, Employee, Money, Movie, Room, Seat, Showtime};
use cinema_pos::AppState;

pub const EMPLOYEE_PASSWORD: &str = "taquilla-1";

/// Configuration with the defaults used in production; the url is never
/// dialed because the pool comes from `#[sqlx::test]`.
pub fn test_config() -> Config {
    Config::from_vars(|key| match key {
        "DATABASE_URL" => Some("postgres://cine@localhost/cine_test".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_state(pool: PgPool) -> Arc<AppState> {
    AppState::from_database(Database::from_pool(pool), test_config())
}

pub fn build_test_app(pool: PgPool) -> Router {
    cinema_pos::app(test_state(pool))
}

/// A room with three seats and a showtime tomorrow at 80.00.
///
/// `lone_seat` sits in a second room with its own showtime, so it can be
/// used both for "wrong room" and "sold out" cases.
pub struct Theater {
    pub employee_id: i64,
    pub customer_id: i64,
    pub movie_id: i64,
    pub room_id: i64,
    pub showtime_id: i64,
    pub seat_a: i64,
    pub seat_b: i64,
    pub seat_vip: i64,
    pub small_room_id: i64,
    pub small_showtime_id: i64,
    pub lone_seat: i64,
}

pub async fn seed_theater(db: &Database) -> Theater {
    let movie = Movie::create(
        db,
        MovieForm {
            title: "El Laberinto".into(),
            synopsis: None,
            duration_min: 118,
            language: Some("es".into()),
            rating: Some("B15".into()),
            release_date: None,
        },
    )
    .await
    .unwrap();

    let room = create_room(db, "Sala 1").await;
    let seat_a = create_seat(db, room.id, "A", 1, None).await;
    let seat_b = create_seat(db, room.id, "A", 2, None).await;
    let seat_vip = create_seat(db, room.id, "B", 1, Some("VIP")).await;
    let showtime = schedule(db, movie.id, room.id, Duration::days(1)).await;

    let small_room = create_room(db, "Sala 2").await;
    let lone_seat = create_seat(db, small_room.id, "A", 1, None).await;
    let small_showtime = schedule(db, movie.id, small_room.id, Duration::days(2)).await;

    let employee = Employee::create(
        db,
        EmployeeForm {
            username: "mgarcia".into(),
            password: Some(EMPLOYEE_PASSWORD.into()),
            name: "María".into(),
            surname: "García".into(),
            role: "cashier".into(),
        },
    )
    .await
    .unwrap();

    let customer = Customer::create(
        db,
        CustomerForm {
            name: "Luis".into(),
            surname: "Pérez".into(),
            email: "luis@example.com".into(),
            phone: Some("5512345678".into()),
        },
    )
    .await
    .unwrap();

    Theater {
        employee_id: employee.id,
        customer_id: customer.id,
        movie_id: movie.id,
        room_id: room.id,
        showtime_id: showtime.id,
        seat_a: seat_a.id,
        seat_b: seat_b.id,
        seat_vip: seat_vip.id,
        small_room_id: small_room.id,
        small_showtime_id: small_showtime.id,
        lone_seat: lone_seat.id,
    }
}

pub async fn create_room(db: &Database, name: &str) -> Room {
    Room::create(
        db,
        RoomForm {
            name: name.into(),
            location: None,
        },
    )
    .await
    .unwrap()
}

pub async fn create_seat(
    db: &Database,
    room_id: i64,
    row: &str,
    number: i32,
    seat_type: Option<&str>,
) -> Seat {
    Seat::create(
        db,
        SeatForm {
            row_label: Some(row.into()),
            number,
            seat_type: seat_type.map(str::to_string),
            room_id,
        },
    )
    .await
    .unwrap()
}

/// Schedules a two hour screening `offset` from now at 80.00.
pub async fn schedule(db: &Database, movie_id: i64, room_id: i64, offset: Duration) -> Showtime {
    let starts_at = Utc::now() + offset;
    Showtime::create(
        db,
        ShowtimeForm {
            starts_at,
            ends_at: starts_at + Duration::hours(2),
            price: Money::from_cents(8000),
            movie_id,
            room_id,
        },
    )
    .await
    .unwrap()
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
