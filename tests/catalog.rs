//! Catalog maintenance: validation, references and credentials.

mod common;

use chrono::Duration;
use common::{count, create_room, create_seat, schedule, seed_theater, EMPLOYEE_PASSWORD};
use sqlx::PgPool;

use cinema_pos::database::Database;
use cinema_pos::error::PosError;
use cinema_pos::models::employee::EmployeeForm;
use cinema_pos::models::movie::MovieForm;
use cinema_pos::models::seat::SeatForm;
use cinema_pos::models::{Employee, Movie, Room, Seat, Showtime};

fn movie_form(title: &str, duration_min: i32) -> MovieForm {
    MovieForm {
        title: title.into(),
        synopsis: Some("  ".into()),
        duration_min,
        language: None,
        rating: None,
        release_date: None,
    }
}

#[sqlx::test(migrations = "./src/migrations")]
async fn unreferenced_rows_can_be_deleted(pool: PgPool) {
    let db = Database::from_pool(pool.clone());
    let room = create_room(&db, "Sala VIP").await;
    let seat = create_seat(&db, room.id, "C", 4, None).await;

    Seat::delete(&db, seat.id).await.unwrap();
    Room::delete(&db, room.id).await.unwrap();

    assert!(matches!(
        Room::get(&db, room.id).await,
        Err(PosError::NotFound { entity: "room", .. })
    ));
    assert_eq!(count(&pool, "rooms").await, 0);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn referenced_rows_are_kept(pool: PgPool) {
    let db = Database::from_pool(pool.clone());
    let t = seed_theater(&db).await;

    let err = Room::delete(&db, t.room_id).await.unwrap_err();
    assert!(matches!(err, PosError::InUse(_)));
    let err = Movie::delete(&db, t.movie_id).await.unwrap_err();
    assert!(matches!(err, PosError::InUse(_)));

    assert_eq!(Room::get(&db, t.room_id).await.unwrap().name, "Sala 1");
    assert_eq!(count(&pool, "seats").await, 4);
    assert_eq!(count(&pool, "showtimes").await, 2);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn deleting_a_missing_row_is_not_found(pool: PgPool) {
    let db = Database::from_pool(pool);
    assert!(matches!(
        Showtime::delete(&db, 77).await,
        Err(PosError::NotFound { entity: "showtime", id: 77 })
    ));
}

#[sqlx::test(migrations = "./src/migrations")]
async fn movie_forms_are_trimmed_and_validated(pool: PgPool) {
    let db = Database::from_pool(pool.clone());

    let movie = Movie::create(&db, movie_form("  Roma ", 135)).await.unwrap();
    assert_eq!(movie.title, "Roma");
    assert_eq!(movie.synopsis, None);

    let err = Movie::create(&db, movie_form("   ", 90)).await.unwrap_err();
    assert!(matches!(err, PosError::Validation(ref m) if m == "title is required"));

    let err = Movie::update(&db, movie.id, movie_form("Roma", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, PosError::Validation(_)));
    assert_eq!(Movie::get(&db, movie.id).await.unwrap().duration_min, 135);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn seats_and_showtimes_need_existing_references(pool: PgPool) {
    let db = Database::from_pool(pool.clone());
    let t = seed_theater(&db).await;

    let err = Seat::create(
        &db,
        SeatForm {
            row_label: Some("Z".into()),
            number: 1,
            seat_type: None,
            room_id: 404,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PosError::NotFound { entity: "room", id: 404 }));

    let showtime = schedule(&db, t.movie_id, t.small_room_id, Duration::days(5)).await;
    assert_eq!(showtime.room_id, t.small_room_id);
    assert_eq!(count(&pool, "showtimes").await, 3);

    let listing = Showtime::list(&db).await.unwrap();
    assert_eq!(listing[0].id, showtime.id);
    assert_eq!(listing[0].movie_title.as_deref(), Some("El Laberinto"));
}

#[sqlx::test(migrations = "./src/migrations")]
async fn blank_password_keeps_the_stored_credential(pool: PgPool) {
    let db = Database::from_pool(pool);
    let t = seed_theater(&db).await;

    let updated = Employee::update(
        &db,
        t.employee_id,
        EmployeeForm {
            username: "mgarcia".into(),
            password: Some("   ".into()),
            name: "María José".into(),
            surname: "García".into(),
            role: "supervisor".into(),
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.role, "supervisor");
    assert!(bcrypt::verify(EMPLOYEE_PASSWORD, &updated.password_hash).unwrap());

    let changed = Employee::update(
        &db,
        t.employee_id,
        EmployeeForm {
            username: "mgarcia".into(),
            password: Some("nueva-clave".into()),
            name: "María José".into(),
            surname: "García".into(),
            role: "supervisor".into(),
        },
    )
    .await
    .unwrap();
    assert!(bcrypt::verify("nueva-clave", &changed.password_hash).unwrap());
    assert!(!bcrypt::verify(EMPLOYEE_PASSWORD, &changed.password_hash).unwrap());
}

#[sqlx::test(migrations = "./src/migrations")]
async fn employees_need_a_password_and_a_unique_username(pool: PgPool) {
    let db = Database::from_pool(pool);
    seed_theater(&db).await;

    let form = |password: Option<&str>| EmployeeForm {
        username: "mgarcia".into(),
        password: password.map(str::to_string),
        name: "Otra".into(),
        surname: "Persona".into(),
        role: "cashier".into(),
    };

    let err = Employee::create(&db, form(None)).await.unwrap_err();
    assert!(matches!(err, PosError::Validation(_)));

    let err = Employee::create(&db, form(Some("secreto"))).await.unwrap_err();
    assert!(matches!(err, PosError::Duplicate(_)));
}
