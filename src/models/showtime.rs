use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use tracing::info;

use super::{delete_row, ensure_exists, Money};
use crate::database::{next_id, settle, Database, Sequence};
use crate::error::{PosError, PosResult};
use crate::services::display::deserialize_instant;

const COLUMNS: &str = "id, starts_at, ends_at, price, movie_id, room_id";

/// A scheduled screening of a movie in a room.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Showtime {
    pub id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub price: Money,
    pub movie_id: i64,
    pub room_id: i64,
}

/// Catalog row: the showtime plus its movie title.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShowtimeListing {
    pub id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub price: Money,
    pub movie_id: i64,
    pub room_id: i64,
    pub movie_title: Option<String>,
}

/// Times without an offset are read as UTC.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowtimeForm {
    #[serde(deserialize_with = "deserialize_instant")]
    pub starts_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    pub ends_at: DateTime<Utc>,
    pub price: Money,
    pub movie_id: i64,
    pub room_id: i64,
}

impl ShowtimeForm {
    fn check(&self) -> PosResult<()> {
        if self.starts_at >= self.ends_at {
            return Err(PosError::validation("start time must be before end time"));
        }
        if !self.price.is_positive() {
            return Err(PosError::validation("price must be greater than zero"));
        }
        if Money::try_from_decimal(self.price.as_decimal()).is_none() {
            return Err(PosError::validation("price cannot have more than two decimals"));
        }
        Ok(())
    }
}

impl Showtime {
    /// Newest screenings first.
    pub async fn list(db: &Database) -> PosResult<Vec<ShowtimeListing>> {
        Ok(sqlx::query_as::<_, ShowtimeListing>(
            "SELECT s.id, s.starts_at, s.ends_at, s.price, s.movie_id, s.room_id,
                    m.title AS movie_title
             FROM showtimes s
             LEFT JOIN movies m ON m.id = s.movie_id
             ORDER BY s.starts_at DESC",
        )
        .fetch_all(&db.pool)
        .await?)
    }

    pub async fn get(db: &Database, id: i64) -> PosResult<Showtime> {
        Self::find(&mut *db.pool.acquire().await?, id).await
    }

    pub(crate) async fn find(conn: &mut PgConnection, id: i64) -> PosResult<Showtime> {
        let query = format!("SELECT {COLUMNS} FROM showtimes WHERE id = $1");
        sqlx::query_as::<_, Showtime>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(PosError::NotFound { entity: "showtime", id })
    }

    pub async fn create(db: &Database, form: ShowtimeForm) -> PosResult<Showtime> {
        form.check()?;
        let mut tx = db.begin().await?;
        let result = Self::insert(&mut *tx, &form).await;
        let showtime = settle(tx, result, "showtime").await?;
        info!(
            showtime_id = showtime.id,
            movie_id = showtime.movie_id,
            starts_at = %showtime.starts_at,
            "Showtime scheduled"
        );
        Ok(showtime)
    }

    pub async fn update(db: &Database, id: i64, form: ShowtimeForm) -> PosResult<Showtime> {
        form.check()?;
        let mut tx = db.begin().await?;
        let result = Self::write(&mut *tx, id, &form).await;
        settle(tx, result, "showtime").await
    }

    pub async fn delete(db: &Database, id: i64) -> PosResult<()> {
        delete_row(db, "showtimes", "showtime", id).await
    }

    async fn check_references(conn: &mut PgConnection, form: &ShowtimeForm) -> PosResult<()> {
        ensure_exists(conn, "movies", "movie", form.movie_id).await?;
        ensure_exists(conn, "rooms", "room", form.room_id).await
    }

    async fn insert(conn: &mut PgConnection, form: &ShowtimeForm) -> PosResult<Showtime> {
        Self::check_references(conn, form).await?;
        let id = next_id(conn, Sequence::Showtime).await?;
        let query = format!(
            "INSERT INTO showtimes ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Showtime>(&query)
            .bind(id)
            .bind(form.starts_at)
            .bind(form.ends_at)
            .bind(form.price)
            .bind(form.movie_id)
            .bind(form.room_id)
            .fetch_one(conn)
            .await?)
    }

    async fn write(conn: &mut PgConnection, id: i64, form: &ShowtimeForm) -> PosResult<Showtime> {
        Self::check_references(conn, form).await?;
        let query = format!(
            "UPDATE showtimes SET starts_at = $2, ends_at = $3, price = $4, movie_id = $5, room_id = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Showtime>(&query)
            .bind(id)
            .bind(form.starts_at)
            .bind(form.ends_at)
            .bind(form.price)
            .bind(form.movie_id)
            .bind(form.room_id)
            .fetch_optional(conn)
            .await?
            .ok_or(PosError::NotFound { entity: "showtime", id })
    }
}
