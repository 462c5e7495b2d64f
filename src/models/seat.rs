use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use tracing::info;
use validator::Validate;

use super::{blank_to_none, check_form, delete_row, ensure_exists};
use crate::database::{next_id, settle, Database, Sequence};
use crate::error::{PosError, PosResult};

pub const DEFAULT_SEAT_TYPE: &str = "normal";

const COLUMNS: &str = "id, row_label, number, seat_type, room_id";

#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Seat {
    pub id: i64,
    pub row_label: Option<String>,
    pub number: i32,
    pub seat_type: Option<String>,
    pub room_id: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeatForm {
    pub row_label: Option<String>,
    #[validate(range(min = 1, max = 999, message = "seat number must be between 1 and 999"))]
    pub number: i32,
    pub seat_type: Option<String>,
    pub room_id: i64,
}

impl SeatForm {
    fn tidy(mut self) -> PosResult<Self> {
        self.row_label = blank_to_none(self.row_label);
        self.seat_type = blank_to_none(self.seat_type);
        check_form(&self)?;
        Ok(self)
    }
}

impl Seat {
    pub fn seat_type_or_default(&self) -> &str {
        self.seat_type.as_deref().unwrap_or(DEFAULT_SEAT_TYPE)
    }

    /// Human label shown at the box office, e.g. `Row F #12 (VIP)`.
    pub fn label(&self) -> String {
        format!(
            "Row {} #{} ({})",
            self.row_label.as_deref().unwrap_or("-"),
            self.number,
            self.seat_type_or_default()
        )
    }

    /// Case-insensitive substring match against [`Seat::label`].
    pub fn matches_filter(&self, filter: &str) -> bool {
        let needle = filter.trim().to_lowercase();
        needle.is_empty() || self.label().to_lowercase().contains(&needle)
    }

    pub async fn list(db: &Database) -> PosResult<Vec<Seat>> {
        let query = format!("SELECT {COLUMNS} FROM seats ORDER BY room_id, row_label, number");
        Ok(sqlx::query_as::<_, Seat>(&query).fetch_all(&db.pool).await?)
    }

    pub async fn get(db: &Database, id: i64) -> PosResult<Seat> {
        let query = format!("SELECT {COLUMNS} FROM seats WHERE id = $1");
        sqlx::query_as::<_, Seat>(&query)
            .bind(id)
            .fetch_optional(&db.pool)
            .await?
            .ok_or(PosError::NotFound { entity: "seat", id })
    }

    pub async fn create(db: &Database, form: SeatForm) -> PosResult<Seat> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let result = Self::insert(&mut *tx, &form).await;
        let seat = settle(tx, result, "seat").await?;
        info!(seat_id = seat.id, room_id = seat.room_id, "Seat created");
        Ok(seat)
    }

    pub async fn update(db: &Database, id: i64, form: SeatForm) -> PosResult<Seat> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let result = Self::write(&mut *tx, id, &form).await;
        settle(tx, result, "seat").await
    }

    pub async fn delete(db: &Database, id: i64) -> PosResult<()> {
        delete_row(db, "seats", "seat", id).await
    }

    async fn insert(conn: &mut PgConnection, form: &SeatForm) -> PosResult<Seat> {
        ensure_exists(conn, "rooms", "room", form.room_id).await?;
        let id = next_id(conn, Sequence::Seat).await?;
        let query = format!(
            "INSERT INTO seats ({COLUMNS}) VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Seat>(&query)
            .bind(id)
            .bind(&form.row_label)
            .bind(form.number)
            .bind(&form.seat_type)
            .bind(form.room_id)
            .fetch_one(conn)
            .await?)
    }

    async fn write(conn: &mut PgConnection, id: i64, form: &SeatForm) -> PosResult<Seat> {
        ensure_exists(conn, "rooms", "room", form.room_id).await?;
        let query = format!(
            "UPDATE seats SET row_label = $2, number = $3, seat_type = $4, room_id = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Seat>(&query)
            .bind(id)
            .bind(&form.row_label)
            .bind(form.number)
            .bind(&form.seat_type)
            .bind(form.room_id)
            .fetch_optional(conn)
            .await?
            .ok_or(PosError::NotFound { entity: "seat", id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(row: Option<&str>, number: i32, seat_type: Option<&str>) -> Seat {
        Seat {
            id: 1,
            row_label: row.map(str::to_string),
            number,
            seat_type: seat_type.map(str::to_string),
            room_id: 1,
        }
    }

    #[test]
    fn label_defaults_missing_type_to_normal() {
        assert_eq!(seat(Some("F"), 12, None).label(), "Row F #12 (normal)");
        assert_eq!(seat(Some("A"), 1, Some("VIP")).label(), "Row A #1 (VIP)");
        assert_eq!(seat(None, 3, None).label(), "Row - #3 (normal)");
    }

    #[test]
    fn filter_is_case_insensitive_and_blank_matches_all() {
        let vip = seat(Some("B"), 4, Some("VIP"));
        assert!(vip.matches_filter("vip"));
        assert!(vip.matches_filter("row b"));
        assert!(vip.matches_filter("  "));
        assert!(!vip.matches_filter("normal"));
    }

    #[test]
    fn seat_number_range_is_checked() {
        let form = SeatForm {
            row_label: Some("A".into()),
            number: 0,
            seat_type: None,
            room_id: 1,
        };
        assert!(matches!(form.tidy(), Err(PosError::Validation(_))));
    }
}
