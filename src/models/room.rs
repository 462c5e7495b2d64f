use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use tracing::info;
use validator::Validate;

use super::{blank_to_none, check_form, delete_row, trim_in_place};
use crate::database::{next_id, settle, Database, Sequence};
use crate::error::{PosError, PosResult};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoomForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub location: Option<String>,
}

impl RoomForm {
    fn tidy(mut self) -> PosResult<Self> {
        trim_in_place(&mut self.name);
        self.location = blank_to_none(self.location);
        check_form(&self)?;
        Ok(self)
    }
}

impl Room {
    pub async fn list(db: &Database) -> PosResult<Vec<Room>> {
        Ok(
            sqlx::query_as::<_, Room>("SELECT id, name, location FROM rooms ORDER BY id")
                .fetch_all(&db.pool)
                .await?,
        )
    }

    pub async fn get(db: &Database, id: i64) -> PosResult<Room> {
        sqlx::query_as::<_, Room>("SELECT id, name, location FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await?
            .ok_or(PosError::NotFound { entity: "room", id })
    }

    pub async fn create(db: &Database, form: RoomForm) -> PosResult<Room> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let result = Self::insert(&mut *tx, &form).await;
        let room = settle(tx, result, "room").await?;
        info!(room_id = room.id, name = %room.name, "Room created");
        Ok(room)
    }

    pub async fn update(db: &Database, id: i64, form: RoomForm) -> PosResult<Room> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let result = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET name = $2, location = $3 WHERE id = $1
             RETURNING id, name, location",
        )
        .bind(id)
        .bind(&form.name)
        .bind(&form.location)
        .fetch_optional(&mut *tx)
        .await
        .map_err(PosError::from)
        .and_then(|row| row.ok_or(PosError::NotFound { entity: "room", id }));
        settle(tx, result, "room").await
    }

    pub async fn delete(db: &Database, id: i64) -> PosResult<()> {
        delete_row(db, "rooms", "room", id).await
    }

    async fn insert(conn: &mut PgConnection, form: &RoomForm) -> PosResult<Room> {
        let id = next_id(conn, Sequence::Room).await?;
        Ok(sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (id, name, location) VALUES ($1, $2, $3)
             RETURNING id, name, location",
        )
        .bind(id)
        .bind(&form.name)
        .bind(&form.location)
        .fetch_one(conn)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        let form = RoomForm {
            name: " ".into(),
            location: Some("Planta baja".into()),
        };
        assert!(matches!(form.tidy(), Err(PosError::Validation(_))));
    }
}
