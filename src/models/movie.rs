use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use tracing::info;
use validator::Validate;

use super::{blank_to_none, check_form, delete_row, trim_in_place};
use crate::database::{next_id, settle, Database, Sequence};
use crate::error::{PosError, PosResult};

const COLUMNS: &str = "id, title, synopsis, duration_min, language, rating, release_date";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub synopsis: Option<String>,
    pub duration_min: i32,
    pub language: Option<String>,
    pub rating: Option<String>,
    pub release_date: Option<NaiveDate>,
}

/// Create/edit form. Edits replace every column.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MovieForm {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub synopsis: Option<String>,
    #[validate(range(min = 1, max = 999, message = "duration must be between 1 and 999 minutes"))]
    pub duration_min: i32,
    pub language: Option<String>,
    pub rating: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl MovieForm {
    fn tidy(mut self) -> PosResult<Self> {
        trim_in_place(&mut self.title);
        self.synopsis = blank_to_none(self.synopsis);
        self.language = blank_to_none(self.language);
        self.rating = blank_to_none(self.rating);
        check_form(&self)?;
        Ok(self)
    }
}

impl Movie {
    pub async fn list(db: &Database) -> PosResult<Vec<Movie>> {
        let query = format!("SELECT {COLUMNS} FROM movies ORDER BY id");
        Ok(sqlx::query_as::<_, Movie>(&query).fetch_all(&db.pool).await?)
    }

    pub async fn get(db: &Database, id: i64) -> PosResult<Movie> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(&db.pool)
            .await?
            .ok_or(PosError::NotFound { entity: "movie", id })
    }

    pub async fn create(db: &Database, form: MovieForm) -> PosResult<Movie> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let result = Self::insert(&mut *tx, &form).await;
        let movie = settle(tx, result, "movie").await?;
        info!(movie_id = movie.id, title = %movie.title, "Movie created");
        Ok(movie)
    }

    pub async fn update(db: &Database, id: i64, form: MovieForm) -> PosResult<Movie> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let result = Self::write(&mut *tx, id, &form).await;
        settle(tx, result, "movie").await
    }

    pub async fn delete(db: &Database, id: i64) -> PosResult<()> {
        delete_row(db, "movies", "movie", id).await
    }

    async fn insert(conn: &mut PgConnection, form: &MovieForm) -> PosResult<Movie> {
        let id = next_id(conn, Sequence::Movie).await?;
        let query = format!(
            "INSERT INTO movies ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .bind(&form.title)
            .bind(&form.synopsis)
            .bind(form.duration_min)
            .bind(&form.language)
            .bind(&form.rating)
            .bind(form.release_date)
            .fetch_one(conn)
            .await?)
    }

    async fn write(conn: &mut PgConnection, id: i64, form: &MovieForm) -> PosResult<Movie> {
        let query = format!(
            "UPDATE movies SET
                title = $2, synopsis = $3, duration_min = $4,
                language = $5, rating = $6, release_date = $7
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .bind(&form.title)
            .bind(&form.synopsis)
            .bind(form.duration_min)
            .bind(&form.language)
            .bind(&form.rating)
            .bind(form.release_date)
            .fetch_optional(conn)
            .await?
            .ok_or(PosError::NotFound { entity: "movie", id })
    }
}
