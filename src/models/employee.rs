use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use tracing::info;
use validator::Validate;

use super::{blank_to_none, check_form, delete_row, trim_in_place};
use crate::database::{next_id, settle, Database, Sequence};
use crate::error::{classify_db_error, PosError, PosResult};

const COLUMNS: &str = "id, username, password_hash, name, surname, role";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub role: String,
}

/// Create/edit form. On edit a blank password keeps the stored credential.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmployeeForm {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    pub password: Option<String>,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "surname is required"))]
    pub surname: String,
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,
}

impl EmployeeForm {
    fn tidy(mut self) -> PosResult<Self> {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.surname);
        trim_in_place(&mut self.role);
        self.password = blank_to_none(self.password);
        check_form(&self)?;
        Ok(self)
    }
}

fn hash_password(password: &str) -> PosResult<String> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

impl Employee {
    pub async fn list(db: &Database) -> PosResult<Vec<Employee>> {
        let query = format!("SELECT {COLUMNS} FROM employees ORDER BY id");
        Ok(sqlx::query_as::<_, Employee>(&query)
            .fetch_all(&db.pool)
            .await?)
    }

    pub async fn get(db: &Database, id: i64) -> PosResult<Employee> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(&db.pool)
            .await?
            .ok_or(PosError::NotFound { entity: "employee", id })
    }

    pub async fn create(db: &Database, form: EmployeeForm) -> PosResult<Employee> {
        let form = form.tidy()?;
        let password = form
            .password
            .as_deref()
            .ok_or_else(|| PosError::validation("password is required for new employees"))?;
        let password_hash = hash_password(password)?;

        let mut tx = db.begin().await?;
        let result = Self::insert(&mut *tx, &form, &password_hash).await;
        let employee = settle(tx, result, "employee").await?;
        info!(employee_id = employee.id, username = %employee.username, "Employee created");
        Ok(employee)
    }

    pub async fn update(db: &Database, id: i64, form: EmployeeForm) -> PosResult<Employee> {
        let form = form.tidy()?;
        let password_hash = form.password.as_deref().map(hash_password).transpose()?;

        let mut tx = db.begin().await?;
        let result = Self::write(&mut *tx, id, &form, password_hash.as_deref()).await;
        settle(tx, result, "employee").await
    }

    pub async fn delete(db: &Database, id: i64) -> PosResult<()> {
        delete_row(db, "employees", "employee", id).await
    }

    pub(crate) async fn exists(conn: &mut PgConnection, id: i64) -> PosResult<()> {
        super::ensure_exists(conn, "employees", "employee", id).await
    }

    async fn insert(
        conn: &mut PgConnection,
        form: &EmployeeForm,
        password_hash: &str,
    ) -> PosResult<Employee> {
        let id = next_id(conn, Sequence::Employee).await?;
        let query = format!(
            "INSERT INTO employees ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(&form.username)
            .bind(password_hash)
            .bind(&form.name)
            .bind(&form.surname)
            .bind(&form.role)
            .fetch_one(conn)
            .await
            .map_err(|err| classify_db_error(err, &format!("username {}", form.username)))
    }

    /// `COALESCE` keeps the stored hash when no new password was given.
    async fn write(
        conn: &mut PgConnection,
        id: i64,
        form: &EmployeeForm,
        password_hash: Option<&str>,
    ) -> PosResult<Employee> {
        let query = format!(
            "UPDATE employees SET
                username = $2,
                password_hash = COALESCE($3, password_hash),
                name = $4, surname = $5, role = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(&form.username)
            .bind(password_hash)
            .bind(&form.name)
            .bind(&form.surname)
            .bind(&form.role)
            .fetch_optional(conn)
            .await
            .map_err(|err| classify_db_error(err, &format!("username {}", form.username)))?
            .ok_or(PosError::NotFound { entity: "employee", id })
    }
}
