use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use tracing::info;
use validator::Validate;

use super::{blank_to_none, check_form, delete_row, trim_in_place};
use crate::config::SalesConfig;
use crate::database::{settle, Database};
use crate::error::{PosError, PosResult};

const COLUMNS: &str = "id, name, surname, email, phone";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "surname is required"))]
    pub surname: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
}

impl CustomerForm {
    fn tidy(mut self) -> PosResult<Self> {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.surname);
        trim_in_place(&mut self.email);
        self.phone = blank_to_none(self.phone);
        check_form(&self)?;
        Ok(self)
    }
}

impl Customer {
    pub async fn list(db: &Database) -> PosResult<Vec<Customer>> {
        let query = format!("SELECT {COLUMNS} FROM customers ORDER BY id");
        Ok(sqlx::query_as::<_, Customer>(&query)
            .fetch_all(&db.pool)
            .await?)
    }

    pub async fn get(db: &Database, id: i64) -> PosResult<Customer> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(&db.pool)
            .await?
            .ok_or(PosError::NotFound { entity: "customer", id })
    }

    /// The id column is an identity, so the database assigns it.
    pub async fn create(db: &Database, form: CustomerForm) -> PosResult<Customer> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let query = format!(
            "INSERT INTO customers (name, surname, email, phone) VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, Customer>(&query)
            .bind(&form.name)
            .bind(&form.surname)
            .bind(&form.email)
            .bind(&form.phone)
            .fetch_one(&mut *tx)
            .await
            .map_err(PosError::from);
        let customer = settle(tx, result, "customer").await?;
        info!(customer_id = customer.id, "Customer registered");
        Ok(customer)
    }

    pub async fn update(db: &Database, id: i64, form: CustomerForm) -> PosResult<Customer> {
        let form = form.tidy()?;
        let mut tx = db.begin().await?;
        let query = format!(
            "UPDATE customers SET name = $2, surname = $3, email = $4, phone = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(&form.name)
            .bind(&form.surname)
            .bind(&form.email)
            .bind(&form.phone)
            .fetch_optional(&mut *tx)
            .await
            .map_err(PosError::from)
            .and_then(|row| row.ok_or(PosError::NotFound { entity: "customer", id }));
        settle(tx, result, "customer").await
    }

    pub async fn delete(db: &Database, id: i64) -> PosResult<()> {
        delete_row(db, "customers", "customer", id).await
    }

    /// Inserts the walk-in customer under its configured id unless it exists.
    ///
    /// Runs on the caller's connection so a sale can create it inside its own
    /// transaction.
    pub async fn ensure_generic(conn: &mut PgConnection, sales: &SalesConfig) -> PosResult<i64> {
        let inserted = sqlx::query(
            "INSERT INTO customers (id, name, surname, email, phone)
             VALUES ($1, $2, $3, $4, NULL)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(sales.generic_customer_id)
        .bind(&sales.generic_customer_name)
        .bind(&sales.generic_customer_surname)
        .bind(&sales.generic_customer_email)
        .execute(conn)
        .await?;

        if inserted.rows_affected() > 0 {
            info!(
                customer_id = sales.generic_customer_id,
                "Generic customer created"
            );
        }
        Ok(sales.generic_customer_id)
    }

    pub(crate) async fn exists(conn: &mut PgConnection, id: i64) -> PosResult<()> {
        super::ensure_exists(conn, "customers", "customer", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_must_be_valid() {
        let form = CustomerForm {
            name: "Ana".into(),
            surname: "López".into(),
            email: "not-an-email".into(),
            phone: None,
        };
        assert!(matches!(form.tidy(), Err(PosError::Validation(ref m)) if m == "a valid email is required"));
    }

    #[test]
    fn all_missing_fields_are_reported() {
        let form = CustomerForm {
            name: "".into(),
            surname: " ".into(),
            email: "ana@example.com".into(),
            phone: Some("".into()),
        };
        match form.tidy() {
            Err(PosError::Validation(message)) => {
                assert!(message.contains("name is required"));
                assert!(message.contains("surname is required"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
