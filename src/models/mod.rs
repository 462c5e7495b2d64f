pub mod customer;
pub mod employee;
pub mod money;
pub mod movie;
pub mod payment;
pub mod room;
pub mod seat;
pub mod showtime;
pub mod ticket;

pub use customer::Customer;
pub use employee::Employee;
pub use money::Money;
pub use movie::Movie;
pub use payment::{Payment, PaymentMethod};
pub use room::Room;
pub use seat::Seat;
pub use showtime::Showtime;
pub use ticket::Ticket;

use sqlx::PgConnection;
use tracing::info;
use validator::{Validate, ValidationErrors};

use crate::database::{settle, Database};
use crate::error::{classify_db_error, PosError, PosResult};

/// Runs the derive-generated checks and flattens the failures into one message.
pub(crate) fn check_form<T: Validate>(form: &T) -> PosResult<()> {
    form.validate()
        .map_err(|errors| PosError::Validation(describe(&errors)))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, list)| {
            list.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

pub(crate) fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trims an optional text field; blank input becomes `None`.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fails with `NotFound` unless `table` has a row with `id`.
pub(crate) async fn ensure_exists(
    conn: &mut PgConnection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> PosResult<()> {
    let query = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
    let exists = sqlx::query_scalar::<_, bool>(&query)
        .bind(id)
        .fetch_one(conn)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(PosError::NotFound { entity, id })
    }
}

/// Deletes one row by primary key in its own transaction.
///
/// Rows still referenced by a foreign key fail with `InUse` and nothing is
/// removed.
pub(crate) async fn delete_row(
    db: &Database,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> PosResult<()> {
    let mut tx = db.begin().await?;
    let query = format!("DELETE FROM {table} WHERE id = $1");
    let result = match sqlx::query(&query).bind(id).execute(&mut *tx).await {
        Ok(done) if done.rows_affected() == 0 => Err(PosError::NotFound { entity, id }),
        Ok(_) => Ok(()),
        Err(err) => Err(classify_db_error(err, &format!("{entity} {id}"))),
    };
    settle(tx, result, entity).await?;
    info!(entity, id, "Row deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_collapse_to_none() {
        assert_eq!(blank_to_none(Some("   ".into())), None);
        assert_eq!(blank_to_none(Some(" VIP ".into())), Some("VIP".into()));
        assert_eq!(blank_to_none(None), None);
    }

    #[test]
    fn trim_in_place_strips_whitespace() {
        let mut value = "  Sala 1 ".to_string();
        trim_in_place(&mut value);
        assert_eq!(value, "Sala 1");
    }
}
