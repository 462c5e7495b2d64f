//! Error taxonomy shared by the services and the HTTP layer.
//!
//! Every operation returns [`PosError`]; the controllers turn it into a JSON
//! body of the form `{"error": ..., "code": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// PostgreSQL SQLSTATE codes the services react to.
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Unique constraint guarding one ticket per seat and showtime.
pub const TICKET_SEAT_CONSTRAINT: &str = "uq_tickets_showtime_seat";

#[derive(Debug, Error)]
pub enum PosError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("select at least one seat")]
    NoSeatsSelected,

    #[error("seat {0} was selected more than once")]
    DuplicateSeat(i64),

    #[error("showtime {0} has already started and is no longer on sale")]
    ShowtimeNotOnSale(i64),

    #[error("showtime {0} has no seats available")]
    NoSeatsAvailable(i64),

    #[error("seat {seat_id} is not in room {room_id}")]
    SeatNotInRoom { seat_id: i64, room_id: i64 },

    #[error("seat {seat_id} was already sold for showtime {showtime_id}; refresh the seat list and try again")]
    SeatAlreadySold { showtime_id: i64, seat_id: i64 },

    #[error("another sale touched the same seats; refresh the seat list and try again")]
    SaleConflict,

    #[error("{0} is still referenced by other records")]
    InUse(String),

    #[error("{0} duplicates an existing record")]
    Duplicate(String),

    #[error("could not hash password: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type PosResult<T> = Result<T, PosError>;

impl PosError {
    pub fn validation(message: impl Into<String>) -> Self {
        PosError::Validation(message.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            PosError::Validation(_)
            | PosError::NoSeatsSelected
            | PosError::DuplicateSeat(_)
            | PosError::SeatNotInRoom { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PosError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PosError::ShowtimeNotOnSale(_) | PosError::NoSeatsAvailable(_) => {
                (StatusCode::CONFLICT, "NOT_ON_SALE")
            }
            PosError::SeatAlreadySold { .. } => (StatusCode::CONFLICT, "SEAT_ALREADY_SOLD"),
            PosError::SaleConflict => (StatusCode::CONFLICT, "SALE_CONFLICT"),
            PosError::InUse(_) => (StatusCode::CONFLICT, "IN_USE"),
            PosError::Duplicate(_) => (StatusCode::CONFLICT, "DUPLICATE"),
            PosError::Password(_) | PosError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

/// Reclassifies constraint failures that have a meaning for the caller.
///
/// `entity` names the row being written or deleted and is used in the
/// `InUse` message.
pub fn classify_db_error(err: sqlx::Error, entity: &str) -> PosError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        if is_sale_conflict(code.as_deref(), db_err.constraint()) {
            return PosError::SaleConflict;
        }
        match code.as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => return PosError::InUse(entity.to_string()),
            Some(UNIQUE_VIOLATION) => return PosError::Duplicate(entity.to_string()),
            _ => {}
        }
    }
    PosError::Database(err)
}

/// Failures that mean another transaction won the race for the same rows.
fn is_sale_conflict(code: Option<&str>, constraint: Option<&str>) -> bool {
    match code {
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => true,
        Some(UNIQUE_VIOLATION) => constraint == Some(TICKET_SEAT_CONSTRAINT),
        _ => false,
    }
}

impl IntoResponse for PosError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_already_sold_names_the_seat() {
        let err = PosError::SeatAlreadySold {
            showtime_id: 7,
            seat_id: 42,
        };
        assert!(err.to_string().contains("seat 42"));
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "SEAT_ALREADY_SOLD"));
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            PosError::NoSeatsSelected.status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PosError::NotFound { entity: "movie", id: 1 }.status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PosError::InUse("room 3".into()).status_and_code().0,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn lost_races_are_sale_conflicts() {
        assert!(is_sale_conflict(Some("40001"), None));
        assert!(is_sale_conflict(Some("40P01"), None));
        assert!(is_sale_conflict(Some("23505"), Some(TICKET_SEAT_CONSTRAINT)));
        assert!(!is_sale_conflict(Some("23505"), Some("uq_employees_username")));
        assert!(!is_sale_conflict(Some("23503"), None));
        assert!(!is_sale_conflict(None, None));
    }

    #[test]
    fn plain_database_errors_stay_internal() {
        let err = classify_db_error(sqlx::Error::RowNotFound, "movie 1");
        assert!(matches!(err, PosError::Database(sqlx::Error::RowNotFound)));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
