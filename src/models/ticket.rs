use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use super::Money;

/// One seat sold for one showtime.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: i64,
    pub seat_id: i64,
    pub showtime_id: i64,
    pub employee_id: i64,
    pub payment_id: i64,
    pub purchased_at: DateTime<Utc>,
    pub price_paid: Money,
}

/// Values shared by every ticket written in one sale.
pub(crate) struct TicketStub {
    pub showtime_id: i64,
    pub employee_id: i64,
    pub payment_id: i64,
    pub purchased_at: DateTime<Utc>,
    pub price_paid: Money,
}

impl Ticket {
    pub(crate) async fn for_payment(
        conn: &mut PgConnection,
        payment_id: i64,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            "SELECT id, seat_id, showtime_id, employee_id, payment_id, purchased_at, price_paid
             FROM tickets WHERE payment_id = $1 ORDER BY id",
        )
        .bind(payment_id)
        .fetch_all(conn)
        .await
    }

    /// Seats among `seat_ids` that already have a ticket for the showtime.
    pub(crate) async fn sold_among(
        conn: &mut PgConnection,
        showtime_id: i64,
        seat_ids: &[i64],
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT seat_id FROM tickets
             WHERE showtime_id = $1 AND seat_id = ANY($2)
             ORDER BY seat_id",
        )
        .bind(showtime_id)
        .bind(seat_ids)
        .fetch_all(conn)
        .await
    }

    pub(crate) async fn insert(
        conn: &mut PgConnection,
        id: i64,
        seat_id: i64,
        stub: &TicketStub,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tickets
                (id, seat_id, showtime_id, employee_id, payment_id, purchased_at, price_paid)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(seat_id)
        .bind(stub.showtime_id)
        .bind(stub.employee_id)
        .bind(stub.payment_id)
        .bind(stub.purchased_at)
        .bind(stub.price_paid)
        .execute(conn)
        .await?;
        Ok(())
    }
}
