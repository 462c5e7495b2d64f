//! Read-only audit listings of sold tickets and payments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::display::render_local;
use crate::database::Database;
use crate::error::PosResult;
use crate::models::{Money, PaymentMethod};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketLedgerEntry {
    pub ticket_id: i64,
    pub purchased_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub purchased_at_local: String,
    pub price_paid: Money,
    pub movie_title: String,
    pub starts_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub starts_at_local: String,
    pub room_name: String,
    pub seat: String,
    pub customer: String,
    pub employee: String,
    pub payment_id: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentLedgerEntry {
    pub payment_id: i64,
    pub paid_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub paid_at_local: String,
    pub amount: Money,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    pub customer: String,
}

/// Every sold ticket with its screening, seat and people, newest first.
pub async fn ticket_ledger(db: &Database) -> PosResult<Vec<TicketLedgerEntry>> {
    let mut entries = sqlx::query_as::<_, TicketLedgerEntry>(
        r#"
        SELECT t.id AS ticket_id, t.purchased_at, t.price_paid,
               m.title AS movie_title, s.starts_at, r.name AS room_name,
               COALESCE(st.row_label, '-') || '-' || st.number AS seat,
               c.name || ' ' || c.surname AS customer,
               e.name || ' ' || e.surname AS employee,
               t.payment_id
        FROM tickets t
        JOIN showtimes s ON s.id = t.showtime_id
        JOIN movies m ON m.id = s.movie_id
        JOIN rooms r ON r.id = s.room_id
        JOIN seats st ON st.id = t.seat_id
        JOIN payments p ON p.id = t.payment_id
        JOIN customers c ON c.id = p.customer_id
        JOIN employees e ON e.id = t.employee_id
        ORDER BY t.purchased_at DESC, t.id DESC
        "#,
    )
    .fetch_all(&db.pool)
    .await?;

    for entry in &mut entries {
        entry.purchased_at_local = render_local(entry.purchased_at);
        entry.starts_at_local = render_local(entry.starts_at);
    }
    Ok(entries)
}

/// Every payment with its customer, newest first.
pub async fn payment_ledger(db: &Database) -> PosResult<Vec<PaymentLedgerEntry>> {
    let mut entries = sqlx::query_as::<_, PaymentLedgerEntry>(
        r#"
        SELECT p.id AS payment_id, p.paid_at, p.amount, p.method,
               c.name || ' ' || c.surname AS customer
        FROM payments p
        JOIN customers c ON c.id = p.customer_id
        ORDER BY p.paid_at DESC, p.id DESC
        "#,
    )
    .fetch_all(&db.pool)
    .await?;

    for entry in &mut entries {
        entry.paid_at_local = render_local(entry.paid_at);
    }
    Ok(entries)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Money,
}

/// Sum of the payments taken on `date`, in the session time zone.
///
/// A day without payments totals zero.
pub async fn daily_total(db: &Database, date: NaiveDate) -> PosResult<Money> {
    Ok(sqlx::query_scalar::<_, Money>(
        "SELECT COALESCE(SUM(amount), 0)::NUMERIC(12, 2)
         FROM payments
         WHERE (paid_at AT TIME ZONE current_setting('TimeZone'))::DATE = $1",
    )
    .bind(date)
    .fetch_one(&db.pool)
    .await?)
}

/// Today's date as the database session sees it.
pub async fn session_today(db: &Database) -> PosResult<NaiveDate> {
    Ok(sqlx::query_scalar::<_, NaiveDate>("SELECT CURRENT_DATE")
        .fetch_one(&db.pool)
        .await?)
}

/// Daily total for `date`, or for the session's today when none is given.
pub async fn daily_sales(db: &Database, date: Option<NaiveDate>) -> PosResult<DailySales> {
    let date = match date {
        Some(date) => date,
        None => session_today(db).await?,
    };
    let total = daily_total(db, date).await?;
    Ok(DailySales { date, total })
}
