//! Ticket sale workflow.
//!
//! A sale turns a seat selection for one showtime into one payment and one
//! ticket per seat. Everything from the availability re-check to the last
//! ticket insert runs in a single serializable transaction, and the
//! `uq_tickets_showtime_seat` constraint backs it up, so two counters racing
//! for the same seat cannot both succeed.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::display::render_local;
use crate::config::SalesConfig;
use crate::database::{next_id, settle, Database, Sequence};
use crate::error::{classify_db_error, PosError, PosResult};
use crate::models::ticket::TicketStub;
use crate::models::{Customer, Employee, Money, Payment, PaymentMethod, Seat, Showtime, Ticket};

#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    /// `None` sells to the configured generic customer.
    pub customer_id: Option<i64>,
    pub employee_id: i64,
    pub showtime_id: i64,
    pub seat_ids: Vec<i64>,
    pub method: PaymentMethod,
}

/// The payment written by a sale together with its tickets.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    #[serde(flatten)]
    pub payment: Payment,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub showtime_id: i64,
    pub price_per_seat: Money,
    pub seat_count: usize,
    pub amount: Money,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OnSaleShowtime {
    pub id: i64,
    pub movie_title: String,
    pub starts_at: DateTime<Utc>,
    pub price: Money,
    pub room_id: i64,
    #[sqlx(skip)]
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatOption {
    #[serde(flatten)]
    pub seat: Seat,
    pub label: String,
}

/// Amount due for `seat_count` seats at `price` each.
pub fn quote_amount(price: Money, seat_count: usize) -> Money {
    price.times(seat_count)
}

/// Rejects an empty selection or one that lists a seat twice.
pub fn validate_selection(seat_ids: &[i64]) -> PosResult<()> {
    if seat_ids.is_empty() {
        return Err(PosError::NoSeatsSelected);
    }
    check_distinct(seat_ids)
}

fn check_distinct(seat_ids: &[i64]) -> PosResult<()> {
    let mut seen = HashSet::with_capacity(seat_ids.len());
    match seat_ids.iter().find(|id| !seen.insert(**id)) {
        Some(&duplicate) => Err(PosError::DuplicateSeat(duplicate)),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct SaleService {
    db: Database,
    sales: SalesConfig,
}

impl SaleService {
    pub fn new(db: Database, sales: SalesConfig) -> Self {
        Self { db, sales }
    }

    /// Showtimes that have not started yet, soonest first.
    pub async fn on_sale_showtimes(&self) -> PosResult<Vec<OnSaleShowtime>> {
        let mut showtimes = sqlx::query_as::<_, OnSaleShowtime>(
            "SELECT s.id, m.title AS movie_title, s.starts_at, s.price, s.room_id
             FROM showtimes s
             JOIN movies m ON m.id = s.movie_id
             WHERE s.starts_at > NOW()
             ORDER BY s.starts_at",
        )
        .fetch_all(&self.db.pool)
        .await?;

        for showtime in &mut showtimes {
            showtime.label = format!(
                "{} - {} (${})",
                showtime.movie_title,
                render_local(showtime.starts_at),
                showtime.price
            );
        }
        Ok(showtimes)
    }

    /// Seats of the showtime's room that have no ticket for it yet.
    pub async fn available_seats(
        &self,
        showtime_id: i64,
        filter: Option<&str>,
    ) -> PosResult<Vec<SeatOption>> {
        let mut conn = self.db.pool.acquire().await?;
        let showtime = Showtime::find(&mut conn, showtime_id).await?;
        let seats = free_seats(&mut conn, &showtime).await?;

        Ok(seats
            .into_iter()
            .filter(|seat| filter.map_or(true, |f| seat.matches_filter(f)))
            .map(|seat| SeatOption {
                label: seat.label(),
                seat,
            })
            .collect())
    }

    /// Price of the current selection. Nothing is written.
    pub async fn quote(&self, showtime_id: i64, seat_ids: &[i64]) -> PosResult<Quote> {
        check_distinct(seat_ids)?;
        let showtime = Showtime::get(&self.db, showtime_id).await?;
        Ok(Quote {
            showtime_id,
            price_per_seat: showtime.price,
            seat_count: seat_ids.len(),
            amount: quote_amount(showtime.price, seat_ids.len()),
        })
    }

    /// Sells every requested seat or none of them.
    pub async fn sell(&self, request: SaleRequest) -> PosResult<SaleReceipt> {
        validate_selection(&request.seat_ids)?;

        let mut tx = self.db.begin_serializable().await?;
        let result = self.sell_in(&mut *tx, &request).await;
        let receipt = settle(tx, result, "ticket sale").await?;

        info!(
            payment_id = receipt.payment.id,
            showtime_id = request.showtime_id,
            seats = receipt.tickets.len(),
            amount = %receipt.payment.amount,
            "Tickets sold"
        );
        Ok(receipt)
    }

    /// Payment and tickets written by an earlier sale.
    pub async fn receipt(&self, payment_id: i64) -> PosResult<SaleReceipt> {
        let mut conn = self.db.pool.acquire().await?;
        let payment = Payment::find(&mut conn, payment_id).await?;
        let tickets = Ticket::for_payment(&mut conn, payment_id).await?;
        Ok(SaleReceipt { payment, tickets })
    }

    async fn sell_in(&self, conn: &mut PgConnection, request: &SaleRequest) -> PosResult<SaleReceipt> {
        // Microseconds, the precision the database keeps.
        let now = Utc::now().trunc_subsecs(6);

        let showtime = Showtime::find(conn, request.showtime_id).await?;
        if showtime.starts_at <= now {
            return Err(PosError::ShowtimeNotOnSale(showtime.id));
        }
        Employee::exists(conn, request.employee_id).await?;
        if let Some(customer_id) = request.customer_id {
            Customer::exists(conn, customer_id).await?;
        }
        if !has_free_seats(conn, &showtime).await? {
            return Err(PosError::NoSeatsAvailable(showtime.id));
        }
        check_room(conn, &showtime, &request.seat_ids).await?;

        // Re-check right before writing: the listing the clerk picked from may be stale.
        let sold = Ticket::sold_among(conn, showtime.id, &request.seat_ids).await?;
        if let Some(&seat_id) = request.seat_ids.iter().find(|id| sold.contains(id)) {
            warn!(showtime_id = showtime.id, seat_id, "Seat sold since it was listed");
            return Err(PosError::SeatAlreadySold {
                showtime_id: showtime.id,
                seat_id,
            });
        }

        let customer_id = match request.customer_id {
            Some(id) => id,
            None => Customer::ensure_generic(conn, &self.sales).await?,
        };

        let amount = quote_amount(showtime.price, request.seat_ids.len());
        let payment_id = next_id(conn, Sequence::Payment).await?;
        Payment::insert(conn, payment_id, now, amount, request.method, customer_id)
            .await
            .map_err(|err| classify_db_error(err, "payment"))?;
        debug!(payment_id, %amount, "Payment recorded");

        let stub = TicketStub {
            showtime_id: showtime.id,
            employee_id: request.employee_id,
            payment_id,
            purchased_at: now,
            price_paid: showtime.price,
        };
        // Ascending seat order, so overlapping sales lock tickets in the same order.
        let mut seat_ids = request.seat_ids.clone();
        seat_ids.sort_unstable();

        let mut tickets = Vec::with_capacity(seat_ids.len());
        for seat_id in seat_ids {
            let ticket_id = next_id(conn, Sequence::Ticket).await?;
            Ticket::insert(conn, ticket_id, seat_id, &stub)
                .await
                .map_err(|err| classify_db_error(err, "ticket"))?;
            tickets.push(Ticket {
                id: ticket_id,
                seat_id,
                showtime_id: stub.showtime_id,
                employee_id: stub.employee_id,
                payment_id,
                purchased_at: now,
                price_paid: stub.price_paid,
            });
        }

        Ok(SaleReceipt {
            payment: Payment {
                id: payment_id,
                paid_at: now,
                amount,
                method: request.method,
                customer_id,
            },
            tickets,
        })
    }
}

async fn free_seats(conn: &mut PgConnection, showtime: &Showtime) -> PosResult<Vec<Seat>> {
    Ok(sqlx::query_as::<_, Seat>(
        "SELECT s.id, s.row_label, s.number, s.seat_type, s.room_id
         FROM seats s
         WHERE s.room_id = $1
           AND NOT EXISTS (
             SELECT 1 FROM tickets t
             WHERE t.seat_id = s.id AND t.showtime_id = $2
           )
         ORDER BY s.row_label, s.number",
    )
    .bind(showtime.room_id)
    .bind(showtime.id)
    .fetch_all(conn)
    .await?)
}

async fn has_free_seats(conn: &mut PgConnection, showtime: &Showtime) -> PosResult<bool> {
    Ok(sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
           SELECT 1 FROM seats s
           WHERE s.room_id = $1
             AND NOT EXISTS (
               SELECT 1 FROM tickets t
               WHERE t.seat_id = s.id AND t.showtime_id = $2
             )
         )",
    )
    .bind(showtime.room_id)
    .bind(showtime.id)
    .fetch_one(conn)
    .await?)
}

/// Every requested seat must sit in the room the showtime plays in.
async fn check_room(conn: &mut PgConnection, showtime: &Showtime, seat_ids: &[i64]) -> PosResult<()> {
    let in_room = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM seats WHERE room_id = $1 AND id = ANY($2)",
    )
    .bind(showtime.room_id)
    .bind(seat_ids)
    .fetch_all(conn)
    .await?;

    match seat_ids.iter().find(|id| !in_room.contains(id)) {
        Some(&seat_id) => Err(PosError::SeatNotInRoom {
            seat_id,
            room_id: showtime.room_id,
        }),
        None => Ok(()),
    }
}
