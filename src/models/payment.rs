use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use std::fmt;
use std::str::FromStr;

use super::Money;
use crate::error::{PosError, PosResult};

/// How a payment was settled at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Transfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment method {0:?}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = UnknownPaymentMethod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub paid_at: DateTime<Utc>,
    pub amount: Money,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    pub customer_id: i64,
}

impl Payment {
    pub(crate) async fn find(conn: &mut PgConnection, id: i64) -> PosResult<Payment> {
        sqlx::query_as::<_, Payment>(
            "SELECT id, paid_at, amount, method, customer_id FROM payments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(PosError::NotFound { entity: "payment", id })
    }

    pub(crate) async fn insert(
        conn: &mut PgConnection,
        id: i64,
        paid_at: DateTime<Utc>,
        amount: Money,
        method: PaymentMethod,
        customer_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO payments (id, paid_at, amount, method, customer_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(paid_at)
        .bind(amount)
        .bind(method.as_str())
        .bind(customer_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
