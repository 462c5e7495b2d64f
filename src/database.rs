use sqlx::{postgres::PgPoolOptions, PgConnection, Pool, Postgres, Transaction};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{ConfigError, DatabaseConfig};
use crate::error::{classify_db_error, PosError, PosResult};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not connect to the database: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Gateway to the relational store.
///
/// The pool is sized from `DB_POOL_SIZE`, which defaults to a single
/// connection so every screen funnels through one session.
#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

/// Named sequences that hand out client-assigned primary keys.
///
/// Customers are not listed: their ids come from an identity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Movie,
    Room,
    Seat,
    Showtime,
    Employee,
    Payment,
    Ticket,
}

impl Sequence {
    pub fn name(self) -> &'static str {
        match self {
            Sequence::Movie => "seq_movie",
            Sequence::Room => "seq_room",
            Sequence::Seat => "seq_seat",
            Sequence::Showtime => "seq_showtime",
            Sequence::Employee => "seq_employee",
            Sequence::Payment => "seq_payment",
            Sequence::Ticket => "seq_ticket",
        }
    }
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(config.connect_options()?)
            .await?;

        info!(
            pool_size = config.pool_size,
            time_zone = %config.time_zone,
            "Database connected"
        );
        Ok(Database { pool })
    }

    /// Wraps an existing pool, used by the integration tests.
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Database { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Opens a transaction whose reads and writes behave as if run alone.
    pub async fn begin_serializable(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

/// Draws the next value of `sequence` on the given connection.
pub async fn next_id(conn: &mut PgConnection, sequence: Sequence) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT nextval($1::regclass)")
        .bind(sequence.name())
        .fetch_one(conn)
        .await
}

/// Commits `tx` when `result` is `Ok`, rolls it back otherwise.
///
/// Raw database failures are classified on both paths, so a serialization
/// failure reads as a conflict whether a statement or the commit hit it.
pub async fn settle<T>(
    tx: Transaction<'static, Postgres>,
    result: PosResult<T>,
    entity: &str,
) -> PosResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|err| classify_db_error(err, entity))?;
            Ok(value)
        }
        Err(err) => {
            let err = match err {
                PosError::Database(db_err) => classify_db_error(db_err, entity),
                other => other,
            };
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            warn!(error = %err, entity, "transaction rolled back");
            Err(err)
        }
    }
}
