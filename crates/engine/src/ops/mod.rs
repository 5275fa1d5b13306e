use std::time::Duration;

use sea_orm::{DatabaseConnection, DatabaseTransaction};

use crate::{EngineError, ResultEngine};

mod accounts;
mod aggregates;
mod statistics;
mod transactions;

pub use transactions::TransactionListFilter;

/// Default bound of one unit of work.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a block as one unit of work: begin a DB transaction, run the block,
/// commit on success, roll back on error. Begin, block and commit together
/// are bounded by the engine's timeout.
///
/// The block is the body of an `async` block, so `?` inside it leaves the
/// unit of work (not the enclosing function) and still goes through the
/// rollback. On timeout the pending transaction is dropped, which rolls it
/// back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let limit = $self.tx_timeout;
        let unit = async {
            let $tx = $self
                .database
                .begin()
                .await
                .map_err($crate::EngineError::from)?;
            let outcome: $crate::ResultEngine<_> = async { $body }.await;
            $crate::ops::settle($tx, outcome).await
        };
        match ::tokio::time::timeout(limit, unit).await {
            Ok(result) => result,
            Err(_) => Err($crate::ops::timed_out(limit)),
        }
    }};
}

pub(crate) use with_tx;

/// Commits or rolls back `db_tx` depending on how the unit of work ended.
pub(crate) async fn settle<T>(
    db_tx: DatabaseTransaction,
    outcome: ResultEngine<T>,
) -> ResultEngine<T> {
    match outcome {
        Ok(value) => {
            db_tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(error = %err, "unit of work aborted, rolling back");
            if let Err(rollback_err) = db_tx.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

pub(crate) fn timed_out(limit: Duration) -> EngineError {
    tracing::warn!(?limit, "unit of work timed out, rolling back");
    EngineError::Timeout(limit)
}

#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    tx_timeout: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Upper bound of every coordinated operation.
    pub fn tx_timeout(&self) -> Duration {
        self.tx_timeout
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    tx_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the unit-of-work timeout (default 5 seconds).
    pub fn tx_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.tx_timeout = Some(timeout);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let tx_timeout = self.tx_timeout.unwrap_or(DEFAULT_TX_TIMEOUT);
        if tx_timeout.is_zero() {
            return Err(EngineError::InvalidInput(
                "tx_timeout must be > 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            tx_timeout,
        })
    }
}
