// ============================================================================
// Relational store adapters
// ============================================================================
//
// - postgres   - production store over a sqlx PgPool
// - in_memory  - transactional in-process store with the same semantics
// - schema     - CREATE TABLE IF NOT EXISTS bootstrap
//
// ============================================================================

mod in_memory;
mod postgres;
mod schema;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;
pub use schema::ensure_schema;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseSettings;
use crate::metrics::Metrics;
use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

/// Open the connection pool, retrying with exponential backoff.
pub async fn connect(settings: &DatabaseSettings, metrics: &Metrics) -> anyhow::Result<PgPool> {
    let config = RetryConfig::default();
    let max_connections = settings.max_connections;

    tracing::info!(
        host = %settings.host,
        database = %settings.name,
        max_connections = max_connections,
        "Connecting to Postgres..."
    );

    let result = retry_with_backoff(config, |attempt| {
        metrics.record_retry_attempt("db_connect", attempt);
        let url = settings.url();
        async move {
            PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(&url)
                .await
        }
    })
    .await;

    match result {
        RetryResult::Success(pool) => {
            metrics.record_retry_outcome("db_connect", true);
            Ok(pool)
        }
        RetryResult::Failed(e) => {
            metrics.record_retry_outcome("db_connect", false);
            Err(anyhow::anyhow!("could not connect to Postgres: {}", e))
        }
    }
}
