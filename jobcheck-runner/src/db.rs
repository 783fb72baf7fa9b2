//! Database liveness probe

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to connect to {host}:{port}/{database}: {source}")]
    Connect {
        host: String,
        port: u16,
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("liveness query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("liveness query returned {0}, expected 1")]
    UnexpectedValue(i32),
}

fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database);

    match &config.password {
        Some(password) => options.password(password),
        None => options,
    }
}

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_options(config))
        .await
        .map_err(|source| DatabaseError::Connect {
            host: config.host.clone(),
            port: config.port,
            database: config.database.clone(),
            source,
        })
}

/// Runs `SELECT 1` and checks the value that comes back
pub async fn check_liveness(pool: &PgPool) -> Result<(), DatabaseError> {
    let num: i32 = sqlx::query_scalar("SELECT 1 as num")
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::Query)?;

    if num != 1 {
        return Err(DatabaseError::UnexpectedValue(num));
    }

    tracing::debug!("Database liveness query returned {}", num);
    Ok(())
}

/// Connects, probes and closes the pool again
pub async fn probe(config: &DatabaseConfig) -> Result<(), DatabaseError> {
    let pool = create_pool(config).await?;
    let result = check_liveness(&pool).await;
    pool.close().await;
    result
}
