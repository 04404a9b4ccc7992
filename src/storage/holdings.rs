// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Holdings repository.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::models::Holding;

/// Maximum time to wait for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the holdings store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to a user's holdings.
#[async_trait]
pub trait HoldingsStore: Send + Sync {
    /// Holdings owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Holding>, StorageError>;
}

/// Postgres-backed holdings store.
#[derive(Clone)]
pub struct PgHoldingsStore {
    pool: PgPool,
}

impl PgHoldingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url`; fails if the database is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl HoldingsStore for PgHoldingsStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Holding>, StorageError> {
        let rows = sqlx::query_as::<_, Holding>(
            r#"
            SELECT name, symbol, quantity::float8 AS quantity, currency, cost::float8 AS cost
            FROM holdings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
