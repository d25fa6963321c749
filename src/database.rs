// src/database.rs
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::{error, info};

use crate::{
    config::DatabaseConfig,
    errors::EmissionsError,
    models::{
        AggregateRow, BuiltYearRow, Column, EfficiencyMetric, EmissionRecord, FuelMetric,
        FuelPerformanceRow, Imo, VerifierRankRow,
    },
    query,
    store::{EmissionStore, InsertOutcome, Window},
};

/// PostgreSQL backed emission store
///
/// Each operation checks a connection out of the pool for one statement and
/// returns it when the statement completes or fails.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Wrap an existing pool and bring the schema up to date
    pub async fn new(pool: Pool<Postgres>) -> Result<Self, EmissionsError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Connect using application configuration
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, EmissionsError> {
        config.validate()?;

        info!(
            "Connecting to database: max_connections={}, acquire_timeout={:?}",
            config.max_connections, config.acquire_timeout
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                EmissionsError::DatabaseConnectionError(e.to_string())
            })?;

        Self::new(pool).await
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

fn offset(window: Window) -> i64 {
    window.offset.min(i64::MAX as u64) as i64
}

#[async_trait]
impl EmissionStore for Database {
    async fn count_records(&self) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(&query::count_records())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_page(
        &self,
        order_by: Column,
        window: Window,
    ) -> Result<Vec<EmissionRecord>, sqlx::Error> {
        sqlx::query_as(&query::select_page(order_by))
            .bind(offset(window))
            .bind(window.limit as i64)
            .fetch_all(&self.pool)
            .await
    }

    async fn fetch_record(&self, imo: Imo) -> Result<Option<EmissionRecord>, sqlx::Error> {
        sqlx::query_as(&query::select_record())
            .bind(imo)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_record(&self, record: &EmissionRecord) -> Result<InsertOutcome, sqlx::Error> {
        let result = sqlx::query(&query::insert_record())
            .bind(record.imo)
            .bind(&record.ship_name)
            .bind(&record.ship_type)
            .bind(record.technical_efficiency_number)
            .bind(record.issue)
            .bind(record.expiry)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }

    async fn update_record(&self, imo: Imo, record: &EmissionRecord) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&query::update_record())
            .bind(&record.ship_name)
            .bind(&record.ship_type)
            .bind(record.technical_efficiency_number)
            .bind(record.issue)
            .bind(record.expiry)
            .bind(imo)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_record(&self, imo: Imo) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&query::delete_record())
            .bind(imo)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn distinct_values(&self, column: Column) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(&query::distinct_values(column))
            .fetch_all(&self.pool)
            .await
    }

    async fn count_groups(&self, group_by: Column) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(&query::count_groups(group_by))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_aggregates(
        &self,
        group_by: Column,
        window: Option<Window>,
    ) -> Result<Vec<AggregateRow>, sqlx::Error> {
        match window {
            Some(window) => {
                sqlx::query_as(&query::select_aggregates_page(group_by))
                    .bind(offset(window))
                    .bind(window.limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as(&query::select_all_aggregates(group_by))
                    .fetch_all(&self.pool)
                    .await
            }
        }
    }

    async fn fuel_performance(
        &self,
        metric: FuelMetric,
    ) -> Result<Vec<FuelPerformanceRow>, sqlx::Error> {
        sqlx::query_as(&query::fuel_performance(metric))
            .fetch_all(&self.pool)
            .await
    }

    async fn verifier_ranking(&self) -> Result<Vec<VerifierRankRow>, sqlx::Error> {
        sqlx::query_as(&query::verifier_ranking())
            .fetch_all(&self.pool)
            .await
    }

    async fn built_year_percentiles(
        &self,
        metric: EfficiencyMetric,
    ) -> Result<Vec<BuiltYearRow>, sqlx::Error> {
        sqlx::query_as(&query::built_year_percentiles(metric))
            .fetch_all(&self.pool)
            .await
    }
}
