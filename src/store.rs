//! Data access seam between the services and the SQL database

use async_trait::async_trait;

use crate::models::{
    AggregateRow, BuiltYearRow, Column, EfficiencyMetric, EmissionRecord, FuelMetric,
    FuelPerformanceRow, Imo, VerifierRankRow,
};

#[cfg(test)]
pub(crate) mod memory;

/// Result of an insert that may collide with an existing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same IMO already exists and was left untouched
    Duplicate,
}

/// Row window of a paged query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u32,
}

/// Operations on the emissions table and the reporting schema.
///
/// Every call is a single round trip; implementations hold no state across
/// calls besides the connection pool.
#[async_trait]
pub trait EmissionStore: Send + Sync {
    async fn count_records(&self) -> Result<u64, sqlx::Error>;

    /// Records ordered ascending by `order_by`
    async fn fetch_page(
        &self,
        order_by: Column,
        window: Window,
    ) -> Result<Vec<EmissionRecord>, sqlx::Error>;

    async fn fetch_record(&self, imo: Imo) -> Result<Option<EmissionRecord>, sqlx::Error>;

    async fn insert_record(&self, record: &EmissionRecord) -> Result<InsertOutcome, sqlx::Error>;

    /// Overwrite every column but the key; returns the number of rows changed
    async fn update_record(&self, imo: Imo, record: &EmissionRecord) -> Result<u64, sqlx::Error>;

    /// Returns the number of rows removed
    async fn delete_record(&self, imo: Imo) -> Result<u64, sqlx::Error>;

    /// Distinct non-null values of `column` as text, sorted
    async fn distinct_values(&self, column: Column) -> Result<Vec<String>, sqlx::Error>;

    async fn count_groups(&self, group_by: Column) -> Result<u64, sqlx::Error>;

    /// EEDI statistics per distinct value of `group_by`, ordered by the group
    /// key. `None` returns every group.
    async fn fetch_aggregates(
        &self,
        group_by: Column,
        window: Option<Window>,
    ) -> Result<Vec<AggregateRow>, sqlx::Error>;

    async fn fuel_performance(
        &self,
        metric: FuelMetric,
    ) -> Result<Vec<FuelPerformanceRow>, sqlx::Error>;

    async fn verifier_ranking(&self) -> Result<Vec<VerifierRankRow>, sqlx::Error>;

    async fn built_year_percentiles(
        &self,
        metric: EfficiencyMetric,
    ) -> Result<Vec<BuiltYearRow>, sqlx::Error>;
}
