//! In-memory store for unit tests

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{EmissionStore, InsertOutcome, Window};
use crate::models::{
    AggregateRow, BuiltYearRow, Column, EfficiencyMetric, EmissionRecord, FuelMetric,
    FuelPerformanceRow, Imo, VerifierRankRow,
};

#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<BTreeMap<Imo, EmissionRecord>>,
    pub(crate) fuel_rows: Vec<FuelPerformanceRow>,
    pub(crate) verifier_rows: Vec<VerifierRankRow>,
    pub(crate) built_year_rows: Vec<BuiltYearRow>,
    distinct_queries: AtomicUsize,
    writes: AtomicUsize,
    fail_next: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn with_records(records: Vec<EmissionRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.imo, record);
            }
        }
        store
    }

    pub(crate) fn distinct_queries(&self) -> usize {
        self.distinct_queries.load(Ordering::SeqCst)
    }

    /// Number of insert, update and delete calls that reached the store
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next call fail as if the pool were exhausted
    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn get(&self, imo: Imo) -> Option<EmissionRecord> {
        self.records.lock().unwrap().get(&imo).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    fn sorted(&self, order_by: Column) -> Vec<EmissionRecord> {
        let mut rows: Vec<EmissionRecord> =
            self.records.lock().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| match order_by {
            Column::Imo => a.imo.cmp(&b.imo),
            Column::ShipName => a.ship_name.cmp(&b.ship_name).then(a.imo.cmp(&b.imo)),
            Column::Type => a.ship_type.cmp(&b.ship_type).then(a.imo.cmp(&b.imo)),
            Column::TechnicalEfficiencyNumber => a
                .technical_efficiency_number
                .partial_cmp(&b.technical_efficiency_number)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.imo.cmp(&b.imo)),
            Column::Issue => a.issue.cmp(&b.issue).then(a.imo.cmp(&b.imo)),
            Column::Expiry => a.expiry.cmp(&b.expiry).then(a.imo.cmp(&b.imo)),
        });
        rows
    }

    /// Groups in key order with the NULL group last, as Postgres sorts
    fn groups(&self, group_by: Column) -> Vec<(Option<String>, Vec<EmissionRecord>)> {
        let mut groups: BTreeMap<Option<String>, Vec<EmissionRecord>> = BTreeMap::new();
        for record in self.records.lock().unwrap().values() {
            groups
                .entry(column_text(record, group_by))
                .or_default()
                .push(record.clone());
        }
        let mut groups: Vec<_> = groups.into_iter().collect();
        groups.sort_by_key(|(key, _)| key.is_none());
        groups
    }
}

fn column_text(record: &EmissionRecord, column: Column) -> Option<String> {
    match column {
        Column::Imo => Some(record.imo.to_string()),
        Column::ShipName => Some(record.ship_name.clone()),
        Column::Type => Some(record.ship_type.clone()),
        Column::TechnicalEfficiencyNumber => record.technical_efficiency_number.map(|v| v.to_string()),
        Column::Issue => Some(record.issue.to_string()),
        Column::Expiry => Some(record.expiry.to_string()),
    }
}

fn window<T>(rows: Vec<T>, window: Window) -> Vec<T> {
    rows.into_iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .collect()
}

#[async_trait]
impl EmissionStore for MemoryStore {
    async fn count_records(&self) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.len() as u64)
    }

    async fn fetch_page(
        &self,
        order_by: Column,
        page: Window,
    ) -> Result<Vec<EmissionRecord>, sqlx::Error> {
        self.check()?;
        Ok(window(self.sorted(order_by), page))
    }

    async fn fetch_record(&self, imo: Imo) -> Result<Option<EmissionRecord>, sqlx::Error> {
        self.check()?;
        Ok(self.get(imo))
    }

    async fn insert_record(&self, record: &EmissionRecord) -> Result<InsertOutcome, sqlx::Error> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.imo) {
            return Ok(InsertOutcome::Duplicate);
        }
        records.insert(record.imo, record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn update_record(&self, imo: Imo, record: &EmissionRecord) -> Result<u64, sqlx::Error> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&imo) {
            Some(existing) => {
                *existing = EmissionRecord {
                    imo,
                    ..record.clone()
                };
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_record(&self, imo: Imo) -> Result<u64, sqlx::Error> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().remove(&imo).map_or(0, |_| 1))
    }

    async fn distinct_values(&self, column: Column) -> Result<Vec<String>, sqlx::Error> {
        self.check()?;
        self.distinct_queries.fetch_add(1, Ordering::SeqCst);
        let values: BTreeSet<String> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter_map(|r| column_text(r, column))
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn count_groups(&self, group_by: Column) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.groups(group_by).len() as u64)
    }

    async fn fetch_aggregates(
        &self,
        group_by: Column,
        page: Option<Window>,
    ) -> Result<Vec<AggregateRow>, sqlx::Error> {
        self.check()?;
        let rows: Vec<AggregateRow> = self
            .groups(group_by)
            .into_iter()
            .map(|(group_key, records)| {
                let values: Vec<f64> = records
                    .iter()
                    .filter_map(|r| r.technical_efficiency_number)
                    .collect();
                let count = records.len() as i64;
                let min = values.iter().copied().reduce(f64::min);
                let max = values.iter().copied().reduce(f64::max);
                let avg = (!values.is_empty())
                    .then(|| values.iter().sum::<f64>() / values.len() as f64);
                AggregateRow {
                    group_key,
                    count,
                    min,
                    avg,
                    max,
                }
            })
            .collect();
        Ok(match page {
            Some(page) => window(rows, page),
            None => rows,
        })
    }

    async fn fuel_performance(
        &self,
        _metric: FuelMetric,
    ) -> Result<Vec<FuelPerformanceRow>, sqlx::Error> {
        self.check()?;
        Ok(self.fuel_rows.clone())
    }

    async fn verifier_ranking(&self) -> Result<Vec<VerifierRankRow>, sqlx::Error> {
        self.check()?;
        Ok(self.verifier_rows.clone())
    }

    async fn built_year_percentiles(
        &self,
        _metric: EfficiencyMetric,
    ) -> Result<Vec<BuiltYearRow>, sqlx::Error> {
        self.check()?;
        Ok(self.built_year_rows.clone())
    }
}
