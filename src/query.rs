//! SQL statements for the emissions table and the reporting schema
//!
//! Identifiers only ever come from [`Column`], [`FuelMetric`] and
//! [`EfficiencyMetric`]; every value is a bind parameter.

use crate::models::{Column, EfficiencyMetric, FuelMetric};

pub const TABLE: &str = "co2emission_reduced";

/// Select list shared by every record query
const RECORD_COLUMNS: &str = "imo, ship_name, type, \
     technical_efficiency_number::float8 AS technical_efficiency_number, issue, expiry";

pub fn count_records() -> String {
    format!("SELECT COUNT(*) FROM {TABLE}")
}

/// One page ordered ascending by `order_by`. Binds: `$1` offset, `$2` limit.
pub fn select_page(order_by: Column) -> String {
    format!(
        "SELECT {RECORD_COLUMNS} FROM {TABLE} ORDER BY {}, imo OFFSET $1 LIMIT $2",
        order_by.name()
    )
}

/// Binds: `$1` imo.
pub fn select_record() -> String {
    format!("SELECT {RECORD_COLUMNS} FROM {TABLE} WHERE imo = $1")
}

/// Binds: `$1..$6` in [`Column::ALL`] order.
pub fn insert_record() -> String {
    let columns: Vec<&str> = Column::ALL.iter().map(Column::name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {TABLE} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Every column except the key. Binds: `$1..$5` values, `$6` imo.
pub fn update_record() -> String {
    let assignments: Vec<String> = Column::ALL
        .iter()
        .filter(|c| **c != Column::Imo)
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", c.name(), i + 1))
        .collect();
    format!(
        "UPDATE {TABLE} SET {} WHERE imo = ${}",
        assignments.join(", "),
        assignments.len() + 1
    )
}

/// Binds: `$1` imo.
pub fn delete_record() -> String {
    format!("DELETE FROM {TABLE} WHERE imo = $1")
}

pub fn distinct_values(column: Column) -> String {
    let name = column.name();
    format!("SELECT DISTINCT {name}::text FROM {TABLE} WHERE {name} IS NOT NULL ORDER BY 1")
}

/// Number of rows [`select_all_aggregates`] yields, NULL group included
pub fn count_groups(group_by: Column) -> String {
    format!(
        "SELECT COUNT(*) FROM (SELECT 1 FROM {TABLE} GROUP BY {}) g",
        group_by.name()
    )
}

fn aggregate_select(group_by: Column) -> String {
    let group = group_by.name();
    format!(
        "SELECT {group}::text AS group_key, \
         COUNT(imo) AS count, \
         MIN(technical_efficiency_number)::float8 AS min, \
         AVG(technical_efficiency_number)::float8 AS avg, \
         MAX(technical_efficiency_number)::float8 AS max \
         FROM {TABLE} GROUP BY {group} ORDER BY {group}"
    )
}

/// Statistics per group. Binds: `$1` offset, `$2` limit.
pub fn select_aggregates_page(group_by: Column) -> String {
    format!("{} OFFSET $1 LIMIT $2", aggregate_select(group_by))
}

pub fn select_all_aggregates(group_by: Column) -> String {
    aggregate_select(group_by)
}

/// Average metric and fuel consumption rolled up by ship type and engine type
pub fn fuel_performance(metric: FuelMetric) -> String {
    format!(
        "SELECT s.ship_type, s.engine_type, \
         ROUND(AVG({metric})::NUMERIC, 2)::float8 AS metric, \
         ROUND(AVG(f.fuel_consumption)::NUMERIC, 2)::float8 AS fuel_consumption, \
         LN(COUNT(*))::float8 AS scaled_count, \
         (CASE WHEN s.ship_type IS NULL AND s.engine_type IS NULL THEN 'Grand Total' \
          WHEN s.engine_type IS NULL THEN 'Subtotal ' || s.ship_type \
          ELSE s.ship_type || ' ' || s.engine_type END) AS label \
         FROM fact_table f, ship_dimension s \
         WHERE f.ship_key = s.ship_key \
         GROUP BY ROLLUP(s.ship_type, s.engine_type) \
         ORDER BY s.ship_type DESC, s.engine_type DESC",
        metric = metric.expression()
    )
}

/// Rank of each verifier per issue month by average EEDI, best first
pub fn verifier_ranking() -> String {
    "SELECT v.verifier_name, d.month_actual, \
     ROUND(AVG(f.eedi)::NUMERIC, 2)::float8 AS avg_eedi, \
     RANK() OVER (PARTITION BY d.month_actual ORDER BY ROUND(AVG(f.eedi)::NUMERIC, 2) ASC) AS rank \
     FROM fact_table f, verifiers v, d_date d \
     WHERE f.issue_date_key = d.date_dim_id AND f.verifier_key = v.verifier_key \
     GROUP BY v.verifier_name, d.month_actual \
     ORDER BY v.verifier_name, d.month_actual"
        .to_string()
}

/// 25th and 75th percentile of `metric` per build year
pub fn built_year_percentiles(metric: EfficiencyMetric) -> String {
    format!(
        "SELECT s.year_built, \
         ROUND(PERCENTILE_CONT(0.25) WITHIN GROUP (ORDER BY f.{metric} ASC)::NUMERIC, 2)::float8 AS percentile_25, \
         ROUND(PERCENTILE_CONT(0.75) WITHIN GROUP (ORDER BY f.{metric} ASC)::NUMERIC, 2)::float8 AS percentile_75 \
         FROM fact_table f, ship_dimension s \
         WHERE f.ship_key = s.ship_key \
         GROUP BY s.year_built \
         ORDER BY s.year_built",
        metric = metric.column()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_orders_by_column_with_bound_window() {
        let sql = select_page(Column::ShipName);
        assert!(sql.contains("ORDER BY ship_name, imo"));
        assert!(sql.ends_with("OFFSET $1 LIMIT $2"));
    }

    #[test]
    fn insert_binds_every_column() {
        assert_eq!(
            insert_record(),
            "INSERT INTO co2emission_reduced \
             (imo, ship_name, type, technical_efficiency_number, issue, expiry) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        );
    }

    #[test]
    fn update_never_sets_key() {
        let sql = update_record();
        assert_eq!(
            sql,
            "UPDATE co2emission_reduced SET ship_name = $1, type = $2, \
             technical_efficiency_number = $3, issue = $4, expiry = $5 WHERE imo = $6"
        );
        assert!(!sql.contains("imo = $1"));
    }

    #[test]
    fn aggregates_group_and_order_by_key() {
        let sql = select_aggregates_page(Column::Type);
        assert!(sql.contains("GROUP BY type ORDER BY type"));
        assert!(sql.contains("COUNT(imo) AS count"));
        assert!(sql.ends_with("OFFSET $1 LIMIT $2"));
        assert!(!select_all_aggregates(Column::Type).contains("OFFSET"));
    }

    #[test]
    fn group_count_includes_null_group() {
        assert_eq!(
            count_groups(Column::TechnicalEfficiencyNumber),
            "SELECT COUNT(*) FROM (SELECT 1 FROM co2emission_reduced \
             GROUP BY technical_efficiency_number) g"
        );
        assert!(!count_groups(Column::Type).contains("DISTINCT"));
    }

    #[test]
    fn reporting_queries_use_metric_expressions() {
        assert!(fuel_performance(FuelMetric::Speed).contains("AVG(s.speed)"));
        assert!(fuel_performance(FuelMetric::Eedi).contains("ROLLUP(s.ship_type, s.engine_type)"));
        let sql = built_year_percentiles(EfficiencyMetric::Co2Distance);
        assert!(sql.contains("ORDER BY f.co2_distance ASC"));
        assert!(verifier_ranking().contains("PARTITION BY d.month_actual"));
    }
}
