//! Data models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::EmissionsError;

/// International Maritime Organization (IMO) ship number
///
/// A unique seven-digit number identifying a ship. Primary key of the
/// emissions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Imo(i32);

impl Imo {
    pub const MIN: i64 = 1_111_111;
    pub const MAX: i64 = 9_999_999;

    /// Get the raw IMO value
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Imo {
    type Error = EmissionsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(EmissionsError::InvalidImo(value.to_string()));
        }
        Ok(Self(value as i32))
    }
}

impl TryFrom<&str> for Imo {
    type Error = EmissionsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed = value
            .trim()
            .parse::<i64>()
            .map_err(|_| EmissionsError::InvalidImo(value.to_string()))?;
        Self::try_from(parsed)
    }
}

impl std::fmt::Display for Imo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Columns of the emissions table
///
/// The only identifiers ever interpolated into SQL. Anything coming from a
/// request is parsed into this enum first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Imo,
    ShipName,
    #[serde(rename = "type")]
    Type,
    TechnicalEfficiencyNumber,
    Issue,
    Expiry,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Imo,
        Column::ShipName,
        Column::Type,
        Column::TechnicalEfficiencyNumber,
        Column::Issue,
        Column::Expiry,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Imo => "imo",
            Column::ShipName => "ship_name",
            Column::Type => "type",
            Column::TechnicalEfficiencyNumber => "technical_efficiency_number",
            Column::Issue => "issue",
            Column::Expiry => "expiry",
        }
    }

    pub fn parse(name: &str) -> Option<Column> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Parse a sort parameter, falling back to `imo` for unknown names
    pub fn parse_or_default(name: Option<&str>) -> Column {
        name.and_then(Self::parse).unwrap_or(Column::Imo)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ship CO2 emission compliance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmissionRecord {
    pub imo: Imo,
    pub ship_name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub ship_type: String,
    /// Energy Efficiency Design Index (EEDI), None if not reported
    pub technical_efficiency_number: Option<f64>,
    pub issue: NaiveDate,
    pub expiry: NaiveDate,
}

/// One entry of a selection input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Leading entry for "nothing selected"
    pub fn placeholder() -> Self {
        Self::new("", "---------")
    }
}

/// Per-group statistics over the EEDI column
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AggregateRow {
    pub group_key: Option<String>,
    pub count: i64,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

/// Fuel consumption vs. a chosen metric, rolled up by ship and engine type
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FuelPerformanceRow {
    pub ship_type: Option<String>,
    pub engine_type: Option<String>,
    pub metric: Option<f64>,
    pub fuel_consumption: Option<f64>,
    /// Natural logarithm of the number of ships in the group
    pub scaled_count: f64,
    pub label: String,
}

/// Monthly rank of a verifier by the average EEDI of certified ships
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VerifierRankRow {
    pub verifier_name: String,
    pub month_actual: i32,
    pub avg_eedi: Option<f64>,
    pub rank: i64,
}

/// Quartiles of an efficiency metric per build year
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BuiltYearRow {
    pub year_built: Option<i32>,
    pub percentile_25: Option<f64>,
    pub percentile_75: Option<f64>,
}

/// Y-axis options of the fuel performance chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FuelMetric {
    #[default]
    Eedi,
    Tonnage,
    Width,
    Length,
    Speed,
    SeaTime,
    Co2Distance,
    Co2Transport,
}

impl FuelMetric {
    pub const ALL: [FuelMetric; 8] = [
        FuelMetric::Eedi,
        FuelMetric::Tonnage,
        FuelMetric::Width,
        FuelMetric::Length,
        FuelMetric::Speed,
        FuelMetric::SeaTime,
        FuelMetric::Co2Distance,
        FuelMetric::Co2Transport,
    ];

    /// Qualified column expression in the reporting schema
    pub fn expression(&self) -> &'static str {
        match self {
            FuelMetric::Eedi => "f.eedi",
            FuelMetric::Tonnage => "s.tonnage",
            FuelMetric::Width => "s.width",
            FuelMetric::Length => "s.length",
            FuelMetric::Speed => "s.speed",
            FuelMetric::SeaTime => "f.sea_time",
            FuelMetric::Co2Distance => "f.co2_distance",
            FuelMetric::Co2Transport => "f.co2_transport",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FuelMetric::Eedi => "EEDI",
            FuelMetric::Tonnage => "Ship Tonnage Capacity",
            FuelMetric::Width => "Ship Width",
            FuelMetric::Length => "Ship Length",
            FuelMetric::Speed => "Ship Speed",
            FuelMetric::SeaTime => "Sea Time",
            FuelMetric::Co2Distance => "CO2 Distance",
            FuelMetric::Co2Transport => "CO2 Transport",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FuelMetric::Eedi => "EEDI",
            FuelMetric::Tonnage => "Tonnage",
            FuelMetric::Width => "Width",
            FuelMetric::Length => "Length",
            FuelMetric::Speed => "Speed",
            FuelMetric::SeaTime => "Sea Time",
            FuelMetric::Co2Distance => "CO2 Distance",
            FuelMetric::Co2Transport => "CO2 Transport",
        }
    }

    /// Parse a `y_axis` parameter; unknown values select EEDI
    pub fn parse_or_default(value: Option<&str>) -> FuelMetric {
        value
            .and_then(|v| Self::ALL.into_iter().find(|m| m.expression() == v))
            .unwrap_or_default()
    }
}

/// Y-axis options of the build year efficiency chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EfficiencyMetric {
    #[default]
    Eedi,
    Co2Distance,
    Co2Transport,
    FuelConsumption,
}

impl EfficiencyMetric {
    pub const ALL: [EfficiencyMetric; 4] = [
        EfficiencyMetric::Eedi,
        EfficiencyMetric::Co2Distance,
        EfficiencyMetric::Co2Transport,
        EfficiencyMetric::FuelConsumption,
    ];

    /// Column of `fact_table`
    pub fn column(&self) -> &'static str {
        match self {
            EfficiencyMetric::Eedi => "eedi",
            EfficiencyMetric::Co2Distance => "co2_distance",
            EfficiencyMetric::Co2Transport => "co2_transport",
            EfficiencyMetric::FuelConsumption => "fuel_consumption",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EfficiencyMetric::Eedi => "EEDI",
            EfficiencyMetric::Co2Distance => "CO2 Distance",
            EfficiencyMetric::Co2Transport => "CO2 Transport",
            EfficiencyMetric::FuelConsumption => "Fuel Consumption",
        }
    }

    pub fn parse_or_default(value: Option<&str>) -> EfficiencyMetric {
        value
            .and_then(|v| Self::ALL.into_iter().find(|m| m.column() == v))
            .unwrap_or_default()
    }
}
