//! Emissions recorder utility
//!
//! Prints one report as JSON: `list [page] [order_by]`, `aggregation [page] [group_by]`,
//! `visual`, `fuel [y_axis]`, `verifiers`, `built-year [y_axis]` or
//! `choices <column>`.

use emissions_recorder::{
    config::AppConfig, models::Column, Database, EmissionsError, EmissionsService,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), EmissionsError> {
    #[cfg(feature = "dotenv")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let db = Database::from_config(&config.database).await?;
    let service = EmissionsService::from_config(db, &config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg = |i: usize| args.get(i).map(String::as_str);
    let page = |i: usize| arg(i).and_then(|p| p.parse::<i64>().ok()).unwrap_or(1);

    let report = match arg(0).unwrap_or("list") {
        "list" => serde_json::to_value(service.emissions_page(page(1), arg(2), None).await?)?,
        "aggregation" => serde_json::to_value(service.aggregation_page(page(1), arg(2)).await?)?,
        "visual" => serde_json::to_value(service.visual().await?)?,
        "fuel" => serde_json::to_value(service.fuel_performance(arg(1)).await?)?,
        "verifiers" => serde_json::to_value(service.verifiers_ranking().await?)?,
        "built-year" => serde_json::to_value(service.built_year_efficiency(arg(1)).await?)?,
        "choices" => {
            let column = arg(1).and_then(Column::parse).ok_or_else(|| {
                EmissionsError::ConfigurationError {
                    message: format!("Unknown column: {}", arg(1).unwrap_or("")),
                }
            })?;
            serde_json::to_value(service.choices(column).await?)?
        }
        other => {
            error!("Unknown report: {}", other);
            return Err(EmissionsError::ConfigurationError {
                message: format!("Unknown report: {other}"),
            });
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!("Report complete");

    Ok(())
}
