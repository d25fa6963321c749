//! Ship CO2 emission compliance records: paged listing, validated editing,
//! grouped statistics and chart data over PostgreSQL.

pub mod cache;
pub mod charts;
pub mod config;
pub mod database;
pub mod editor;
pub mod errors;
pub mod models;
pub mod pager;
pub mod query;
pub mod service;
pub mod store;
pub mod validation;

pub use database::Database;
pub use errors::{EditError, EmissionsError};
pub use service::EmissionsService;
