pub mod calculations;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod tables;

pub use db::repository::{RepositoryError, TaxRepository};
pub use engine::TaxEngine;
pub use models::*;
pub use tables::{TablesError, TaxTables};
