//! SQLite storage for the rate and bracket tables.

mod decimal;
mod factory;
mod repository;

pub use decimal::{decimal_to_text, get_decimal, get_optional_decimal};
pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
