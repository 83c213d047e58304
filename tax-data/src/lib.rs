//! CSV loaders for the administrative rate and bracket tables.

mod loader;

pub use loader::{
    BracketLoader, BracketLoaderError, BracketRecord, RateLoader, RateLoaderError, RateRecord,
};
