//! Data ingestion
//!
//! CSV readers for rating histories and the reference feature dataset.

pub mod loader;

pub use loader::{
    load_fixtures, load_normalization_params, load_rating_store, load_reference_features, parse_timestamp,
};
