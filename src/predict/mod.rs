//! Prediction and inference
//!
//! Combine rating features, normalization and the scoring model into match
//! probabilities.

pub mod inference;

pub use inference::{format_prediction, parse_match_date, reconcile, Fixture, MatchPredictor};
