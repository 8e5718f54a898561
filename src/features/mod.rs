//! Feature extraction and normalization
//!
//! Converts rating history into model-ready input vectors.

pub mod normalization;
pub mod vector;

pub use normalization::{NormalizationParams, Normalizer};
pub use vector::{encode_surface, FeatureBuilder, FeatureVector, FEATURE_DIM};
