//! Scoring model
//!
//! A fixed 10 → 64 → 32 → 1 network with frozen weights.

pub mod elo_net;

pub use elo_net::{EloNet, EloNetConfig, EloScorer, ScoringModel};
