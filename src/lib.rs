//! Tennis match prediction from historical Elo ratings
//!
//! Point-in-time Elo lookups (overall and per surface) feed a small frozen
//! feed-forward network. Each prediction is scored in both player orders and
//! renormalised into a probability pair.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod ratings;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rating assumed for a player with no observation on or before the query date
pub const DEFAULT_RATING: f32 = 1500.0;

/// Court surface with a dedicated one-hot slot in the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Surface {
    Clay,
    Hard,
    Grass,
    Carpet,
}

impl Surface {
    /// All encoded surfaces, in one-hot order
    pub const ALL: [Surface; 4] = [Surface::Clay, Surface::Hard, Surface::Grass, Surface::Carpet];

    pub fn name(&self) -> &'static str {
        match self {
            Surface::Clay => "Clay",
            Surface::Hard => "Hard",
            Surface::Grass => "Grass",
            Surface::Carpet => "Carpet",
        }
    }

    /// Exact-name lookup; anything else is an unencoded surface
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Clay" => Some(Surface::Clay),
            "Hard" => Some(Surface::Hard),
            "Grass" => Some(Surface::Grass),
            "Carpet" => Some(Surface::Carpet),
            _ => None,
        }
    }

    /// Position of this surface inside the one-hot block
    pub fn index(&self) -> usize {
        match self {
            Surface::Clay => 0,
            Surface::Hard => 1,
            Surface::Grass => 2,
            Surface::Carpet => 3,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single historical rating row
///
/// `surface` is `None` for overall ratings. Surface tags are kept verbatim
/// so that any surface present in the history can be looked up. A plain
/// date converts to midnight of that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingObservation {
    pub player: String,
    pub surface: Option<String>,
    pub recorded_at: NaiveDateTime,
    pub rating: f32,
}

impl RatingObservation {
    pub fn overall(
        player: impl Into<String>,
        recorded_at: impl Into<NaiveDateTime>,
        rating: f32,
    ) -> Self {
        RatingObservation {
            player: player.into(),
            surface: None,
            recorded_at: recorded_at.into(),
            rating,
        }
    }

    pub fn on_surface(
        player: impl Into<String>,
        surface: impl Into<String>,
        recorded_at: impl Into<NaiveDateTime>,
        rating: f32,
    ) -> Self {
        RatingObservation {
            player: player.into(),
            surface: Some(surface.into()),
            recorded_at: recorded_at.into(),
            rating,
        }
    }
}

/// Symmetrised match prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// P(first player wins)
    pub prob_a: f32,
    /// P(second player wins)
    pub prob_b: f32,
}

impl Prediction {
    /// Swap the two sides
    pub fn mirrored(&self) -> Self {
        Prediction {
            prob_a: self.prob_b,
            prob_b: self.prob_a,
        }
    }

    /// True when the first player is the favourite (ties go to the first player)
    pub fn favours_a(&self) -> bool {
        self.prob_a >= self.prob_b
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum TennisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model weights not found at {0}")]
    NoModel(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Degenerate inference: both orderings scored zero (forward={forward}, reverse={reverse})")]
    InferenceDegenerate { forward: f32, reverse: f32 },

    #[error("Prediction failed for {player_a} vs {player_b}: {source}")]
    PredictionFailed {
        player_a: String,
        player_b: String,
        #[source]
        source: Box<TennisError>,
    },
}

pub type Result<T> = std::result::Result<T, TennisError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV with `Player, Date, Rating`
    pub overall_ratings_path: String,
    /// CSV with `Player, Surface, Date, Rating`
    pub surface_ratings_path: String,
    /// Reference feature dataset (10 feature columns plus `label`)
    pub features_path: String,
    /// Burn record path, without the `.mpk` extension
    pub model_path: String,
    /// Cached normalization parameters (JSON)
    #[serde(default)]
    pub normalization_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                overall_ratings_path: "data/elo_history_2001_2025.csv".to_string(),
                surface_ratings_path: "data/elo_history_by_surface.csv".to_string(),
                features_path: "data/tennis_features_elo.csv".to_string(),
                model_path: "model/elo_model".to_string(),
                normalization_path: Some("model/normalization.json".to_string()),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TennisError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| TennisError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TennisError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
