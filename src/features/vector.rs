//! Match feature vector construction
//!
//! Layout (positional, shared with the normalization parameters and the
//! network input):
//!
//! | idx | feature            |
//! |-----|--------------------|
//! | 0   | p1 overall Elo     |
//! | 1   | p2 overall Elo     |
//! | 2   | p1 surface Elo     |
//! | 3   | p2 surface Elo     |
//! | 4   | overall diff p1-p2 |
//! | 5   | surface diff p1-p2 |
//! | 6-9 | Clay/Hard/Grass/Carpet one-hot |

use chrono::NaiveDate;

use crate::ratings::RatingStore;
use crate::Surface;

/// Number of model input features
pub const FEATURE_DIM: usize = 10;

/// One-hot surface block; unrecognised surfaces encode as all zeros
pub fn encode_surface(surface: &str) -> [f32; 4] {
    let mut one_hot = [0.0; 4];
    if let Some(s) = Surface::from_name(surface) {
        one_hot[s.index()] = 1.0;
    }
    one_hot
}

/// Features for an ordered player pair at a date and surface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureVector {
    pub p1_elo: f32,
    pub p2_elo: f32,
    pub p1_surface_elo: f32,
    pub p2_surface_elo: f32,
    pub elo_diff: f32,
    pub surface_elo_diff: f32,
    pub surface: [f32; 4],
}

impl FeatureVector {
    pub fn to_array(&self) -> [f32; FEATURE_DIM] {
        [
            self.p1_elo,
            self.p2_elo,
            self.p1_surface_elo,
            self.p2_surface_elo,
            self.elo_diff,
            self.surface_elo_diff,
            self.surface[0],
            self.surface[1],
            self.surface[2],
            self.surface[3],
        ]
    }
}

/// Builds feature vectors from a rating store
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder<'a> {
    store: &'a RatingStore,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(store: &'a RatingStore) -> Self {
        FeatureBuilder { store }
    }

    /// Feature vector for `p1` vs `p2` as of `date` on `surface`
    pub fn build(&self, p1: &str, p2: &str, date: NaiveDate, surface: &str) -> FeatureVector {
        let p1_elo = self.store.overall(p1).latest_rating_at(date);
        let p2_elo = self.store.overall(p2).latest_rating_at(date);
        let p1_surface_elo = self.store.surface(p1, surface).latest_rating_at(date);
        let p2_surface_elo = self.store.surface(p2, surface).latest_rating_at(date);

        FeatureVector {
            p1_elo,
            p2_elo,
            p1_surface_elo,
            p2_surface_elo,
            elo_diff: p1_elo - p2_elo,
            surface_elo_diff: p1_surface_elo - p2_surface_elo,
            surface: encode_surface(surface),
        }
    }
}
