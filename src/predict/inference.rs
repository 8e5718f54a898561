//! Symmetrised match inference

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::features::{FeatureBuilder, Normalizer};
use crate::model::ScoringModel;
use crate::ratings::RatingStore;
use crate::{Prediction, Result, TennisError};

/// A match to predict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub player_a: String,
    pub player_b: String,
    pub date: NaiveDate,
    pub surface: String,
}

/// Predictor for making match predictions
///
/// Holds the rating store, normalization and scoring model as immutable
/// state; each call to [`MatchPredictor::predict`] is independent, so a
/// shared `&MatchPredictor` can serve several threads without locking.
pub struct MatchPredictor<S: ScoringModel> {
    store: RatingStore,
    normalizer: Normalizer,
    scorer: S,
}

impl<S: ScoringModel> MatchPredictor<S> {
    pub fn new(store: RatingStore, normalizer: Normalizer, scorer: S) -> Self {
        MatchPredictor {
            store,
            normalizer,
            scorer,
        }
    }

    /// Predict `player_a` vs `player_b` on `date` and `surface`
    ///
    /// Scores both player orders and renormalises so the two probabilities
    /// sum to one.
    pub fn predict(
        &self,
        player_a: &str,
        player_b: &str,
        date: NaiveDate,
        surface: &str,
    ) -> Result<Prediction> {
        let player_a = player_a.trim();
        let player_b = player_b.trim();
        if player_a.is_empty() || player_b.is_empty() {
            return Err(TennisError::MalformedInput(
                "Player names must not be empty".to_string(),
            ));
        }

        let failed = |source: TennisError| TennisError::PredictionFailed {
            player_a: player_a.to_string(),
            player_b: player_b.to_string(),
            source: Box::new(source),
        };

        let forward = self
            .score_ordered(player_a, player_b, date, surface)
            .map_err(failed)?;
        let reverse = self
            .score_ordered(player_b, player_a, date, surface)
            .map_err(failed)?;

        log::debug!(
            "{} vs {} on {} ({}): forward={:.4}, reverse={:.4}",
            player_a,
            player_b,
            date,
            surface,
            forward,
            reverse
        );

        reconcile(forward, reverse)
    }

    /// Predict a fixture
    pub fn predict_fixture(&self, fixture: &Fixture) -> Result<Prediction> {
        self.predict(
            &fixture.player_a,
            &fixture.player_b,
            fixture.date,
            &fixture.surface,
        )
    }

    /// Predict multiple fixtures; each one fails independently
    pub fn predict_batch(&self, fixtures: &[Fixture]) -> Vec<Result<Prediction>> {
        fixtures.iter().map(|f| self.predict_fixture(f)).collect()
    }

    /// Raw model score for the ordered pair, before symmetrisation
    pub fn score_ordered(
        &self,
        first: &str,
        second: &str,
        date: NaiveDate,
        surface: &str,
    ) -> Result<f32> {
        let features = FeatureBuilder::new(&self.store).build(first, second, date, surface);
        let normalized = self.normalizer.transform(&features);
        let score = self.scorer.score(&normalized)?;

        if !(0.0..=1.0).contains(&score) {
            return Err(TennisError::Model(format!(
                "Score {} outside [0, 1]",
                score
            )));
        }
        Ok(score)
    }

    pub fn store(&self) -> &RatingStore {
        &self.store
    }
}

/// Combine the two ordered scores into a probability pair
///
/// `prob_a = forward / (forward + reverse)`. Fails with
/// [`TennisError::InferenceDegenerate`] when both scores are zero.
pub fn reconcile(forward: f32, reverse: f32) -> Result<Prediction> {
    let total = forward + reverse;
    if total <= 0.0 || !total.is_finite() {
        return Err(TennisError::InferenceDegenerate { forward, reverse });
    }
    Ok(Prediction {
        prob_a: forward / total,
        prob_b: reverse / total,
    })
}

/// Parse a caller-supplied match date (`YYYY-MM-DD`)
///
/// Times of day are rejected: lookups always happen at the start of the day.
pub fn parse_match_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| TennisError::MalformedInput(format!("Invalid match date '{}'", s)))
}

/// Format a prediction for display
pub fn format_prediction(
    pred: &Prediction,
    player_a: &str,
    player_b: &str,
    date: NaiveDate,
    surface: &str,
) -> String {
    let favourite = if pred.favours_a() { player_a } else { player_b };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
│  {} on {}
├─────────────────────────────────────────────────┤
│  {} win chance:  {:.2}%
│  {} win chance:  {:.2}%
│  Favourite:      {}
└─────────────────────────────────────────────────┘
"#,
        player_a,
        player_b,
        surface,
        date,
        player_a,
        pred.prob_a * 100.0,
        player_b,
        pred.prob_b * 100.0,
        favourite
    )
}
