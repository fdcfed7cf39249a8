/// Glicko-lite rating model.
///
/// An Elo update whose K-factor is scaled by the pair's combined rating
/// deviation, with RD shrinking geometrically per observation. Not a Bayesian
/// Glicko: RD never grows back and there is no rating period.
use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIDENT_MULTIPLIER, INFERRED_MULTIPLIER, INITIAL_RATING, INITIAL_RD, K_BASE, MIN_RD,
    RD_DECAY, VOLATILITY_SCALE,
};
use crate::types::Item;

/// Tunables for the rating model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub k_base: f64,
    pub confident_multiplier: f64,
    pub inferred_multiplier: f64,
    pub rd_decay: f64,
    pub min_rd: f64,
    pub volatility_scale: f64,
    pub initial_rating: f64,
    pub initial_rd: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        RatingConfig {
            k_base: K_BASE,
            confident_multiplier: CONFIDENT_MULTIPLIER,
            inferred_multiplier: INFERRED_MULTIPLIER,
            rd_decay: RD_DECAY,
            min_rd: MIN_RD,
            volatility_scale: VOLATILITY_SCALE,
            initial_rating: INITIAL_RATING,
            initial_rd: INITIAL_RD,
        }
    }
}

/// What a single update did. `delta` was added to the winner and subtracted
/// from the loser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub k: f64,
    pub expected: f64,
    pub delta: f64,
}

/// Standard logistic (Elo) probability that `rating_a` beats `rating_b`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((rating_b - rating_a) / 400.0))
}

impl RatingConfig {
    /// Effective K for one observation between the two items.
    pub fn effective_k(&self, winner: &Item, loser: &Item, is_confident: bool, is_inferred: bool) -> f64 {
        let mut k = self.k_base;
        if is_confident {
            k *= self.confident_multiplier;
        }
        if is_inferred {
            k *= self.inferred_multiplier;
        }
        let volatility = (winner.rd + loser.rd) / self.volatility_scale;
        k * volatility
    }

    /// Apply one observed preference, mutating both items in place.
    ///
    /// Zero-sum on rating. Both RDs shrink by `rd_decay`, floored at `min_rd`.
    pub fn apply_result(
        &self,
        winner: &mut Item,
        loser: &mut Item,
        is_confident: bool,
        is_inferred: bool,
    ) -> RatingUpdate {
        let k = self.effective_k(winner, loser, is_confident, is_inferred);
        let expected = expected_score(winner.rating, loser.rating);
        let delta = k * (1.0 - expected);

        winner.rating += delta;
        loser.rating -= delta;

        winner.rd = self.decay_rd(winner.rd);
        loser.rd = self.decay_rd(loser.rd);

        RatingUpdate { k, expected, delta }
    }

    fn decay_rd(&self, rd: f64) -> f64 {
        // min() keeps an RD that was already below the floor from growing back.
        (rd * self.rd_decay).max(self.min_rd).min(rd)
    }
}
