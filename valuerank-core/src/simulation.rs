/// Offline accuracy simulations against a known ground truth.
///
/// Each trial hides a true order behind a shuffled catalogue, lets a simulated
/// user (who always prefers the truly better item) answer a fixed number of
/// decisions, then scores the resulting ranking. Two models are compared:
///   GlickoLite:  the real `RankingEngine`, inference and matchmaking included.
///   Accumulator: the legacy points tally (+2 confident win, +1 otherwise) with
///                fewest-matches-first pairing.
use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::engine::{EngineConfig, Presentation, RankingEngine};
use crate::error::{EngineError, Result};

/// True-rank gap above which the simulated user is usually confident.
const WIDE_GAP: usize = 10;
const P_CONFIDENT_WIDE: f64 = 0.8;
const P_CONFIDENT_NARROW: f64 = 0.4;

/// Think-times fed to the engine for simulated confident / unsure answers.
const CONFIDENT_ELAPSED_MS: u64 = 1_200;
const UNSURE_ELAPSED_MS: u64 = 6_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    GlickoLite,
    Accumulator,
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub num_items: usize,
    /// Decision budgets to evaluate, one report row each.
    pub match_counts: Vec<usize>,
    pub trials: usize,
    pub seed: u64,
    pub engine: EngineConfig,
}

/// Outcome of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    pub top1_correct: bool,
    /// How many of the top 3 by estimate are truly top 3.
    pub top3_correct: usize,
    pub top5_correct: usize,
    /// 1-based estimated position of the truly best item.
    pub true_winner_rank: usize,
}

/// Averages over all trials for one model at one decision budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyRow {
    pub matches: usize,
    pub top1_rate: f64,
    pub top3_avg: f64,
    pub top5_avg: f64,
    pub avg_winner_rank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model: Model,
    pub rows: Vec<AccuracyRow>,
}

/// Run every model at every decision budget.
pub fn simulate(config: &SimulationConfig) -> Result<Vec<ModelReport>> {
    if config.num_items < 2 {
        return Err(EngineError::DegenerateCatalogue(format!(
            "need at least 2 items to simulate, got {}",
            config.num_items
        )));
    }
    let mut reports = Vec::new();
    for model in [Model::Accumulator, Model::GlickoLite] {
        let mut rows = Vec::with_capacity(config.match_counts.len());
        for &matches in &config.match_counts {
            // Same seed per budget so both models face identical ground truths.
            let mut rng = SmallRng::seed_from_u64(config.seed ^ matches as u64);
            let mut results = Vec::with_capacity(config.trials);
            for _ in 0..config.trials {
                let result = match model {
                    Model::GlickoLite => run_engine_trial(config.num_items, matches, &config.engine, &mut rng)?,
                    Model::Accumulator => run_accumulator_trial(config.num_items, matches, &mut rng),
                };
                results.push(result);
            }
            rows.push(summarize(matches, &results));
        }
        reports.push(ModelReport { model, rows });
    }
    Ok(reports)
}

fn summarize(matches: usize, results: &[TrialResult]) -> AccuracyRow {
    let n = results.len().max(1) as f64;
    AccuracyRow {
        matches,
        top1_rate: results.iter().filter(|r| r.top1_correct).count() as f64 / n,
        top3_avg: results.iter().map(|r| r.top3_correct).sum::<usize>() as f64 / n,
        top5_avg: results.iter().map(|r| r.top5_correct).sum::<usize>() as f64 / n,
        avg_winner_rank: results.iter().map(|r| r.true_winner_rank).sum::<usize>() as f64 / n,
    }
}

/// Score an estimated order, given as true ranks (0 = best) from first to last.
fn score_order(estimated: &[usize]) -> TrialResult {
    let overlap = |k: usize| estimated.iter().take(k).filter(|&&t| t < k).count();
    TrialResult {
        top1_correct: estimated.first() == Some(&0),
        top3_correct: overlap(3),
        top5_correct: overlap(5),
        true_winner_rank: estimated.iter().position(|&t| t == 0).map_or(estimated.len(), |p| p + 1),
    }
}

fn simulated_confidence(true_a: usize, true_b: usize, rng: &mut impl Rng) -> bool {
    let p = if true_a.abs_diff(true_b) > WIDE_GAP { P_CONFIDENT_WIDE } else { P_CONFIDENT_NARROW };
    rng.random_bool(p)
}

/// Shuffled catalogue: names in presentation order plus each name's true rank.
fn ground_truth(num_items: usize, rng: &mut impl Rng) -> (Vec<String>, HashMap<String, usize>) {
    let mut true_ranks: Vec<usize> = (0..num_items).collect();
    true_ranks.shuffle(rng);
    let names: Vec<String> = (0..num_items).map(|i| format!("item-{i:03}")).collect();
    let truth = names.iter().cloned().zip(true_ranks).collect();
    (names, truth)
}

/// One trial through the real engine.
fn run_engine_trial(
    num_items: usize,
    matches: usize,
    engine_config: &EngineConfig,
    rng: &mut impl Rng,
) -> Result<TrialResult> {
    let (names, truth) = ground_truth(num_items, rng);
    let mut engine = RankingEngine::new(&names, engine_config.clone())?;

    while engine.decisions().len() < matches {
        if let Presentation::Choose(pair) = engine.next_pair() {
            let (tl, tr) = (truth[&pair.left], truth[&pair.right]);
            let side = if tl < tr { 0 } else { 1 };
            let elapsed = if simulated_confidence(tl, tr, rng) { CONFIDENT_ELAPSED_MS } else { UNSURE_ELAPSED_MS };
            engine.submit_decision(pair.id, side, elapsed)?;
        }
    }

    let estimated: Vec<usize> = engine.rankings().iter().map(|r| truth[&r.name]).collect();
    Ok(score_order(&estimated))
}

/// One trial of the legacy points tally. Needs at least 2 items.
fn run_accumulator_trial(num_items: usize, matches: usize, rng: &mut impl Rng) -> TrialResult {
    let mut true_rank: Vec<usize> = (0..num_items).collect();
    true_rank.shuffle(rng);
    let mut score = vec![0u32; num_items];
    let mut played = vec![0u32; num_items];
    let mut faced = vec![vec![false; num_items]; num_items];

    for _ in 0..matches {
        // Fewest matches first, random among equals.
        let mut candidates: Vec<usize> = (0..num_items).collect();
        candidates.shuffle(rng);
        candidates.sort_by_key(|&i| played[i]);

        let p1 = candidates[0];
        let p2 = candidates[1..]
            .iter()
            .copied()
            .find(|&c| !faced[p1][c])
            .unwrap_or_else(|| candidates[1]);

        let (winner, loser) = if true_rank[p1] < true_rank[p2] { (p1, p2) } else { (p2, p1) };
        score[winner] += if simulated_confidence(true_rank[p1], true_rank[p2], rng) { 2 } else { 1 };
        played[p1] += 1;
        played[p2] += 1;
        faced[winner][loser] = true;
        faced[loser][winner] = true;
    }

    let mut order: Vec<usize> = (0..num_items).collect();
    order.shuffle(rng);
    order.sort_by(|&a, &b| score[b].cmp(&score[a]));
    let estimated: Vec<usize> = order.into_iter().map(|i| true_rank[i]).collect();
    score_order(&estimated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(match_counts: Vec<usize>) -> SimulationConfig {
        SimulationConfig {
            num_items: 10,
            match_counts,
            trials: 20,
            seed: 42,
            engine: EngineConfig::default(),
        }
    }

    #[test]
    fn test_score_order() {
        let r = score_order(&[0, 2, 1, 5, 3, 4]);
        assert!(r.top1_correct);
        assert_eq!(r.top3_correct, 3);
        assert_eq!(r.top5_correct, 4);
        assert_eq!(r.true_winner_rank, 1);

        let r = score_order(&[3, 4, 0]);
        assert!(!r.top1_correct);
        assert_eq!(r.true_winner_rank, 3);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let a = simulate(&config(vec![30])).unwrap();
        let b = simulate(&config(vec![30])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].rows.len(), 1);
    }

    #[test]
    fn test_engine_finds_the_winner_with_full_coverage() {
        // 10 items have 45 pairs; 60 decisions covers all of them.
        let reports = simulate(&config(vec![60])).unwrap();
        let glicko = reports.iter().find(|r| r.model == Model::GlickoLite).unwrap();
        let row = &glicko.rows[0];
        assert!(row.top1_rate >= 0.5, "top-1 rate {:.2} too low", row.top1_rate);
        assert!(row.avg_winner_rank < 3.0, "winner rank {:.2} too high", row.avg_winner_rank);
    }

    #[test]
    fn test_engine_trial_spends_exact_budget() {
        let mut rng = SmallRng::seed_from_u64(7);
        let result = run_engine_trial(6, 12, &EngineConfig::default(), &mut rng).unwrap();
        assert!(result.true_winner_rank >= 1 && result.true_winner_rank <= 6);
    }

    #[test]
    fn test_simulate_rejects_single_item() {
        for num_items in [0, 1] {
            let cfg = SimulationConfig { num_items, ..config(vec![5]) };
            assert!(matches!(simulate(&cfg), Err(EngineError::DegenerateCatalogue(_))));
        }
    }

    #[test]
    fn test_accumulator_trial_bounds() {
        let mut rng = SmallRng::seed_from_u64(7);
        let result = run_accumulator_trial(8, 20, &mut rng);
        assert!(result.top3_correct <= 3);
        assert!(result.top5_correct <= 5);
        assert!(result.true_winner_rank >= 1 && result.true_winner_rank <= 8);
    }
}
