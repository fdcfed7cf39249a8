/// Cosmetic completion estimate.
///
/// Three linear segments up to 500 decisions, then an exponential approach to
/// 100% that never gets there. The session never stops on its own; this only
/// tells the user how settled things probably are.
use serde::Serialize;

/// (decision count, percent) breakpoints of the linear part of the curve.
const SEGMENTS: [(f64, f64); 4] = [(0.0, 0.0), (120.0, 80.0), (300.0, 95.0), (500.0, 97.0)];

/// Decay constant of the tail beyond the last breakpoint.
const TAIL_SCALE: f64 = 500.0;

/// Highest value ever reported.
const CEILING: f64 = 99.99;

/// Encouragement messages keyed by the whole percent at which they unlock.
pub const ENCOURAGEMENTS: &[(u8, &str)] = &[
    (0, "Let's find out what drives you."),
    (10, "Trust your gut instinct."),
    (25, "Hard choices reveal true priorities."),
    (50, "Building a map of your soul..."),
    (80, "Core values identified. Refining details..."),
    (90, "High precision mode."),
    (95, "Excellent confidence. Stopping is allowed!"),
    (99, "Pure perfectionism now."),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub decisions: usize,
    /// In [0, 100).
    pub percent: f64,
    /// `percent` rounded down, as shown to the user.
    pub whole_percent: u8,
    pub message: &'static str,
}

/// Map a decision count onto [0, 100).
pub fn estimate_progress(total_decisions: usize) -> f64 {
    let n = total_decisions as f64;

    for w in SEGMENTS.windows(2) {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        if n < x1 {
            return y0 + (n - x0) / (x1 - x0) * (y1 - y0);
        }
    }

    let (x_last, y_last) = SEGMENTS[SEGMENTS.len() - 1];
    let tail = (100.0 - y_last) * (1.0 - (-(n - x_last) / TAIL_SCALE).exp());
    (y_last + tail).min(CEILING)
}

/// Message of the highest threshold already reached.
pub fn encouragement(whole_percent: u8) -> &'static str {
    ENCOURAGEMENTS
        .iter()
        .rev()
        .find(|(threshold, _)| whole_percent >= *threshold)
        .map(|(_, text)| *text)
        .unwrap_or(ENCOURAGEMENTS[0].1)
}

pub fn progress_for(total_decisions: usize) -> Progress {
    let percent = estimate_progress(total_decisions);
    let whole_percent = percent.floor() as u8;
    Progress {
        decisions: total_decisions,
        percent,
        whole_percent,
        message: encouragement(whole_percent),
    }
}
