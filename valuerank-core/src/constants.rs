/// Rating every item starts with. Glicko scale, so 1500 is the neutral midpoint.
pub const INITIAL_RATING: f64 = 1500.0;

/// Rating deviation every item starts with (maximum uncertainty).
pub const INITIAL_RD: f64 = 350.0;

/// Floor for rating deviation. RD only shrinks, and never below this.
pub const MIN_RD: f64 = 50.0;

/// Multiplicative RD shrink applied to both items after every observation.
pub const RD_DECAY: f64 = 0.95;

/// Base K-factor before confidence, inference and volatility scaling.
pub const K_BASE: f64 = 40.0;

/// K multiplier for decisions made quickly (the user "knew" the answer).
pub const CONFIDENT_MULTIPLIER: f64 = 1.5;

/// K multiplier for decisions derived from transitive history rather than asked.
pub const INFERRED_MULTIPLIER: f64 = 0.5;

/// Divisor for the combined RD of a pair. Two fresh items (350 + 350) give a
/// volatility factor of exactly 1.0; two floored items give ~0.14.
pub const VOLATILITY_SCALE: f64 = 700.0;

/// Decisions recorded before matchmaking switches from discovery to tournament.
pub const DISCOVERY_CUTOFF: usize = 20;

/// A manual decision faster than this is treated as confident.
pub const CONFIDENT_THRESHOLD_MS: u64 = 3_000;

/// A manual decision slower than this is logged as a hard choice.
pub const HARD_CHOICE_THRESHOLD_MS: u64 = 10_000;

/// Current version of the persisted session layout. Sessions without a version
/// field are treated as version 0 (the original points-based layout).
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Built-in catalogue of personal values, used when no catalogue is supplied.
pub const DEFAULT_CATALOGUE: &[&str] = &[
    "Adventure", "Authenticity", "Balance", "Community", "Compassion",
    "Competence", "Contribution", "Creativity", "Curiosity", "Determination",
    "Fairness", "Faith", "Fame", "Family", "Freedom", "Friendship", "Fun",
    "Growth", "Happiness", "Health", "Honesty", "Humor", "Influence",
    "Inner Harmony", "Justice", "Kindness", "Knowledge", "Leadership",
    "Learning", "Love", "Loyalty", "Meaningful Work", "Openness", "Optimism",
    "Peace", "Pleasure", "Poise", "Popularity", "Recognition", "Religion",
    "Reputation", "Respect", "Responsibility", "Security", "Self-Respect",
    "Service", "Spirituality", "Stability", "Success", "Status",
    "Trustworthiness", "Wealth", "Wisdom",
];
