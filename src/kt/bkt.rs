//! Simplified Bayesian Knowledge Tracing: an evidence step (Bayes' rule on the
//! observed answer, given slip and guess) followed by a learning transfer step.

use crate::constants::{MASTERY_CEILING, MASTERY_FLOOR};
use crate::kt::config::ModelConfig;

pub fn clamp_mastery(p: f64) -> f64 {
    p.clamp(MASTERY_FLOOR, MASTERY_CEILING)
}

/// P(mastered | observed answer).
pub fn evidence(prior: f64, is_correct: bool, config: &ModelConfig) -> f64 {
    let (known, unknown) = if is_correct {
        (
            prior * (1.0 - config.slip_rate),
            (1.0 - prior) * config.guess_rate,
        )
    } else {
        (
            prior * config.slip_rate,
            (1.0 - prior) * (1.0 - config.guess_rate),
        )
    };
    known / (known + unknown)
}

/// Posterior mastery after one answer, clamped to `[0.01, 0.99]`.
pub fn update(prior: f64, is_correct: bool, config: &ModelConfig) -> f64 {
    let p_evidence = evidence(clamp_mastery(prior), is_correct, config);
    let posterior = p_evidence + (1.0 - p_evidence) * config.learn_rate;
    clamp_mastery(posterior)
}
