use rand::Rng;

use crate::kt::config::DifficultyPolicy;

/// Target difficulty for the next question.
///
/// The base level mirrors the current mastery on the `1..=max` scale; with
/// `stretch_probability` the level is pushed `stretch_step` above it so the
/// learner is probed slightly beyond the current estimate.
pub fn select_difficulty<R>(mastery: f64, policy: &DifficultyPolicy, rng: &mut R) -> u8
where
    R: Rng + ?Sized,
{
    let mastery = if mastery.is_nan() {
        0.0
    } else {
        mastery.clamp(0.0, 1.0)
    };

    let base = (mastery * f64::from(policy.max_difficulty)).ceil() as u8;
    let mut target = base.max(policy.min_difficulty);

    if rng.gen_bool(policy.stretch_probability) {
        target = target.saturating_add(policy.stretch_step);
    }

    target.min(policy.max_difficulty)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn policy(stretch_probability: f64) -> DifficultyPolicy {
        DifficultyPolicy {
            stretch_probability,
            ..DifficultyPolicy::default()
        }
    }

    #[test]
    fn zero_mastery_starts_at_minimum() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select_difficulty(0.0, &policy(0.0), &mut rng), 1);
        assert_eq!(select_difficulty(0.0, &policy(1.0), &mut rng), 2);
    }

    #[test]
    fn full_mastery_is_capped() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select_difficulty(1.0, &policy(0.0), &mut rng), 10);
        assert_eq!(select_difficulty(1.0, &policy(1.0), &mut rng), 10);
    }

    #[test]
    fn base_tracks_mastery_decile() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select_difficulty(0.15, &policy(0.0), &mut rng), 2);
        assert_eq!(select_difficulty(0.611, &policy(0.0), &mut rng), 7);
        assert_eq!(select_difficulty(0.99, &policy(0.0), &mut rng), 10);
        assert_eq!(select_difficulty(0.15, &policy(1.0), &mut rng), 3);
    }

    #[test]
    fn stretch_frequency_follows_policy() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = policy(0.7);
        let trials = 10_000;
        let stretched = (0..trials)
            .filter(|_| select_difficulty(0.3, &p, &mut rng) == 4)
            .count();
        let ratio = stretched as f64 / trials as f64;
        assert!((ratio - 0.7).abs() < 0.03, "ratio={ratio}");
    }

    #[test]
    fn same_seed_same_sequence() {
        let p = DifficultyPolicy::default();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let xs: Vec<u8> = (0..20).map(|_| select_difficulty(0.5, &p, &mut a)).collect();
        let ys: Vec<u8> = (0..20).map(|_| select_difficulty(0.5, &p, &mut b)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn nan_mastery_falls_back_to_minimum() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(select_difficulty(f64::NAN, &policy(0.0), &mut rng), 1);
    }
}
