use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cognitrace_backend::kt::bkt;
use cognitrace_backend::kt::config::{DifficultyPolicy, ModelConfig};
use cognitrace_backend::kt::difficulty::select_difficulty;
use cognitrace_backend::kt::store::MasteryStore;
use cognitrace_backend::kt::types::Topic;

fn model_strategy() -> impl Strategy<Value = ModelConfig> {
    (0.01_f64..0.5, 0.01_f64..0.45, 0.01_f64..0.45).prop_map(|(learn, slip, guess)| ModelConfig {
        learn_rate: learn,
        slip_rate: slip,
        guess_rate: guess,
    })
}

fn topic_strategy() -> impl Strategy<Value = Topic> {
    (0usize..Topic::COUNT).prop_map(|i| Topic::ALL[i])
}

proptest! {
    #[test]
    fn pt_update_stays_in_bounds(
        prior in -1.0_f64..2.0,
        is_correct in any::<bool>(),
        model in model_strategy(),
    ) {
        let posterior = bkt::update(prior, is_correct, &model);
        prop_assert!((0.01..=0.99).contains(&posterior));
    }

    #[test]
    fn pt_correct_never_below_incorrect(prior in 0.0_f64..=1.0, model in model_strategy()) {
        let correct = bkt::update(prior, true, &model);
        let incorrect = bkt::update(prior, false, &model);
        prop_assert!(correct >= incorrect);
        if correct < 0.99 {
            prop_assert!(correct > incorrect);
        }
    }

    #[test]
    fn pt_correct_answer_raises_mastery(prior in 0.01_f64..=0.99, model in model_strategy()) {
        let posterior = bkt::update(prior, true, &model);
        prop_assert!(posterior >= prior);
        if posterior < 0.99 {
            prop_assert!(posterior > prior);
        }
    }

    #[test]
    fn pt_update_monotonic_in_prior(
        a in 0.0_f64..=1.0,
        b in 0.0_f64..=1.0,
        is_correct in any::<bool>(),
        model in model_strategy(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let p_lo = bkt::update(lo, is_correct, &model);
        let p_hi = bkt::update(hi, is_correct, &model);
        prop_assert!(p_lo <= p_hi + 1e-12);
    }

    #[test]
    fn pt_store_touches_only_target_topic(
        answers in prop::collection::vec((topic_strategy(), any::<bool>()), 0..40),
    ) {
        let model = ModelConfig::default();
        let mut store = MasteryStore::new(0.15);
        let mut counts = [0usize; Topic::COUNT];

        for (topic, is_correct) in &answers {
            let before = store.snapshot_all();
            let prior = store.get(*topic).mastery_level;
            store.apply_update(*topic, *is_correct, &model);
            counts[topic.index()] += 1;

            let after = store.snapshot_all();
            for other in Topic::ALL.iter().filter(|t| *t != topic) {
                prop_assert_eq!(before[other], after[other]);
            }
            prop_assert_eq!(after[topic], bkt::update(prior, *is_correct, &model));
        }

        for record in store.records() {
            prop_assert_eq!(record.history.len(), counts[record.topic.index()] + 1);
            let last = record.history.last().unwrap();
            prop_assert_eq!(last.value, record.mastery_level);
        }
        prop_assert_eq!(store.snapshot_all(), store.snapshot_all());
    }

    #[test]
    fn pt_difficulty_within_bounds(
        mastery in -0.5_f64..1.5,
        stretch in 0.0_f64..=1.0,
        seed in any::<u64>(),
    ) {
        let policy = DifficultyPolicy {
            stretch_probability: stretch,
            ..DifficultyPolicy::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let d = select_difficulty(mastery, &policy, &mut rng);
        prop_assert!((1..=10).contains(&d));

        let base = ((mastery.clamp(0.0, 1.0) * 10.0).ceil() as u8).max(1);
        prop_assert!(d == base || d == (base + 1).min(10));
    }
}
