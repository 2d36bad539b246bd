//! Property-based tests for mastery updates.

use proptest::prelude::*;

use crate::core::mastery::{update_mastery, OBSERVATION_WEIGHT, PRIOR_WEIGHT};

proptest! {
    #[test]
    fn update_stays_in_unit_interval(prior in prop::option::of(prop::num::f64::ANY), score in prop::num::f64::ANY) {
        let updated = update_mastery(prior, score);
        prop_assert!((0.0..=1.0).contains(&updated), "{updated} out of range");
    }

    #[test]
    fn update_lies_between_prior_and_score(prior in 0.0f64..=1.0, score in 0.0f64..=1.0) {
        let updated = update_mastery(Some(prior), score);
        let lo = prior.min(score) - 1e-12;
        let hi = prior.max(score) + 1e-12;
        prop_assert!(updated >= lo && updated <= hi);
        prop_assert!((updated - (PRIOR_WEIGHT * prior + OBSERVATION_WEIGHT * score)).abs() < 1e-12);
    }

    #[test]
    fn first_observation_is_taken_as_is(score in 0.0f64..=1.0) {
        prop_assert_eq!(update_mastery(None, score), score);
    }
}
