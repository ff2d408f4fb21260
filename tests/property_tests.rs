use chrono::{Duration, FixedOffset, TimeZone};
use healthreport::derived::sleep_efficiency_percent;
use healthreport::rules::{select_tier, Tier};
use healthreport::{
    ids, Band, EvaluationEngine, MetricCatalog, Sample, SampleKind, Sex, SubjectContext,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Property-based checks over the rule tables and derived metrics

fn decimal(range: std::ops::Range<i64>) -> impl Strategy<Value = Decimal> {
    // Two decimal places are enough to hit every tier boundary
    range.prop_map(|cents| Decimal::new(cents, 2))
}

fn sex() -> impl Strategy<Value = Sex> {
    prop_oneof![
        Just(Sex::Male),
        Just(Sex::Female),
        Just(Sex::Other),
        Just(Sex::Unknown),
    ]
}

proptest! {
    #[test]
    fn evaluation_is_idempotent(
        index in 0usize..64,
        value in decimal(-1_000_00..20_000_00),
        sex in sex(),
        mass in proptest::option::of(decimal(0..200_00)),
    ) {
        let catalog = MetricCatalog::standard().unwrap();
        let definition = &catalog.definitions()[index % catalog.len()];
        let engine = EvaluationEngine::default();
        let context = SubjectContext::new(sex, mass);

        let first = engine.evaluate(definition.id, value, &context);
        let second = engine.evaluate(definition.id, value, &context);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn steps_tiers_follow_boundaries(steps in 0i64..30_000) {
        let engine = EvaluationEngine::default();
        let context = SubjectContext::new(Sex::Unknown, None);
        let evaluation = engine.evaluate(ids::STEPS, Decimal::from(steps), &context);

        let expected = if steps >= 8000 {
            Band::Good
        } else if steps >= 4000 {
            Band::Warn
        } else {
            Band::Bad
        };
        prop_assert_eq!(evaluation.band, expected);
    }

    #[test]
    fn selected_tier_has_greatest_lower_bound(
        bounds in proptest::collection::btree_set(0i64..1_000, 1..8),
        value in 0i64..1_200,
    ) {
        let bounds: Vec<i64> = bounds.into_iter().collect();
        let tiers: Vec<Tier> = bounds
            .iter()
            .map(|&lower| Tier::new(Decimal::from(lower), Band::Good, "tier", ""))
            .collect();

        let selected = select_tier(Decimal::from(value), &tiers).unwrap();
        let expected = bounds
            .iter()
            .rev()
            .find(|&&lower| lower <= value)
            .copied()
            .unwrap_or(bounds[0]);
        prop_assert_eq!(selected.lower, Decimal::from(expected));
    }

    #[test]
    fn sleep_efficiency_is_a_percentage(
        durations in proptest::collection::vec((0u8..3, 0i64..600), 0..20),
    ) {
        let tz = FixedOffset::east_opt(0).unwrap();
        let mut start = tz.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap();
        let samples: Vec<Sample> = durations
            .into_iter()
            .map(|(kind, minutes)| {
                let kind = match kind {
                    0 => SampleKind::InBed,
                    1 => SampleKind::Asleep,
                    _ => SampleKind::Awake,
                };
                let end = start + Duration::minutes(minutes);
                let sample = Sample::new(kind, start, end);
                start = end;
                sample
            })
            .collect();

        let efficiency = sleep_efficiency_percent(&samples);
        prop_assert!(efficiency >= Decimal::ZERO);
        prop_assert!(efficiency <= Decimal::from(100));
    }
}
