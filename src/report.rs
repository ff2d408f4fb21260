//! Builds the ordered section model from readings and derived values

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::catalog::{ids, MetricCatalog, MetricDefinition, MetricSource};
use crate::derived::{DerivedKind, DerivedMetrics};
use crate::evaluation::EvaluationEngine;
use crate::models::{Evaluation, MetricEntry, RawReadings, Section, SectionKind, SubjectContext};

pub const NO_DATA: &str = "Données non disponibles";

/// Values an entry may draw on
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub readings: &'a RawReadings,
    pub derived: &'a DerivedMetrics,
    pub context: &'a SubjectContext,
}

/// Build one section per requested kind, in the order given
///
/// Sections are never dropped for missing data. An entry whose value is
/// unavailable is kept with value `0` and an `unmeasured` evaluation. Kinds
/// absent from the catalog are skipped.
pub fn build_sections(
    catalog: &MetricCatalog,
    engine: &EvaluationEngine,
    inputs: ReportInputs<'_>,
    kinds: &[SectionKind],
) -> Vec<Section> {
    kinds
        .iter()
        .filter_map(|&kind| catalog.section(kind))
        .map(|layout| Section {
            kind: layout.kind,
            title: layout.kind.title().to_string(),
            entries: layout
                .metric_ids
                .iter()
                .filter_map(|id| catalog.get(id))
                .map(|definition| build_entry(definition, engine, inputs))
                .collect(),
        })
        .collect()
}

/// Evaluate a single catalog metric
pub fn build_entry(
    definition: &MetricDefinition,
    engine: &EvaluationEngine,
    inputs: ReportInputs<'_>,
) -> MetricEntry {
    let (value, evaluation) = match resolve_value(definition, inputs) {
        Some(value) => (value, engine.evaluate(definition.id, value, inputs.context)),
        None if definition.source == MetricSource::NotTracked => (
            Decimal::ZERO,
            engine.evaluate(definition.id, Decimal::ZERO, inputs.context),
        ),
        None => {
            debug!(metric = definition.id, "No value available, entry degraded");
            (Decimal::ZERO, Evaluation::unmeasured(NO_DATA))
        }
    };

    MetricEntry {
        definition: definition.clone(),
        value,
        evaluation,
    }
}

/// Value in display units, `None` when the metric has nothing to show
pub fn resolve_value(definition: &MetricDefinition, inputs: ReportInputs<'_>) -> Option<Decimal> {
    match definition.source {
        MetricSource::Reading => {
            let raw = inputs.readings.get(definition.id)?;
            let scaled = raw.checked_mul(definition.scale);
            if scaled.is_none() {
                warn!(metric = definition.id, raw = %raw, "Reading out of range, entry degraded");
            }
            scaled
        }
        MetricSource::Derived(DerivedKind::LatestSteps) => inputs
            .derived
            .value(DerivedKind::LatestSteps)
            .or_else(|| inputs.readings.get(ids::STEPS).copied()),
        MetricSource::Derived(kind) => inputs.derived.value(kind),
        MetricSource::NotTracked => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::LookbackConfig;
    use crate::models::{Band, Sex};
    use rust_decimal_macros::dec;

    fn empty_derived(context: &SubjectContext) -> DerivedMetrics {
        DerivedMetrics::compute(&[], &[], context, None, &LookbackConfig::default())
    }

    #[test]
    fn test_sections_follow_requested_order() {
        let catalog = MetricCatalog::standard().unwrap();
        let engine = EvaluationEngine::default();
        let readings = RawReadings::new();
        let context = SubjectContext::default();
        let derived = empty_derived(&context);
        let inputs = ReportInputs { readings: &readings, derived: &derived, context: &context };

        let sections = build_sections(&catalog, &engine, inputs, &SectionKind::DEFAULT_ORDER);
        let kinds: Vec<SectionKind> = sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::DEFAULT_ORDER.to_vec());

        // No data at all still yields every entry, unmeasured
        let total: usize = sections.iter().map(|s| s.entries.len()).sum();
        assert_eq!(total, 27);
        assert!(sections
            .iter()
            .flat_map(|s| &s.entries)
            .all(|e| e.evaluation.band == Band::Unmeasured && e.value.is_zero()));
    }

    #[test]
    fn test_entries_preserve_catalog_order() {
        let catalog = MetricCatalog::standard().unwrap();
        let engine = EvaluationEngine::default();
        let readings = RawReadings::new();
        let context = SubjectContext::default();
        let derived = empty_derived(&context);
        let inputs = ReportInputs { readings: &readings, derived: &derived, context: &context };

        let sections = build_sections(&catalog, &engine, inputs, &[SectionKind::Sleep]);
        let ids: Vec<&str> = sections[0].entries.iter().map(|e| e.definition.id).collect();
        assert_eq!(ids, vec![ids::SLEEP_DURATION, ids::SLEEP_EFFICIENCY, ids::BEDTIME, ids::AWAKENINGS]);
    }

    #[test]
    fn test_scaled_reading_is_evaluated_in_display_units() {
        let catalog = MetricCatalog::standard().unwrap();
        let engine = EvaluationEngine::default();
        let mut readings = RawReadings::new();
        readings.insert(ids::BODY_FAT.to_string(), dec!(0.22));
        readings.insert(ids::OXYGEN_SATURATION.to_string(), dec!(0.97));
        let context = SubjectContext::new(Sex::Female, None);
        let derived = empty_derived(&context);
        let inputs = ReportInputs { readings: &readings, derived: &derived, context: &context };

        let body_fat = build_entry(catalog.get(ids::BODY_FAT).unwrap(), &engine, inputs);
        assert_eq!(body_fat.value, dec!(22));
        assert_eq!(body_fat.evaluation.band, Band::Good);

        let spo2 = build_entry(catalog.get(ids::OXYGEN_SATURATION).unwrap(), &engine, inputs);
        assert_eq!(spo2.evaluation.band, Band::Good);
    }

    #[test]
    fn test_overflowing_reading_degrades_to_no_data() {
        let catalog = MetricCatalog::standard().unwrap();
        let engine = EvaluationEngine::default();
        let mut readings = RawReadings::new();
        readings.insert(ids::BODY_FAT.to_string(), Decimal::MAX);
        let context = SubjectContext::new(Sex::Female, None);
        let derived = empty_derived(&context);
        let inputs = ReportInputs { readings: &readings, derived: &derived, context: &context };

        let body_fat = build_entry(catalog.get(ids::BODY_FAT).unwrap(), &engine, inputs);
        assert_eq!(body_fat.value, Decimal::ZERO);
        assert_eq!(body_fat.evaluation.band, Band::Unmeasured);
        assert_eq!(body_fat.evaluation.message, NO_DATA);
    }

    #[test]
    fn test_measured_zero_is_evaluated() {
        let catalog = MetricCatalog::standard().unwrap();
        let engine = EvaluationEngine::default();
        let mut readings = RawReadings::new();
        readings.insert(ids::WATER.to_string(), Decimal::ZERO);
        let context = SubjectContext::default();
        let derived = empty_derived(&context);
        let inputs = ReportInputs { readings: &readings, derived: &derived, context: &context };

        let water = build_entry(catalog.get(ids::WATER).unwrap(), &engine, inputs);
        assert_eq!(water.evaluation.band, Band::Bad);
    }

    #[test]
    fn test_steps_fall_back_to_reading() {
        let catalog = MetricCatalog::standard().unwrap();
        let engine = EvaluationEngine::default();
        let mut readings = RawReadings::new();
        readings.insert(ids::STEPS.to_string(), dec!(9000));
        let context = SubjectContext::default();
        let derived = empty_derived(&context);
        let inputs = ReportInputs { readings: &readings, derived: &derived, context: &context };

        let steps = build_entry(catalog.get(ids::STEPS).unwrap(), &engine, inputs);
        assert_eq!(steps.value, dec!(9000));
        assert!(steps.evaluation.message.starts_with("Actif"));
    }

    #[test]
    fn test_not_tracked_metric_uses_rule_message() {
        let catalog = MetricCatalog::standard().unwrap();
        let engine = EvaluationEngine::default();
        let mut readings = RawReadings::new();
        readings.insert(ids::BLOOD_PRESSURE.to_string(), dec!(120));
        let context = SubjectContext::default();
        let derived = empty_derived(&context);
        let inputs = ReportInputs { readings: &readings, derived: &derived, context: &context };

        let bp = build_entry(catalog.get(ids::BLOOD_PRESSURE).unwrap(), &engine, inputs);
        assert_eq!(bp.value, Decimal::ZERO);
        assert_eq!(bp.evaluation.band, Band::Unmeasured);
        assert_eq!(bp.evaluation.message, "Non mesuré");
    }
}
