//! Static registry of metric definitions and their section assignment
//!
//! The catalog is loaded once and validated up front: duplicate ids or a
//! section referencing an unknown metric fail fast with [`CatalogError`]
//! before any report is built.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;

use crate::derived::DerivedKind;
use crate::error::CatalogError;
use crate::models::SectionKind;

/// Metric identifiers used by the standard catalog and snapshot readings
pub mod ids {
    pub const HEART_RATE: &str = "heart_rate";
    pub const RESTING_HEART_RATE: &str = "resting_heart_rate";
    pub const OXYGEN_SATURATION: &str = "oxygen_saturation";
    pub const BLOOD_PRESSURE: &str = "blood_pressure";
    pub const STEPS: &str = "steps";
    pub const WALKING_DISTANCE: &str = "walking_distance";
    pub const ACTIVE_ENERGY: &str = "active_energy";
    pub const EXERCISE_TIME: &str = "exercise_time";
    pub const STAND_TIME: &str = "stand_time";
    pub const BMI: &str = "bmi";
    pub const BODY_FAT: &str = "body_fat";
    pub const WAIST_CIRCUMFERENCE: &str = "waist_circumference";
    pub const MUSCLE_MASS: &str = "muscle_mass";
    pub const WATER: &str = "water";
    pub const CARBOHYDRATES: &str = "carbohydrates";
    pub const PROTEIN: &str = "protein";
    pub const FAT: &str = "fat";
    pub const SUGAR: &str = "sugar";
    pub const CAFFEINE: &str = "caffeine";
    pub const SLEEP_DURATION: &str = "sleep_duration";
    pub const SLEEP_EFFICIENCY: &str = "sleep_efficiency";
    pub const BEDTIME: &str = "bedtime";
    pub const AWAKENINGS: &str = "awakenings";
    pub const BODY_TEMPERATURE: &str = "body_temperature";
    pub const RESPIRATORY_RATE: &str = "respiratory_rate";
    pub const BLOOD_GLUCOSE: &str = "blood_glucose";
    pub const MINDFULNESS: &str = "mindfulness";
    pub const WALKING_SPEED: &str = "walking_speed";
    pub const STEP_LENGTH: &str = "step_length";
    pub const DOUBLE_SUPPORT: &str = "double_support";
    pub const WALKING_ASYMMETRY: &str = "walking_asymmetry";
    pub const VITAL_CAPACITY: &str = "vital_capacity";
    pub const PEAK_EXPIRATORY_FLOW: &str = "peak_expiratory_flow";

    // Readings that feed the header or subject context, not report entries
    pub const BODY_MASS: &str = "body_mass";
    pub const HEIGHT: &str = "height";
    pub const BLOOD_PRESSURE_SYSTOLIC: &str = "blood_pressure_systolic";
    pub const BLOOD_PRESSURE_DIASTOLIC: &str = "blood_pressure_diastolic";
}

/// Where the value behind a metric comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    /// Latest platform reading stored under the metric id
    Reading,
    /// Computed from event samples
    Derived(DerivedKind),
    /// No platform source; always reported as not measured
    NotTracked,
}

/// How renderers should print the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Fixed(u32),
    Integer,
    Clock,
}

impl ValueFormat {
    pub fn render(&self, value: Decimal) -> String {
        match self {
            ValueFormat::Fixed(precision) => format!("{:.*}", *precision as usize, value),
            ValueFormat::Integer => value.round().to_string(),
            ValueFormat::Clock => format_clock(value),
        }
    }
}

/// Formats a fractional hour of day (e.g. `22.5`) as `HH:MM`
pub fn format_clock(hours: Decimal) -> String {
    let total_minutes = hours
        .checked_mul(dec!(60))
        .and_then(|minutes| i64::try_from(minutes.floor()).ok())
        .unwrap_or(0)
        .rem_euclid(24 * 60);
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Immutable description of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub definition: &'static str,
    pub reference: &'static str,
    pub unit: &'static str,
    pub source: MetricSource,

    /// Multiplier from platform units to display units
    pub scale: Decimal,

    pub format: ValueFormat,
}

impl MetricDefinition {
    pub const fn reading(
        id: &'static str,
        title: &'static str,
        definition: &'static str,
        reference: &'static str,
        unit: &'static str,
    ) -> Self {
        MetricDefinition {
            id,
            title,
            definition,
            reference,
            unit,
            source: MetricSource::Reading,
            scale: Decimal::ONE,
            format: ValueFormat::Fixed(1),
        }
    }

    pub fn with_source(mut self, source: MetricSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_scale(mut self, scale: Decimal) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }
}

/// Ordered metric ids belonging to one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionLayout {
    pub kind: SectionKind,
    pub metric_ids: Vec<&'static str>,
}

impl SectionLayout {
    pub fn new(kind: SectionKind, metric_ids: &[&'static str]) -> Self {
        SectionLayout {
            kind,
            metric_ids: metric_ids.to_vec(),
        }
    }
}

/// Validated registry of metric definitions
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    definitions: Vec<MetricDefinition>,
    index: HashMap<&'static str, usize>,
    sections: Vec<SectionLayout>,
}

impl MetricCatalog {
    /// Build a catalog, rejecting duplicate ids and dangling section references
    pub fn new(
        definitions: Vec<MetricDefinition>,
        sections: Vec<SectionLayout>,
    ) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (position, definition) in definitions.iter().enumerate() {
            if index.insert(definition.id, position).is_some() {
                return Err(CatalogError::DuplicateId {
                    id: definition.id.to_string(),
                });
            }
        }

        for layout in &sections {
            if layout.metric_ids.is_empty() {
                return Err(CatalogError::EmptySection {
                    section: format!("{:?}", layout.kind),
                });
            }
            for id in &layout.metric_ids {
                if !index.contains_key(id) {
                    return Err(CatalogError::UnknownMetric {
                        section: format!("{:?}", layout.kind),
                        id: id.to_string(),
                    });
                }
            }
        }

        Ok(MetricCatalog {
            definitions,
            index,
            sections,
        })
    }

    /// The catalog used by the report
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(standard_definitions(), standard_sections())
    }

    pub fn get(&self, id: &str) -> Option<&MetricDefinition> {
        self.index.get(id).map(|&position| &self.definitions[position])
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    pub fn section(&self, kind: SectionKind) -> Option<&SectionLayout> {
        self.sections.iter().find(|layout| layout.kind == kind)
    }

    pub fn sections(&self) -> &[SectionLayout] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn standard_definitions() -> Vec<MetricDefinition> {
    use ids::*;

    vec![
        // Cardio
        MetricDefinition::reading(
            HEART_RATE,
            "Fréquence cardiaque",
            "Nombre de battements cardiaques par minute",
            "60-100 bpm (adulte au repos)",
            "bpm",
        ),
        MetricDefinition::reading(
            RESTING_HEART_RATE,
            "FC au repos",
            "Fréquence cardiaque la plus basse pendant l'éveil",
            "50-80 bpm (selon condition physique)",
            "bpm",
        ),
        MetricDefinition::reading(
            OXYGEN_SATURATION,
            "Saturation O2",
            "Niveau d'oxygénation du sang",
            "95-100% (niveau normal)",
            "%",
        )
        .with_scale(dec!(100)),
        MetricDefinition::reading(
            BLOOD_PRESSURE,
            "Pression artérielle",
            "Pression systolique/diastolique",
            "<120/<80 mmHg (idéal)",
            "mmHg",
        )
        .with_source(MetricSource::NotTracked),
        // Activity
        MetricDefinition::reading(
            STEPS,
            "Pas quotidiens",
            "Nombre total de pas effectués",
            "8,000-10,000 (recommandation générale)",
            "pas",
        )
        .with_source(MetricSource::Derived(DerivedKind::LatestSteps))
        .with_format(ValueFormat::Integer),
        MetricDefinition::reading(
            WALKING_DISTANCE,
            "Distance marchée",
            "Distance totale parcourue à pied",
            "5-8 km (objectif journalier)",
            "km",
        )
        .with_scale(dec!(0.001)),
        MetricDefinition::reading(
            ACTIVE_ENERGY,
            "Calories dépensées",
            "Énergie dépensée en activité",
            "Varie selon le métabolisme",
            "kcal",
        ),
        MetricDefinition::reading(
            EXERCISE_TIME,
            "Temps d'exercice",
            "Minutes d'activité physique modérée à intense",
            "30-60 min/jour (recommandation OMS)",
            "min",
        ),
        MetricDefinition::reading(
            STAND_TIME,
            "Temps debout",
            "Minutes passées en position debout",
            "2-4 heures/jour (pour santé métabolique)",
            "min",
        ),
        // Body composition
        MetricDefinition::reading(
            BMI,
            "IMC",
            "Indice de Masse Corporelle (poids/taille²)",
            "18.5-24.9 (poids normal)",
            "kg/m²",
        ),
        MetricDefinition::reading(
            BODY_FAT,
            "Masse grasse",
            "Pourcentage de graisse corporelle",
            "Homme: 10-20%, Femme: 18-28%",
            "%",
        )
        .with_scale(dec!(100)),
        MetricDefinition::reading(
            WAIST_CIRCUMFERENCE,
            "Tour de taille",
            "Circonférence abdominale",
            "Homme <102cm, Femme <88cm",
            "cm",
        )
        .with_source(MetricSource::NotTracked),
        MetricDefinition::reading(
            MUSCLE_MASS,
            "Masse musculaire",
            "Pourcentage de masse musculaire",
            "Varie selon l'âge et le sexe",
            "%",
        )
        .with_source(MetricSource::NotTracked),
        // Nutrition
        MetricDefinition::reading(
            WATER,
            "Eau consommée",
            "Volume total de liquides ingérés",
            "2-3 L/jour (selon activité)",
            "L",
        ),
        MetricDefinition::reading(
            CARBOHYDRATES,
            "Glucides",
            "Apports totaux en glucides",
            "45-65% des calories totales",
            "g",
        ),
        MetricDefinition::reading(
            PROTEIN,
            "Protéines",
            "Apports totaux en protéines",
            "1.2-2.0 g/kg de poids",
            "g",
        ),
        MetricDefinition::reading(
            FAT,
            "Lipides",
            "Apports totaux en graisses",
            "20-35% des calories totales",
            "g",
        ),
        MetricDefinition::reading(
            SUGAR,
            "Sucres ajoutés",
            "Sucres libres/ajoutés consommés",
            "<25 g/jour (OMS)",
            "g",
        ),
        MetricDefinition::reading(
            CAFFEINE,
            "Caféine",
            "Consommation totale de caféine",
            "<400 mg/jour (adulte)",
            "mg",
        ),
        // Sleep
        MetricDefinition::reading(
            SLEEP_DURATION,
            "Durée de sommeil",
            "Temps total passé à dormir",
            "7-9 heures (adulte)",
            "h",
        )
        .with_source(MetricSource::Derived(DerivedKind::SleepDuration)),
        MetricDefinition::reading(
            SLEEP_EFFICIENCY,
            "Efficacité du sommeil",
            "% de temps passé endormi par rapport au temps au lit",
            ">85% (bonne efficacité)",
            "%",
        )
        .with_source(MetricSource::Derived(DerivedKind::SleepEfficiency)),
        MetricDefinition::reading(
            BEDTIME,
            "Heure de coucher",
            "Moment où vous vous endormez",
            "Avant 23h (recommandé)",
            "",
        )
        .with_source(MetricSource::Derived(DerivedKind::Bedtime))
        .with_format(ValueFormat::Clock),
        MetricDefinition::reading(
            AWAKENINGS,
            "Réveils nocturnes",
            "Nombre d'éveils pendant la nuit",
            "1-2 (normal)",
            "",
        )
        .with_source(MetricSource::Derived(DerivedKind::Awakenings))
        .with_format(ValueFormat::Integer),
        // Vitality
        MetricDefinition::reading(
            BODY_TEMPERATURE,
            "Température corporelle",
            "Température centrale du corps",
            "36-37.5°C (normale)",
            "°C",
        ),
        MetricDefinition::reading(
            RESPIRATORY_RATE,
            "Fréquence respiratoire",
            "Nombre de respirations par minute",
            "12-20/min (adulte au repos)",
            "/min",
        ),
        MetricDefinition::reading(
            BLOOD_GLUCOSE,
            "Glycémie",
            "Concentration de glucose dans le sang",
            "70-140 mg/dL (à jeun <100)",
            "mg/dL",
        ),
        MetricDefinition::reading(
            MINDFULNESS,
            "Pleine conscience",
            "Minutes de pratique méditative",
            "5-20 min/jour (bénéfices démontrés)",
            "min/jour",
        )
        .with_source(MetricSource::Derived(DerivedKind::MindfulMinutes)),
        // Gait
        MetricDefinition::reading(
            WALKING_SPEED,
            "Vitesse de marche",
            "Vitesse moyenne lors de la marche",
            "1.2-1.4 m/s (adulte en bonne santé)",
            "m/s",
        )
        .with_format(ValueFormat::Fixed(2)),
        MetricDefinition::reading(
            STEP_LENGTH,
            "Longueur de pas",
            "Distance moyenne entre deux pas",
            "0.7-0.8 m (adulte moyen)",
            "m",
        )
        .with_format(ValueFormat::Fixed(2)),
        MetricDefinition::reading(
            DOUBLE_SUPPORT,
            "Double support",
            "% du cycle de marche avec les deux pieds au sol",
            "20-40% (selon l'âge)",
            "%",
        )
        .with_scale(dec!(100)),
        MetricDefinition::reading(
            WALKING_ASYMMETRY,
            "Asymétrie de marche",
            "Différence entre les côtés gauche et droit",
            "<10% (idéal)",
            "%",
        )
        .with_scale(dec!(100)),
        // Respiratory
        MetricDefinition::reading(
            VITAL_CAPACITY,
            "Capacité vitale",
            "Volume d'air maximal expiré après inspiration",
            "3-5 L (varie selon taille/âge/sexe)",
            "L",
        )
        .with_source(MetricSource::NotTracked),
        MetricDefinition::reading(
            PEAK_EXPIRATORY_FLOW,
            "Débit expiratoire",
            "Débit d'air maximal lors d'une expiration forcée",
            ">300 L/min (adulte sain)",
            "L/min",
        )
        .with_source(MetricSource::NotTracked),
    ]
}

fn standard_sections() -> Vec<SectionLayout> {
    use ids::*;

    vec![
        SectionLayout::new(
            SectionKind::Cardio,
            &[HEART_RATE, RESTING_HEART_RATE, OXYGEN_SATURATION, BLOOD_PRESSURE],
        ),
        SectionLayout::new(
            SectionKind::Activity,
            &[STEPS, WALKING_DISTANCE, ACTIVE_ENERGY, EXERCISE_TIME, STAND_TIME],
        ),
        SectionLayout::new(
            SectionKind::Body,
            &[BMI, BODY_FAT, WAIST_CIRCUMFERENCE, MUSCLE_MASS],
        ),
        SectionLayout::new(
            SectionKind::Nutrition,
            &[WATER, CARBOHYDRATES, PROTEIN, FAT, SUGAR, CAFFEINE],
        ),
        SectionLayout::new(
            SectionKind::Sleep,
            &[SLEEP_DURATION, SLEEP_EFFICIENCY, BEDTIME, AWAKENINGS],
        ),
        SectionLayout::new(
            SectionKind::Vitality,
            &[BODY_TEMPERATURE, RESPIRATORY_RATE, BLOOD_GLUCOSE, MINDFULNESS],
        ),
        SectionLayout::new(
            SectionKind::Gait,
            &[WALKING_SPEED, STEP_LENGTH, DOUBLE_SUPPORT, WALKING_ASYMMETRY],
        ),
        SectionLayout::new(
            SectionKind::Respiratory,
            &[RESPIRATORY_RATE, VITAL_CAPACITY, PEAK_EXPIRATORY_FLOW],
        ),
    ]
}
