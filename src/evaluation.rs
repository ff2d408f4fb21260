use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ids;
use crate::derived::protein_target;
use crate::models::{Band, Evaluation, Sex, SubjectContext};
use crate::rules::{practice_rule, range_rule, tier_rule, upper_limit_rule, Tier, ValueDetail};

/// How sex-branched metrics treat a subject whose sex is not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownSexPolicy {
    /// Use the male table (historical behavior)
    #[default]
    Male,
    Female,
    /// Report the metric as not measured
    Unmeasured,
}

/// Classification rule attached to a metric id
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Range { low: Decimal, high: Decimal },
    UpperLimit { limit: Decimal },
    Tiers { tiers: &'static [Tier], detail: ValueDetail },
    /// Tiers where only an exact zero lands in the first tier
    Practice { tiers: &'static [Tier], detail: ValueDetail },
    SexTiers { male: &'static [Tier], female: &'static [Tier] },
    /// Tiers over a clock hour where early-morning hours follow midnight
    Bedtime { tiers: &'static [Tier] },
    Protein,
    Advisory(&'static str),
    NotTracked(&'static str),
}

const ONE_DECIMAL: ValueDetail = ValueDetail::Fixed { precision: 1, suffix: "" };

static STEPS_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Bad, "Sédentaire", "Essayez d'augmenter votre activité"),
    Tier::new(dec!(4000), Band::Warn, "Modéré", "Ciblez 8,000 pas pour une santé optimale"),
    Tier::new(dec!(8000), Band::Good, "Actif", "Excellent niveau d'activité"),
    Tier::new(dec!(12000), Band::Good, "Très actif", "Continuez ainsi!"),
];

static DISTANCE_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Warn, "Faible", "Essayez de marcher davantage"),
    Tier::new(dec!(3), Band::Good, "Modéré", "Bon niveau d'activité"),
    Tier::new(dec!(5), Band::Good, "Élevé", "Excellent pour la santé cardiovasculaire"),
    Tier::new(dec!(8), Band::Good, "Très élevé", "Activité physique intensive"),
];

static CALORIES_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Warn, "Très faible", "Augmentez votre activité"),
    Tier::new(dec!(200), Band::Warn, "Faible", "Essayez d'être plus actif"),
    Tier::new(dec!(400), Band::Good, "Modéré", "Bon niveau d'activité"),
    Tier::new(dec!(600), Band::Good, "Élevé", "Dépense énergétique importante"),
];

static BMI_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Warn, "Insuffisance pondérale", "Consultez un nutritionniste"),
    Tier::new(dec!(18.5), Band::Good, "Poids normal", "Maintenez vos habitudes saines"),
    Tier::new(dec!(25), Band::Warn, "Surpoids", "Essayez de modifier votre alimentation et activité"),
    Tier::new(dec!(30), Band::Bad, "Obésité", "Consultez un professionnel de santé"),
];

static BODY_FAT_MALE_TIERS: [Tier; 5] = [
    Tier::new(dec!(0), Band::Bad, "Dangereusement bas", "Risque pour la santé"),
    Tier::new(dec!(5), Band::Good, "Athlétique", "Très faible masse grasse"),
    Tier::new(dec!(13), Band::Good, "En forme", "Niveau sain"),
    Tier::new(dec!(18), Band::Warn, "Acceptable", "Peut être amélioré"),
    Tier::new(dec!(25), Band::Bad, "Trop élevé", "Risque accru de problèmes de santé"),
];

static BODY_FAT_FEMALE_TIERS: [Tier; 5] = [
    Tier::new(dec!(0), Band::Bad, "Dangereusement bas", "Risque pour la santé"),
    Tier::new(dec!(12), Band::Good, "Athlétique", "Très faible masse grasse"),
    Tier::new(dec!(20), Band::Good, "En forme", "Niveau sain"),
    Tier::new(dec!(25), Band::Warn, "Acceptable", "Peut être amélioré"),
    Tier::new(dec!(32), Band::Bad, "Trop élevé", "Risque accru de problèmes de santé"),
];

static WATER_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Bad, "Dangereusement bas", "Risque de déshydratation"),
    Tier::new(dec!(1), Band::Warn, "Insuffisant", "Buvez plus d'eau"),
    Tier::new(dec!(1.5), Band::Good, "Adéquat", "Bon niveau d'hydratation"),
    Tier::new(dec!(2.5), Band::Good, "Excellent", "Hydratation optimale"),
];

static GLUCOSE_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Bad, "Hypoglycémie", "Risque de malaise"),
    Tier::new(dec!(70), Band::Good, "Normal", "Niveau optimal"),
    Tier::new(dec!(100), Band::Warn, "Élevé", "Prédiabète possible"),
    Tier::new(dec!(126), Band::Bad, "Très élevé", "Risque de diabète"),
];

static MINDFULNESS_TIERS: [Tier; 5] = [
    Tier::new(dec!(0), Band::Bad, "Aucune pratique", "La méditation réduit le stress"),
    Tier::new(dec!(1), Band::Warn, "Occasionnelle", "Essayez 5-10 min/jour"),
    Tier::new(dec!(5), Band::Good, "Régulière", "Bonne habitude"),
    Tier::new(dec!(10), Band::Good, "Excellente", "Effets bénéfiques démontrés"),
    Tier::new(dec!(20), Band::Good, "Exceptionnelle", "Très bénéfique pour la santé mentale"),
];

static SLEEP_DURATION_TIERS: [Tier; 6] = [
    Tier::with_value(dec!(0), Band::Bad, "Dangereusement insuffisant", "Risque accru de problèmes de santé"),
    Tier::with_value(dec!(5), Band::Warn, "Insuffisant", "Fatigue probable"),
    Tier::with_value(dec!(6), Band::Warn, "Légèrement insuffisant", "Ciblez 7-9h"),
    Tier::with_value(dec!(7), Band::Good, "Optimal", "Durée recommandée"),
    Tier::with_value(dec!(9), Band::Good, "Long", "Peut convenir selon les besoins"),
    Tier::with_value(dec!(10), Band::Warn, "Très long", "Peut indiquer un problème sous-jacent"),
];

static SLEEP_EFFICIENCY_TIERS: [Tier; 4] = [
    Tier::with_value(dec!(0), Band::Bad, "Faible", "Beaucoup de temps éveillé au lit"),
    Tier::with_value(dec!(75), Band::Warn, "Moyenne", "Peut être améliorée"),
    Tier::with_value(dec!(85), Band::Good, "Bonne", "Efficacité satisfaisante"),
    Tier::with_value(dec!(90), Band::Good, "Excellente", "Sommeil très efficace"),
];

static BEDTIME_TIERS: [Tier; 5] = [
    Tier::with_value(dec!(0), Band::Good, "Très tôt", "Horaire excellent"),
    Tier::with_value(dec!(22), Band::Good, "Idéal", "Correspond aux rythmes circadiens"),
    Tier::with_value(dec!(23), Band::Warn, "Un peu tard", "Essayez de vous coucher plus tôt"),
    Tier::with_value(dec!(24), Band::Warn, "Tard", "Peut perturber le cycle de sommeil"),
    Tier::with_value(dec!(25), Band::Bad, "Très tard", "Risque de privation de sommeil"),
];

static AWAKENINGS_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Good, "Aucun", "Sommeil continu excellent"),
    Tier::with_value(dec!(1), Band::Good, "Normal", "Éveils brefs typiques"),
    Tier::with_value(dec!(3), Band::Warn, "Fréquents", "Peut affecter la qualité du sommeil"),
    Tier::with_value(dec!(5), Band::Bad, "Très fréquents", "Consultez un spécialiste du sommeil"),
];

static WALKING_SPEED_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Bad, "Très lente", "Difficulté à se déplacer"),
    Tier::new(dec!(0.6), Band::Warn, "Lente", "Peut indiquer des problèmes de mobilité"),
    Tier::new(dec!(1.0), Band::Good, "Normale", "Vitesse de marche saine"),
    Tier::new(dec!(1.4), Band::Good, "Rapide", "Bonne condition physique"),
];

static STEP_LENGTH_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Bad, "Très courte", "Possible problème articulaire"),
    Tier::new(dec!(0.5), Band::Warn, "Courte", "Peut être améliorée"),
    Tier::new(dec!(0.7), Band::Good, "Normale", "Longueur de pas optimale"),
    Tier::new(dec!(0.9), Band::Good, "Longue", "Bonne amplitude de mouvement"),
];

static DOUBLE_SUPPORT_TIERS: [Tier; 5] = [
    Tier::new(dec!(0), Band::Bad, "Très faible", "Risque de chute"),
    Tier::new(dec!(15), Band::Good, "Faible", "Jeune adulte en bonne santé"),
    Tier::new(dec!(25), Band::Good, "Normale", "Adulte moyen"),
    Tier::new(dec!(35), Band::Warn, "Élevée", "Peut indiquer un problème d'équilibre"),
    Tier::new(dec!(45), Band::Bad, "Très élevée", "Difficulté à marcher"),
];

static ASYMMETRY_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Good, "Excellente", "Symétrie presque parfaite"),
    Tier::new(dec!(5), Band::Good, "Bonne", "Léger déséquilibre acceptable"),
    Tier::new(dec!(10), Band::Warn, "Modérée", "Possible compensation"),
    Tier::new(dec!(15), Band::Bad, "Sévère", "Consultez un spécialiste"),
];

static RESPIRATORY_TIERS: [Tier; 4] = [
    Tier::new(dec!(0), Band::Warn, "Basse (bradypnée)", "Possible problème neurologique"),
    Tier::new(dec!(12), Band::Good, "Normale", "Fréquence saine"),
    Tier::new(dec!(20), Band::Warn, "Élevée (tachypnée)", "Possible stress ou problème pulmonaire"),
    Tier::new(dec!(25), Band::Bad, "Très élevée", "Consultez un médecin"),
];

const NOT_MEASURED: &str = "Non mesuré";
const NUTRITION_ADVISORY: &str = "Analyse nutritionnelle recommandée";
const NO_RULE: &str = "Aucune règle d'évaluation";
const SEX_UNKNOWN: &str = "Non évalué - Sexe biologique non renseigné";

/// Look up the classification rule for a metric id
pub fn rule_for(metric_id: &str) -> Option<Rule> {
    let rule = match metric_id {
        ids::HEART_RATE => Rule::Range { low: dec!(60), high: dec!(100) },
        ids::RESTING_HEART_RATE => Rule::Range { low: dec!(50), high: dec!(80) },
        ids::OXYGEN_SATURATION => Rule::Range { low: dec!(95), high: dec!(100) },
        ids::EXERCISE_TIME => Rule::Range { low: dec!(30), high: dec!(60) },
        ids::STAND_TIME => Rule::Range { low: dec!(120), high: dec!(240) },
        ids::BODY_TEMPERATURE => Rule::Range { low: dec!(36), high: dec!(37.5) },

        ids::SUGAR => Rule::UpperLimit { limit: dec!(25) },
        ids::CAFFEINE => Rule::UpperLimit { limit: dec!(400) },

        ids::STEPS => Rule::Tiers { tiers: &STEPS_TIERS, detail: ValueDetail::Integer },
        ids::WALKING_DISTANCE => Rule::Tiers { tiers: &DISTANCE_TIERS, detail: ONE_DECIMAL },
        ids::ACTIVE_ENERGY => Rule::Tiers { tiers: &CALORIES_TIERS, detail: ONE_DECIMAL },
        ids::BMI => Rule::Tiers { tiers: &BMI_TIERS, detail: ONE_DECIMAL },
        ids::WATER => Rule::Tiers { tiers: &WATER_TIERS, detail: ONE_DECIMAL },
        ids::BLOOD_GLUCOSE => Rule::Tiers { tiers: &GLUCOSE_TIERS, detail: ONE_DECIMAL },
        ids::MINDFULNESS => Rule::Practice { tiers: &MINDFULNESS_TIERS, detail: ONE_DECIMAL },
        ids::SLEEP_DURATION => Rule::Tiers {
            tiers: &SLEEP_DURATION_TIERS,
            detail: ValueDetail::Fixed { precision: 1, suffix: "h" },
        },
        ids::SLEEP_EFFICIENCY => Rule::Tiers {
            tiers: &SLEEP_EFFICIENCY_TIERS,
            detail: ValueDetail::Fixed { precision: 1, suffix: "%" },
        },
        ids::AWAKENINGS => Rule::Tiers { tiers: &AWAKENINGS_TIERS, detail: ValueDetail::Integer },
        ids::WALKING_SPEED => Rule::Tiers { tiers: &WALKING_SPEED_TIERS, detail: ONE_DECIMAL },
        ids::STEP_LENGTH => Rule::Tiers { tiers: &STEP_LENGTH_TIERS, detail: ONE_DECIMAL },
        ids::DOUBLE_SUPPORT => Rule::Tiers { tiers: &DOUBLE_SUPPORT_TIERS, detail: ONE_DECIMAL },
        ids::WALKING_ASYMMETRY => Rule::Tiers { tiers: &ASYMMETRY_TIERS, detail: ONE_DECIMAL },
        ids::RESPIRATORY_RATE => Rule::Tiers { tiers: &RESPIRATORY_TIERS, detail: ONE_DECIMAL },

        ids::BODY_FAT => Rule::SexTiers {
            male: &BODY_FAT_MALE_TIERS,
            female: &BODY_FAT_FEMALE_TIERS,
        },
        ids::BEDTIME => Rule::Bedtime { tiers: &BEDTIME_TIERS },
        ids::PROTEIN => Rule::Protein,

        ids::CARBOHYDRATES | ids::FAT => Rule::Advisory(NUTRITION_ADVISORY),
        ids::BLOOD_PRESSURE
        | ids::WAIST_CIRCUMFERENCE
        | ids::MUSCLE_MASS
        | ids::VITAL_CAPACITY
        | ids::PEAK_EXPIRATORY_FLOW => Rule::NotTracked(NOT_MEASURED),

        _ => return None,
    };
    Some(rule)
}

/// Pure, deterministic metric classifier
///
/// Holds only immutable policy, so one engine can be shared across threads
/// and by both the interactive display and the report assembler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationEngine {
    unknown_sex_policy: UnknownSexPolicy,
    protein_factor: Decimal,
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        EvaluationEngine {
            unknown_sex_policy: UnknownSexPolicy::default(),
            protein_factor: crate::derived::DEFAULT_PROTEIN_FACTOR,
        }
    }
}

impl EvaluationEngine {
    pub fn new(unknown_sex_policy: UnknownSexPolicy, protein_factor: Decimal) -> Self {
        EvaluationEngine {
            unknown_sex_policy,
            protein_factor,
        }
    }

    pub fn unknown_sex_policy(&self) -> UnknownSexPolicy {
        self.unknown_sex_policy
    }

    pub fn has_rule(&self, metric_id: &str) -> bool {
        rule_for(metric_id).is_some()
    }

    /// Classify one metric value in display units
    pub fn evaluate(&self, metric_id: &str, value: Decimal, context: &SubjectContext) -> Evaluation {
        let evaluation = match rule_for(metric_id) {
            Some(rule) => self.apply(rule, value, context),
            None => Evaluation::unmeasured(NO_RULE),
        };

        debug!(
            metric = metric_id,
            value = %value,
            band = %evaluation.band,
            "Evaluated metric"
        );

        evaluation
    }

    fn apply(&self, rule: Rule, value: Decimal, context: &SubjectContext) -> Evaluation {
        match rule {
            Rule::Range { low, high } => range_rule(value, low, high),
            Rule::UpperLimit { limit } => upper_limit_rule(value, limit),
            Rule::Tiers { tiers, detail } => tier_rule(value, tiers, detail),
            Rule::Practice { tiers, detail } => practice_rule(value, tiers, detail),
            Rule::SexTiers { male, female } => match self.sex_table(context.sex, male, female) {
                Some(tiers) => tier_rule(value, tiers, ONE_DECIMAL),
                None => Evaluation::unmeasured(SEX_UNKNOWN),
            },
            Rule::Bedtime { tiers } => tier_rule(normalize_bedtime(value), tiers, ValueDetail::Clock),
            Rule::Protein => self.evaluate_protein(value, context),
            Rule::Advisory(message) | Rule::NotTracked(message) => Evaluation::unmeasured(message),
        }
    }

    fn sex_table(
        &self,
        sex: Sex,
        male: &'static [Tier],
        female: &'static [Tier],
    ) -> Option<&'static [Tier]> {
        match sex {
            Sex::Male => Some(male),
            Sex::Female | Sex::Other => Some(female),
            Sex::Unknown => match self.unknown_sex_policy {
                UnknownSexPolicy::Male => Some(male),
                UnknownSexPolicy::Female => Some(female),
                UnknownSexPolicy::Unmeasured => None,
            },
        }
    }

    fn evaluate_protein(&self, protein: Decimal, context: &SubjectContext) -> Evaluation {
        let Some(target) = protein_target(context.body_mass_kg, self.protein_factor) else {
            return Evaluation::unmeasured("Données manquantes");
        };

        // Thresholds past the representable range are never reached
        let scaled = |factor: Decimal| target.checked_mul(factor).unwrap_or(Decimal::MAX);

        if protein <= Decimal::ZERO {
            Evaluation::unmeasured("Non mesuré - Assurez un apport suffisant")
        } else if protein < scaled(dec!(0.7)) {
            Evaluation::new(
                Band::Bad,
                format!("Très insuffisant ({:.1}g) - Risque de perte musculaire", protein),
            )
        } else if protein < target {
            Evaluation::new(
                Band::Warn,
                format!("Légèrement insuffisant ({:.1}g) - Cible: {:.1}g", protein, target),
            )
        } else if protein < scaled(dec!(1.5)) {
            Evaluation::new(Band::Good, format!("Adéquat ({:.1}g) - Apport optimal", protein))
        } else {
            Evaluation::new(Band::Good, format!("Élevé ({:.1}g) - Convient aux sportifs", protein))
        }
    }
}

/// Shift early-morning hours past midnight so 00:30 sorts after 23:30
pub fn normalize_bedtime(hour_of_day: Decimal) -> Decimal {
    if hour_of_day < dec!(12) {
        hour_of_day + dec!(24)
    } else {
        hour_of_day
    }
}
