use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::MetricDefinition;

/// Biological sex as reported by the health platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Sex {
    /// French label used in the report header
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Homme",
            Sex::Female => "Femme",
            Sex::Other => "Autre",
            Sex::Unknown => "Non spécifié",
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" | "homme" => Ok(Sex::Male),
            "female" | "f" | "femme" => Ok(Sex::Female),
            "other" | "autre" => Ok(Sex::Other),
            "unknown" | "" => Ok(Sex::Unknown),
            _ => Err(format!("Invalid sex: {}", s)),
        }
    }
}

/// Subject attributes some evaluations branch on
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubjectContext {
    pub sex: Sex,

    /// Body mass in kilograms, `None` when the platform has no measurement
    pub body_mass_kg: Option<Decimal>,
}

impl SubjectContext {
    pub fn new(sex: Sex, body_mass_kg: Option<Decimal>) -> Self {
        SubjectContext { sex, body_mass_kg }
    }
}

/// Category tag of a timestamped event sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    InBed,
    Asleep,
    Awake,
    Mindful,
}

impl SampleKind {
    /// Whether the sample counts as time in bed for sleep efficiency
    pub fn is_sleep_related(&self) -> bool {
        matches!(self, SampleKind::InBed | SampleKind::Asleep | SampleKind::Awake)
    }
}

/// A timestamped category event (sleep stage, mindful session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub kind: SampleKind,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Sample {
    pub fn new(kind: SampleKind, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Sample { kind, start, end }
    }

    /// Sample duration in whole seconds, `None` for inverted intervals
    pub fn duration_seconds(&self) -> Option<i64> {
        let seconds = (self.end - self.start).num_seconds();
        if seconds < 0 {
            None
        } else {
            Some(seconds)
        }
    }
}

/// One point of a daily aggregated time series (steps, heart rate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuantity {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Latest raw platform value per metric id
pub type RawReadings = BTreeMap<String, Decimal>;

/// Classification outcome of a single metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Good,
    Warn,
    Bad,
    Unmeasured,
}

impl Band {
    /// Marker printed in front of the evaluation message
    pub fn symbol(&self) -> &'static str {
        match self {
            Band::Good => "✅",
            Band::Warn => "⚠️",
            Band::Bad => "❌",
            Band::Unmeasured => "❔",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Band::Good => write!(f, "good"),
            Band::Warn => write!(f, "warn"),
            Band::Bad => write!(f, "bad"),
            Band::Unmeasured => write!(f, "unmeasured"),
        }
    }
}

/// Band plus the human-readable message shown next to the value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub band: Band,
    pub message: String,
}

impl Evaluation {
    pub fn new(band: Band, message: impl Into<String>) -> Self {
        Evaluation {
            band,
            message: message.into(),
        }
    }

    pub fn unmeasured(message: impl Into<String>) -> Self {
        Self::new(Band::Unmeasured, message)
    }
}

/// One evaluated metric, ready for layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEntry {
    pub definition: MetricDefinition,

    /// Value in display units (already scaled)
    pub value: Decimal,

    pub evaluation: Evaluation,
}

/// A themed group of entries in catalog order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub entries: Vec<MetricEntry>,
}

/// Report sections in their presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Cardio,
    Activity,
    Body,
    Nutrition,
    Sleep,
    Vitality,
    Gait,
    Respiratory,
}

impl SectionKind {
    /// Sections every report contains
    pub const DEFAULT_ORDER: [SectionKind; 6] = [
        SectionKind::Cardio,
        SectionKind::Activity,
        SectionKind::Body,
        SectionKind::Nutrition,
        SectionKind::Sleep,
        SectionKind::Vitality,
    ];

    /// Default sections followed by gait and respiratory analysis
    pub const EXTENDED_ORDER: [SectionKind; 8] = [
        SectionKind::Cardio,
        SectionKind::Activity,
        SectionKind::Body,
        SectionKind::Nutrition,
        SectionKind::Sleep,
        SectionKind::Vitality,
        SectionKind::Gait,
        SectionKind::Respiratory,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Cardio => "❤️ Santé Cardiovasculaire",
            SectionKind::Activity => "🏃 Activité Physique",
            SectionKind::Body => "🏋️ Composition Corporelle",
            SectionKind::Nutrition => "🍎 Nutrition",
            SectionKind::Sleep => "😴 Sommeil",
            SectionKind::Vitality => "🌡️ Signes Vitaux",
            SectionKind::Gait => "🚶 Analyse de la Marche",
            SectionKind::Respiratory => "🌬️ Fonction Respiratoire",
        }
    }
}
