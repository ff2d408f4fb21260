//! Immutable point-in-time bundle handed over by the acquisition layer

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::catalog::ids;
use crate::error::SnapshotError;
use crate::models::{DailyQuantity, RawReadings, Sample, Sex, SubjectContext};

/// Subject characteristics as reported by the platform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectProfile {
    pub sex: Sex,
    pub age: Option<u32>,
    pub height_m: Option<Decimal>,
    pub body_mass_kg: Option<Decimal>,
}

/// Everything one report is built from
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSnapshot {
    /// Reference instant for lookback windows; without it every sample counts
    pub captured_at: Option<DateTime<FixedOffset>>,

    pub subject: SubjectProfile,

    /// Latest value per metric id, in platform units
    pub readings: RawReadings,

    pub sleep_samples: Vec<Sample>,
    pub mindful_samples: Vec<Sample>,
    pub daily_steps: Vec<DailyQuantity>,
    pub heart_rate_history: Vec<DailyQuantity>,
}

impl HealthSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: HealthSnapshot = serde_json::from_str(json).map_err(|e| SnapshotError::Parse {
            reason: e.to_string(),
        })?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path).map_err(|e| SnapshotError::Parse {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values no platform can produce
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if let Some((id, value)) = self.readings.iter().find(|(_, v)| **v < Decimal::ZERO) {
            return Err(SnapshotError::Invalid {
                field: format!("readings.{}", id),
                reason: format!("negative value {}", value),
            });
        }

        let subject = &self.subject;
        let profile = [
            ("subject.height_m", subject.height_m),
            ("subject.body_mass_kg", subject.body_mass_kg),
        ];
        for (field, value) in profile {
            if let Some(value) = value.filter(|v| *v < Decimal::ZERO) {
                return Err(SnapshotError::Invalid {
                    field: field.to_string(),
                    reason: format!("negative value {}", value),
                });
            }
        }

        let mut series = self.daily_steps.iter().chain(&self.heart_rate_history);
        if let Some(point) = series.find(|q| q.value < Decimal::ZERO) {
            return Err(SnapshotError::Invalid {
                field: format!("daily series {}", point.date),
                reason: format!("negative value {}", point.value),
            });
        }

        Ok(())
    }

    /// Sex and body mass, falling back to the `body_mass` reading
    pub fn subject_context(&self) -> SubjectContext {
        let body_mass = self
            .subject
            .body_mass_kg
            .or_else(|| self.readings.get(ids::BODY_MASS).copied())
            .filter(|mass| *mass > Decimal::ZERO);
        SubjectContext::new(self.subject.sex, body_mass)
    }

    /// Sleep and mindful samples as one sequence
    pub fn samples(&self) -> Vec<Sample> {
        self.sleep_samples
            .iter()
            .chain(&self.mindful_samples)
            .cloned()
            .collect()
    }

    pub fn height_m(&self) -> Option<Decimal> {
        self.subject
            .height_m
            .or_else(|| self.readings.get(ids::HEIGHT).copied())
    }

    pub fn reading(&self, id: &str) -> Option<Decimal> {
        self.readings.get(id).copied()
    }
}
