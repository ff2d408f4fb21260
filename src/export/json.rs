use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::ExportError;
use crate::catalog::ids;
use crate::derived::DerivedMetrics;
use crate::snapshot::HealthSnapshot;

/// Write any serializable value as pretty JSON
pub fn write_json<T, W>(data: &T, writer: W) -> Result<(), ExportError>
where
    T: Serialize,
    W: Write,
{
    serde_json::to_writer_pretty(writer, data)
        .map_err(|e| ExportError::SerializationError(e.to_string()))
}

/// Minimal machine-readable export, independent of the paginated report
///
/// Absent values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleHealthReport {
    pub heart_rate: Option<f64>,
    pub steps: Option<f64>,
    pub sleep: Option<f64>,
    pub blood_pressure: BloodPressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
}

impl SimpleHealthReport {
    pub fn from_snapshot(snapshot: &HealthSnapshot, derived: &DerivedMetrics) -> Self {
        let number = |value: Option<Decimal>| value.and_then(|v| v.to_f64());

        SimpleHealthReport {
            heart_rate: number(snapshot.reading(ids::HEART_RATE)),
            steps: number(derived.latest_steps.or_else(|| snapshot.reading(ids::STEPS))),
            sleep: number(derived.has_sleep_data.then_some(derived.sleep_duration_hours)),
            blood_pressure: BloodPressure {
                systolic: number(snapshot.reading(ids::BLOOD_PRESSURE_SYSTOLIC)),
                diastolic: number(snapshot.reading(ids::BLOOD_PRESSURE_DIASTOLIC)),
            },
        }
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        write_json(self, writer)
    }
}
